//! Pause-aware dismiss timer.
//!
//! Operates on wall-clock deltas like the rest of the scheduler: there is no
//! thread, the owner asks for the deadline and checks expiry on tick.
//!
//! While running, remaining time is `remaining_ms - (now - run_started_at)`.
//! Pausing folds the elapsed run into `remaining_ms` and clears the start;
//! resuming sets a fresh start. Nothing is lost across a pause.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissTimer {
    total_ms: u64,
    remaining_ms: u64,
    run_started_at_ms: Option<u64>,
}

impl DismissTimer {
    /// A timer that starts running at `now_ms`.
    pub fn start(total_ms: u64, now_ms: u64) -> Self {
        Self {
            total_ms,
            remaining_ms: total_ms,
            run_started_at_ms: Some(now_ms),
        }
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn is_running(&self) -> bool {
        self.run_started_at_ms.is_some()
    }

    /// Remaining time as of `now_ms`. Frozen while paused.
    pub fn remaining_at(&self, now_ms: u64) -> u64 {
        match self.run_started_at_ms {
            Some(started) => self
                .remaining_ms
                .saturating_sub(now_ms.saturating_sub(started)),
            None => self.remaining_ms,
        }
    }

    /// Epoch ms at which the timer fires, `None` while paused.
    pub fn deadline_ms(&self) -> Option<u64> {
        self.run_started_at_ms
            .map(|started| started.saturating_add(self.remaining_ms))
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.is_running() && self.remaining_at(now_ms) == 0
    }

    /// Freeze. Returns false if already paused.
    pub fn pause(&mut self, now_ms: u64) -> bool {
        if !self.is_running() {
            return false;
        }
        self.remaining_ms = self.remaining_at(now_ms);
        self.run_started_at_ms = None;
        true
    }

    /// Unfreeze. Returns false if already running.
    pub fn resume(&mut self, now_ms: u64) -> bool {
        if self.is_running() {
            return false;
        }
        self.run_started_at_ms = Some(now_ms);
        true
    }
}
