//! Wall-clock source for the companion.
//!
//! Every state machine in this crate takes `now` as an argument; only the
//! [`Companion`](crate::Companion) facade reads a [`Clock`]. Times carry the
//! local UTC offset so "today" and "14:00" mean the user's calendar day.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, FixedOffset, Local};

/// Local wall-clock time with its UTC offset.
pub type LocalTime = DateTime<FixedOffset>;

pub trait Clock: Send + Sync {
    fn now(&self) -> LocalTime;
}

/// Reads the operating system clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> LocalTime {
        Local::now().fixed_offset()
    }
}

/// A settable clock shared between a companion and whoever drives it.
///
/// Clones observe the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<LocalTime>>,
}

impl ManualClock {
    pub fn new(start: LocalTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::milliseconds(ms as i64));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> LocalTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Milliseconds since the Unix epoch, clamped at zero.
pub fn epoch_ms(at: &LocalTime) -> u64 {
    at.timestamp_millis().max(0) as u64
}
