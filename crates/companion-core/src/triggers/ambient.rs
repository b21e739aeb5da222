use super::TriggerContext;
use crate::candidate::{Candidate, Priority};
use crate::catalog::Mood;
use crate::clock::epoch_ms;

/// Periodic idle-mood ticker.
///
/// Every interval it offers one idle line if the gate allows it. A tick the
/// gate blocks is simply lost; the next one comes a full interval later.
#[derive(Debug, Clone)]
pub struct AmbientTicker {
    interval_ms: u64,
    next_due_ms: Option<u64>,
}

impl AmbientTicker {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            next_due_ms: None,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Arm the first tick one interval from `now_ms`.
    pub fn start(&mut self, now_ms: u64) {
        self.next_due_ms = Some(now_ms.saturating_add(self.interval_ms));
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.next_due_ms
    }

    /// Re-arm a tick that fell due while nobody was looking.
    pub fn catch_up(&mut self, now_ms: u64) {
        if self.next_due_ms.map_or(true, |due| due <= now_ms) {
            self.start(now_ms);
        }
    }

    /// Fire if due. Always re-arms once due, whether or not anything speaks.
    pub fn poll(&mut self, ctx: TriggerContext<'_>) -> Option<Candidate> {
        let now_ms = epoch_ms(ctx.now);
        match self.next_due_ms {
            Some(due) if now_ms >= due => {}
            None => {
                self.start(now_ms);
                return None;
            }
            _ => return None,
        }
        self.next_due_ms = Some(now_ms.saturating_add(self.interval_ms));
        self.fire(ctx)
    }

    /// One tick, regardless of schedule.
    pub fn fire(&self, ctx: TriggerContext<'_>) -> Option<Candidate> {
        if !ctx.gate_allows("ambient", Priority::Low) {
            return None;
        }
        ctx.catalog
            .select_line(Mood::Idle, Priority::Low, &[], ctx.seen, ctx.rng)
    }
}
