use super::TriggerContext;
use crate::candidate::{Candidate, Priority};
use crate::catalog::Mood;
use crate::clock::epoch_ms;

/// Check-in for a user returning to the tab after a long absence.
#[derive(Debug, Clone)]
pub struct WelcomeBack {
    away_ms: u64,
    hidden_since_ms: Option<u64>,
}

impl WelcomeBack {
    pub fn new(away_ms: u64) -> Self {
        Self {
            away_ms,
            hidden_since_ms: None,
        }
    }

    pub fn hidden_since_ms(&self) -> Option<u64> {
        self.hidden_since_ms
    }

    /// Feed a visibility change. Only hidden -> visible after the away
    /// threshold can produce a candidate.
    pub fn on_visibility(&mut self, visible: bool, ctx: TriggerContext<'_>) -> Option<Candidate> {
        let now_ms = epoch_ms(ctx.now);
        if !visible {
            self.hidden_since_ms.get_or_insert(now_ms);
            return None;
        }

        let since = self.hidden_since_ms.take()?;
        if now_ms.saturating_sub(since) < self.away_ms {
            return None;
        }
        if !ctx.gate_allows("welcome_back", Priority::Normal) {
            return None;
        }
        ctx.catalog
            .select_line(Mood::Recovery, Priority::Normal, &[], ctx.seen, ctx.rng)
            .or_else(|| {
                ctx.catalog
                    .select_line(Mood::Idle, Priority::Normal, &[], ctx.seen, ctx.rng)
            })
    }
}
