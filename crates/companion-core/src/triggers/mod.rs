//! Trigger sources: independent producers that each propose at most one
//! candidate at a time.
//!
//! Every source consults the [`Gate`] before proposing. Only priority-0
//! proposals skip the cooldown; mute always wins.

pub mod ambient;
pub mod break_invite;
pub mod events;
pub mod hint;
pub mod welcome_back;

pub use ambient::AmbientTicker;
pub use break_invite::BreakInviteTimer;
pub use events::{AppEvent, EventRoute, EventTrigger};
pub use hint::HintTrigger;
pub use welcome_back::WelcomeBack;

use std::collections::HashSet;

use rand::RngCore;
use tracing::trace;

use crate::candidate::Priority;
use crate::catalog::Catalog;
use crate::clock::LocalTime;
use crate::gate::Gate;

/// What a trigger may look at while deciding.
pub struct TriggerContext<'a> {
    pub now: &'a LocalTime,
    pub gate: &'a Gate,
    pub seen: &'a HashSet<String>,
    pub catalog: &'a Catalog,
    pub rng: &'a mut dyn RngCore,
}

impl TriggerContext<'_> {
    /// Gate check for a proposal at `priority`.
    pub fn gate_allows(&self, source: &'static str, priority: Priority) -> bool {
        let allowed = if priority.is_urgent() {
            self.gate.allows_urgent(self.now)
        } else {
            self.gate.allows(self.now)
        };
        if !allowed {
            trace!(source, priority = priority.as_u8(), "trigger suppressed by gate");
        }
        allowed
    }
}
