use tracing::debug;

use super::TriggerContext;
use crate::candidate::Candidate;
use crate::hint::{evaluate, ContextUpdate, HintContext, Surface};
use crate::scheduler::ProposeOutcome;

/// Once-per-tab contextual hint.
///
/// Collects the host's data snapshots and runs the hint engine when the
/// user is on the overview, every snapshot has loaded and no hint has been
/// shown for this tab yet.
#[derive(Debug, Clone, Default)]
pub struct HintTrigger {
    context: HintContext,
    surface: Surface,
    evaluated: bool,
}

impl HintTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> &HintContext {
        &self.context
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn on_context(&mut self, update: ContextUpdate) {
        self.context.apply(update);
    }

    pub fn set_surface(&mut self, surface: Surface) {
        self.surface = surface;
    }

    /// Would a poll run the engine right now?
    pub fn is_pending(&self, hint_shown: bool) -> bool {
        !self.evaluated
            && !hint_shown
            && self.surface == Surface::Overview
            && self.context.is_ready()
    }

    /// Run the engine if eligible. A hint the gate blocks stays pending and
    /// is offered again on a later poll.
    pub fn poll(&mut self, hint_shown: bool, ctx: TriggerContext<'_>) -> Option<Candidate> {
        if !self.is_pending(hint_shown) {
            return None;
        }
        let Some(hint) = evaluate(&self.context, ctx.now) else {
            debug!("contextual hint: nothing applies");
            self.evaluated = true;
            return None;
        };
        if ctx.seen.contains(hint.id) || !ctx.gate_allows("hint", hint.priority) {
            return None;
        }
        debug!(id = hint.id, rule = ?hint.rule, "contextual hint ready");
        Some(hint.into_candidate())
    }

    /// Record what the scheduler did with the proposed hint.
    pub fn settle(&mut self, outcome: ProposeOutcome) {
        if !matches!(outcome, ProposeOutcome::Dropped { .. }) {
            self.evaluated = true;
        }
    }
}
