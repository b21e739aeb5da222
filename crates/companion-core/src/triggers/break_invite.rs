use super::TriggerContext;
use crate::candidate::{BubbleAction, Candidate, Priority};
use crate::catalog::Mood;
use crate::clock::epoch_ms;
use crate::scheduler::ProposeOutcome;

/// Break length offered by the invite's action.
pub const BREAK_MINUTES: u32 = 5;

/// Inactivity watcher that invites the user to take a break.
///
/// After `idle_ms` without input it offers a break-invite bubble. Once the
/// scheduler takes one, it stays quiet for its own `cooldown_ms` regardless
/// of the gate's cooldown.
#[derive(Debug, Clone)]
pub struct BreakInviteTimer {
    idle_ms: u64,
    cooldown_ms: u64,
    duration_ms: u64,
    poll_ms: u64,
    last_activity_ms: u64,
    last_invited_ms: Option<u64>,
    next_check_ms: u64,
}

impl BreakInviteTimer {
    pub fn new(idle_ms: u64, cooldown_ms: u64, duration_ms: u64, poll_ms: u64, now_ms: u64) -> Self {
        let poll_ms = poll_ms.max(1);
        Self {
            idle_ms,
            cooldown_ms,
            duration_ms,
            poll_ms,
            last_activity_ms: now_ms,
            last_invited_ms: None,
            next_check_ms: now_ms.saturating_add(poll_ms),
        }
    }

    /// Mouse, keyboard, touch or scroll input.
    pub fn record_activity(&mut self, now_ms: u64) {
        self.last_activity_ms = self.last_activity_ms.max(now_ms);
    }

    pub fn last_activity_ms(&self) -> u64 {
        self.last_activity_ms
    }

    pub fn last_invited_ms(&self) -> Option<u64> {
        self.last_invited_ms
    }

    pub fn next_check_ms(&self) -> u64 {
        self.next_check_ms
    }

    pub fn idle_for_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_activity_ms)
    }

    pub fn is_cooling_down(&self, now_ms: u64) -> bool {
        self.last_invited_ms
            .is_some_and(|at| now_ms.saturating_sub(at) < self.cooldown_ms)
    }

    /// Check the inactivity clock if a check is due.
    pub fn poll(&mut self, ctx: TriggerContext<'_>) -> Option<Candidate> {
        let now_ms = epoch_ms(ctx.now);
        if now_ms < self.next_check_ms {
            return None;
        }
        self.next_check_ms = now_ms.saturating_add(self.poll_ms);
        self.check(ctx)
    }

    /// Check now, ignoring the poll cadence. Does not start the cooldown;
    /// hand the scheduler's answer to [`BreakInviteTimer::settle`].
    pub fn check(&self, ctx: TriggerContext<'_>) -> Option<Candidate> {
        let now_ms = epoch_ms(ctx.now);
        if self.idle_for_ms(now_ms) < self.idle_ms || self.is_cooling_down(now_ms) {
            return None;
        }
        if !ctx.gate_allows("break_invite", Priority::Normal) {
            return None;
        }
        let (id, text) = ctx.catalog.select_break_invite(&[], ctx.seen, ctx.rng)?;
        let action = BubbleAction::StartBreak {
            minutes: BREAK_MINUTES,
        };
        Some(
            Candidate::new(id, text, Mood::Idle, Priority::Normal)
                .as_break_invite(self.duration_ms, action),
        )
    }

    /// Record what the scheduler did with the invite. A dropped invite
    /// leaves the cooldown untouched so the next check may offer again.
    pub fn settle(&mut self, outcome: ProposeOutcome, now_ms: u64) {
        if !matches!(outcome, ProposeOutcome::Dropped { .. }) {
            self.last_invited_ms = Some(now_ms);
        }
    }
}
