//! Scheduler core - the single moderator of the bubble slot.
//!
//! A wall-clock state machine over one display slot and a small FIFO queue.
//! It has no thread of its own: the owner feeds it proposals and user
//! actions, and calls [`Scheduler::tick`] at or after
//! [`Scheduler::next_deadline_ms`].
//!
//! ## Slot states
//!
//! ```text
//! Empty -> Showing -> Hiding -> (Showing | Empty)
//! ```
//!
//! `Hiding` is the exit transition. The next candidate may only occupy the
//! slot once it has elapsed. A priority-0 candidate that preempts an ordinary
//! one waits in `Hiding` and goes first when the transition ends.

mod state;
mod timer;

pub use state::SchedulerState;
pub use timer::DismissTimer;

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, info};

use crate::candidate::{AriaRole, BubbleAction, Candidate, CandidateKind};
use crate::catalog::{has_unresolved_tokens, Mood};
use crate::clock::{epoch_ms, LocalTime};
use crate::storage::DisplayConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum DisplaySlot {
    Empty,
    Showing {
        candidate: Candidate,
        timer: DismissTimer,
    },
    Hiding {
        candidate: Candidate,
        until_ms: u64,
        /// Preempting candidate, shown before anything queued.
        next: Option<Candidate>,
    },
}

impl DisplaySlot {
    pub fn is_empty(&self) -> bool {
        matches!(self, DisplaySlot::Empty)
    }

    pub fn is_showing(&self) -> bool {
        matches!(self, DisplaySlot::Showing { .. })
    }

    pub fn is_hiding(&self) -> bool {
        matches!(self, DisplaySlot::Hiding { .. })
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            DisplaySlot::Empty => None,
            DisplaySlot::Showing { candidate, .. } | DisplaySlot::Hiding { candidate, .. } => {
                Some(candidate)
            }
        }
    }
}

/// What `propose` did with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProposeOutcome {
    Shown,
    /// Current bubble is leaving, the candidate shows after the exit transition.
    Preempting,
    Queued { position: usize },
    Dropped { reason: DropReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    Muted,
    /// Ordinary candidate offered while the cooldown runs.
    Cooldown,
    /// Text still carries an unfilled `{token}`.
    Malformed,
    /// The line was already displayed in this tab.
    AlreadySeen,
    /// The same line is on screen or waiting.
    Duplicate,
    QueueFull,
}

/// Everything the render layer needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubbleView {
    pub visible: bool,
    pub hiding: bool,
    pub id: Option<String>,
    pub text: Option<String>,
    pub mood: Option<Mood>,
    pub aria_role: Option<AriaRole>,
    pub kind: Option<CandidateKind>,
    pub paused: bool,
    pub action: Option<BubbleAction>,
    /// Outside clicks dismiss unless a break invite is showing.
    pub dismiss_on_outside_click: bool,
    pub queued: usize,
}

impl BubbleView {
    pub fn hidden() -> Self {
        Self {
            visible: false,
            hiding: false,
            id: None,
            text: None,
            mood: None,
            aria_role: None,
            kind: None,
            paused: false,
            action: None,
            dismiss_on_outside_click: true,
            queued: 0,
        }
    }
}

pub struct Scheduler {
    state: SchedulerState,
    display: DisplayConfig,
    slot: DisplaySlot,
    queue: VecDeque<Candidate>,
}

impl Scheduler {
    pub fn new(state: SchedulerState, display: DisplayConfig) -> Self {
        Self {
            state,
            display,
            slot: DisplaySlot::Empty,
            queue: VecDeque::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn slot(&self) -> &DisplaySlot {
        &self.slot
    }

    pub fn queue(&self) -> &VecDeque<Candidate> {
        &self.queue
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    /// Earliest moment `tick` has work to do.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        match &self.slot {
            DisplaySlot::Empty => None,
            DisplaySlot::Showing { timer, .. } => timer.deadline_ms(),
            DisplaySlot::Hiding { until_ms, .. } => Some(*until_ms),
        }
    }

    pub fn view(&self) -> BubbleView {
        let mut view = BubbleView::hidden();
        view.queued = self.queue.len();
        let (candidate, paused, hiding) = match &self.slot {
            DisplaySlot::Empty => return view,
            DisplaySlot::Showing { candidate, timer } => (candidate, !timer.is_running(), false),
            DisplaySlot::Hiding { candidate, .. } => (candidate, false, true),
        };
        view.visible = !hiding;
        view.hiding = hiding;
        view.id = Some(candidate.id.clone());
        view.text = Some(candidate.text.clone());
        view.mood = Some(candidate.mood);
        view.aria_role = Some(candidate.aria_role);
        view.kind = Some(candidate.kind);
        view.paused = paused;
        view.action = candidate.action.clone();
        view.dismiss_on_outside_click = candidate.kind != CandidateKind::BreakInvite;
        view
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Offer a candidate. Show, preempt, queue or drop, decided in one step.
    pub fn propose(&mut self, candidate: Candidate, now: &LocalTime) -> ProposeOutcome {
        if has_unresolved_tokens(&candidate.text) {
            debug!(id = %candidate.id, "bubble dropped: unresolved token");
            return dropped(DropReason::Malformed);
        }
        if self.state.gate().is_muted(now) {
            debug!(id = %candidate.id, "bubble dropped: muted");
            return dropped(DropReason::Muted);
        }
        if self.state.ledger().is_seen(&candidate.id) {
            debug!(id = %candidate.id, "bubble dropped: already seen");
            return dropped(DropReason::AlreadySeen);
        }
        if self.is_pending(&candidate.id) {
            debug!(id = %candidate.id, "bubble dropped: duplicate");
            return dropped(DropReason::Duplicate);
        }

        if self.slot.is_empty() {
            self.show(candidate, now);
            return ProposeOutcome::Shown;
        }

        let preempts = match &self.slot {
            DisplaySlot::Showing { candidate: current, .. } => {
                candidate.priority.is_urgent() && !current.priority.is_urgent()
            }
            _ => false,
        };
        if preempts {
            if let Some(current) = self.slot.candidate() {
                info!(outgoing = %current.id, incoming = %candidate.id, "bubble preempted");
            }
            self.begin_hiding(now, Some(candidate));
            return ProposeOutcome::Preempting;
        }

        if self.queue.len() < self.display.queue_capacity {
            debug!(id = %candidate.id, position = self.queue.len(), "bubble queued");
            self.queue.push_back(candidate);
            return ProposeOutcome::Queued {
                position: self.queue.len() - 1,
            };
        }

        debug!(id = %candidate.id, "bubble dropped: queue full");
        dropped(DropReason::QueueFull)
    }

    /// Advance timers. Returns true if the slot changed.
    pub fn tick(&mut self, now: &LocalTime) -> bool {
        let now_ms = epoch_ms(now);
        let mut changed = false;

        let expired = match &self.slot {
            DisplaySlot::Showing { timer, .. } => timer.is_expired(now_ms),
            _ => false,
        };
        if expired {
            debug!(id = ?self.slot.candidate().map(|c| &c.id), "bubble timed out");
            self.begin_hiding(now, None);
            changed = true;
        }

        let exit_done = match &self.slot {
            DisplaySlot::Hiding { until_ms, .. } => now_ms >= *until_ms,
            _ => false,
        };
        if exit_done {
            self.finish_hiding(now);
            changed = true;
        }

        changed
    }

    /// Explicit close. Only acts on a showing bubble.
    pub fn dismiss(&mut self, now: &LocalTime) -> bool {
        if !self.slot.is_showing() {
            return false;
        }
        self.begin_hiding(now, None);
        true
    }

    /// Click outside the bubble. Ignored while a break invite shows.
    pub fn outside_click(&mut self, now: &LocalTime) -> bool {
        let is_invite = self
            .slot
            .candidate()
            .is_some_and(|c| c.kind == CandidateKind::BreakInvite);
        if is_invite && self.slot.is_showing() {
            return false;
        }
        self.dismiss(now)
    }

    /// Take the bubble's action, dismissing it.
    pub fn activate_action(&mut self, now: &LocalTime) -> Option<BubbleAction> {
        let action = match &self.slot {
            DisplaySlot::Showing { candidate, .. } => candidate.action.clone()?,
            _ => return None,
        };
        self.begin_hiding(now, None);
        Some(action)
    }

    /// Freeze the dismiss timer (hover/focus). No-op unless showing and running.
    pub fn pause(&mut self, now: &LocalTime) -> bool {
        match &mut self.slot {
            DisplaySlot::Showing { timer, .. } => timer.pause(epoch_ms(now)),
            _ => false,
        }
    }

    pub fn resume(&mut self, now: &LocalTime) -> bool {
        match &mut self.slot {
            DisplaySlot::Showing { timer, .. } => timer.resume(epoch_ms(now)),
            _ => false,
        }
    }

    /// Silence for the rest of today: hide what's showing, forget the backlog.
    pub fn mute_today(&mut self, now: &LocalTime) {
        self.state.mute_today(now);
        self.silence(now);
    }

    pub fn mute_forever(&mut self, now: &LocalTime) {
        self.state.mute_forever();
        self.silence(now);
    }

    pub fn unmute(&mut self) {
        self.state.unmute();
    }

    /// Drop everything in flight. Used on shutdown; persisted state stays.
    pub fn clear(&mut self) {
        self.slot = DisplaySlot::Empty;
        self.queue.clear();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn is_pending(&self, id: &str) -> bool {
        let in_slot = match &self.slot {
            DisplaySlot::Empty => false,
            DisplaySlot::Showing { candidate, .. } => candidate.id == id,
            DisplaySlot::Hiding { candidate, next, .. } => {
                candidate.id == id || next.as_ref().is_some_and(|n| n.id == id)
            }
        };
        in_slot || self.queue.iter().any(|c| c.id == id)
    }

    fn show(&mut self, candidate: Candidate, now: &LocalTime) {
        self.state.record_shown(now);
        self.state.mark_seen(&candidate.id);
        if candidate.contextual_hint {
            self.state.mark_contextual_hint_shown();
        }
        let duration = candidate
            .duration_ms_override
            .unwrap_or_else(|| self.display.duration_for(&candidate.text));
        info!(
            id = %candidate.id,
            priority = candidate.priority.as_u8(),
            duration_ms = duration,
            "bubble shown"
        );
        self.slot = DisplaySlot::Showing {
            timer: DismissTimer::start(duration, epoch_ms(now)),
            candidate,
        };
    }

    fn begin_hiding(&mut self, now: &LocalTime, next: Option<Candidate>) {
        let previous = std::mem::replace(&mut self.slot, DisplaySlot::Empty);
        if let DisplaySlot::Showing { candidate, .. } = previous {
            self.slot = DisplaySlot::Hiding {
                candidate,
                until_ms: epoch_ms(now).saturating_add(self.display.exit_transition_ms),
                next,
            };
        } else {
            self.slot = previous;
        }
    }

    fn finish_hiding(&mut self, now: &LocalTime) {
        let previous = std::mem::replace(&mut self.slot, DisplaySlot::Empty);
        let preemptor = match previous {
            DisplaySlot::Hiding { next, .. } => next,
            other => {
                self.slot = other;
                return;
            }
        };

        if self.state.gate().is_muted(now) {
            self.queue.clear();
            return;
        }

        if let Some(candidate) = preemptor {
            if !self.state.ledger().is_seen(&candidate.id) {
                self.show(candidate, now);
                return;
            }
        }
        while let Some(candidate) = self.queue.pop_front() {
            if self.state.ledger().is_seen(&candidate.id) {
                debug!(id = %candidate.id, "queued bubble skipped: already seen");
                continue;
            }
            self.show(candidate, now);
            return;
        }
    }

    fn silence(&mut self, now: &LocalTime) {
        self.queue.clear();
        if let DisplaySlot::Hiding { next, .. } = &mut self.slot {
            *next = None;
        }
        self.dismiss(now);
    }
}

fn dropped(reason: DropReason) -> ProposeOutcome {
    ProposeOutcome::Dropped { reason }
}
