//! Companion facade.
//!
//! Owns the scheduler and every trigger source, reads the clock, and turns
//! host signals into proposals. Everything here is synchronous; the
//! [`runtime`](crate::runtime) module wraps it in an actor.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64;
use tracing::{debug, info};

use crate::candidate::{BubbleAction, Candidate};
use crate::catalog::Catalog;
use crate::clock::{epoch_ms, Clock, LocalTime};
use crate::hint::{ContextUpdate, Surface};
use crate::runtime::Input;
use crate::scheduler::{BubbleView, DropReason, ProposeOutcome, Scheduler, SchedulerState};
use crate::storage::{CompanionConfig, Store};
use crate::triggers::{
    AmbientTicker, AppEvent, BreakInviteTimer, EventTrigger, HintTrigger, TriggerContext,
    WelcomeBack,
};

pub struct Companion {
    config: CompanionConfig,
    catalog: Catalog,
    scheduler: Scheduler,
    events: EventTrigger,
    ambient: AmbientTicker,
    break_invite: BreakInviteTimer,
    welcome_back: WelcomeBack,
    hint: HintTrigger,
    clock: Arc<dyn Clock>,
    rng: Box<dyn RngCore + Send>,
    visible: bool,
}

impl Companion {
    /// Build a companion over the given stores with an entropy-seeded RNG.
    pub fn new(
        config: CompanionConfig,
        durable: Arc<dyn Store>,
        tab: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::build(config, durable, tab, clock, Box::new(Pcg64::from_entropy()))
    }

    /// Same as [`Companion::new`] but with deterministic line selection.
    pub fn with_seed(
        config: CompanionConfig,
        durable: Arc<dyn Store>,
        tab: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        seed: u64,
    ) -> Self {
        Self::build(config, durable, tab, clock, Box::new(Pcg64::seed_from_u64(seed)))
    }

    fn build(
        config: CompanionConfig,
        durable: Arc<dyn Store>,
        tab: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        let now_ms = epoch_ms(&clock.now());
        let state = SchedulerState::load(durable, tab, config.gate.cooldown_ms());
        info!(
            tab_id = state.ledger().tab_id(),
            seen = state.ledger().seen().len(),
            "companion started"
        );

        let mut ambient = AmbientTicker::new(config.ambient.interval_ms());
        ambient.start(now_ms);
        let break_invite = BreakInviteTimer::new(
            config.break_invite.idle_ms(),
            config.break_invite.cooldown_ms(),
            config.break_invite.duration_ms(),
            config.break_invite.poll_ms(),
            now_ms,
        );

        Self {
            catalog: Catalog::builtin(),
            scheduler: Scheduler::new(state, config.display.clone()),
            events: EventTrigger::new(config.events.focus_start_probability),
            ambient,
            break_invite,
            welcome_back: WelcomeBack::new(config.welcome_back.away_ms()),
            hint: HintTrigger::new(),
            clock,
            rng,
            visible: true,
            config,
        }
    }

    /// Replace the message catalog.
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn now(&self) -> LocalTime {
        self.clock.now()
    }

    pub fn config(&self) -> &CompanionConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn hint(&self) -> &HintTrigger {
        &self.hint
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn view(&self) -> BubbleView {
        self.scheduler.view()
    }

    /// Earliest epoch-ms moment [`Companion::tick`] has something to do.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        let now = self.clock.now();
        let (ambient, break_check) = if self.visible {
            (self.ambient.next_due_ms(), Some(self.break_invite.next_check_ms()))
        } else {
            (None, None)
        };
        let hint_shown = self.scheduler.state().ledger().contextual_hint_shown();
        let hint_retry = if self.hint.is_pending(hint_shown) {
            let remaining = self.scheduler.state().gate().cooldown_remaining_ms(&now);
            (remaining > 0).then(|| epoch_ms(&now).saturating_add(remaining))
        } else {
            None
        };

        [self.scheduler.next_deadline_ms(), ambient, break_check, hint_retry]
            .into_iter()
            .flatten()
            .min()
    }

    /// Time left until [`Companion::next_deadline_ms`], zero if overdue.
    pub fn time_to_next_deadline(&self) -> Option<StdDuration> {
        let now_ms = epoch_ms(&self.clock.now());
        self.next_deadline_ms()
            .map(|at| StdDuration::from_millis(at.saturating_sub(now_ms)))
    }

    // ── Trigger inputs ───────────────────────────────────────────────

    /// Offer a ready-made candidate from the host. Held to the same gate as
    /// the built-in triggers: only priority 0 skips the cooldown.
    pub fn propose(&mut self, candidate: Candidate) -> ProposeOutcome {
        let now = self.clock.now();
        let gate = self.scheduler.state().gate();
        if !candidate.priority.is_urgent() && gate.is_on_cooldown(&now) {
            debug!(id = %candidate.id, "bubble dropped: cooldown");
            return ProposeOutcome::Dropped {
                reason: DropReason::Cooldown,
            };
        }
        self.submit(candidate, &now)
    }

    pub fn on_app_event(&mut self, event: &AppEvent) -> Option<ProposeOutcome> {
        let now = self.clock.now();
        let ctx = trigger_ctx(&now, &self.scheduler, &self.catalog, self.rng.as_mut());
        let candidate = self.events.on_event(event, ctx)?;
        Some(self.submit(candidate, &now))
    }

    /// Fire the ambient ticker now, off its schedule.
    pub fn on_ambient_tick(&mut self) -> Option<ProposeOutcome> {
        if !self.visible {
            return None;
        }
        let now = self.clock.now();
        let ctx = trigger_ctx(&now, &self.scheduler, &self.catalog, self.rng.as_mut());
        let candidate = self.ambient.fire(ctx)?;
        Some(self.submit(candidate, &now))
    }

    /// User input activity (pointer, keyboard, touch, scroll).
    pub fn on_activity(&mut self) {
        let now_ms = epoch_ms(&self.clock.now());
        self.break_invite.record_activity(now_ms);
    }

    /// Check the inactivity clock now, off its poll cadence.
    pub fn poll_break_invite(&mut self) -> Option<ProposeOutcome> {
        if !self.visible {
            return None;
        }
        let now = self.clock.now();
        let ctx = trigger_ctx(&now, &self.scheduler, &self.catalog, self.rng.as_mut());
        let candidate = self.break_invite.check(ctx)?;
        Some(self.submit_break_invite(candidate, &now))
    }

    pub fn on_visibility(&mut self, visible: bool) -> Option<ProposeOutcome> {
        let now = self.clock.now();
        let now_ms = epoch_ms(&now);
        self.visible = visible;
        if visible {
            self.ambient.catch_up(now_ms);
            self.break_invite.record_activity(now_ms);
        }
        let ctx = trigger_ctx(&now, &self.scheduler, &self.catalog, self.rng.as_mut());
        let candidate = self.welcome_back.on_visibility(visible, ctx)?;
        Some(self.submit(candidate, &now))
    }

    /// A hint-context fetch finished (or failed).
    pub fn on_context(&mut self, update: ContextUpdate) -> Option<ProposeOutcome> {
        self.hint.on_context(update);
        let now = self.clock.now();
        self.poll_hint(&now)
    }

    pub fn set_surface(&mut self, surface: Surface) -> Option<ProposeOutcome> {
        self.hint.set_surface(surface);
        let now = self.clock.now();
        self.poll_hint(&now)
    }

    /// Advance the display slot and fire any due periodic trigger. Returns
    /// true if the view changed.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now();
        let before = self.scheduler.view();
        self.scheduler.tick(&now);

        if self.visible {
            let ctx = trigger_ctx(&now, &self.scheduler, &self.catalog, self.rng.as_mut());
            if let Some(candidate) = self.ambient.poll(ctx) {
                self.submit(candidate, &now);
            }
            let ctx = trigger_ctx(&now, &self.scheduler, &self.catalog, self.rng.as_mut());
            if let Some(candidate) = self.break_invite.poll(ctx) {
                self.submit_break_invite(candidate, &now);
            }
        }
        self.poll_hint(&now);

        self.scheduler.view() != before
    }

    // ── Render-layer commands ────────────────────────────────────────

    pub fn dismiss(&mut self) -> bool {
        let now = self.clock.now();
        self.scheduler.dismiss(&now)
    }

    pub fn outside_click(&mut self) -> bool {
        let now = self.clock.now();
        self.scheduler.outside_click(&now)
    }

    pub fn activate_action(&mut self) -> Option<BubbleAction> {
        let now = self.clock.now();
        let action = self.scheduler.activate_action(&now)?;
        info!(?action, "bubble action taken");
        Some(action)
    }

    pub fn mute_today(&mut self) {
        let now = self.clock.now();
        info!("companion muted for today");
        self.scheduler.mute_today(&now);
    }

    pub fn mute_forever(&mut self) {
        let now = self.clock.now();
        info!("companion muted");
        self.scheduler.mute_forever(&now);
    }

    pub fn unmute(&mut self) {
        info!("companion unmuted");
        self.scheduler.unmute();
    }

    pub fn pause(&mut self) -> bool {
        let now = self.clock.now();
        self.scheduler.pause(&now)
    }

    pub fn resume(&mut self) -> bool {
        let now = self.clock.now();
        self.scheduler.resume(&now)
    }

    /// Apply one host input. Returns the action taken, if the input was an
    /// action activation.
    pub fn apply(&mut self, input: Input) -> Option<BubbleAction> {
        match input {
            Input::Event { event } => {
                self.on_app_event(&event);
            }
            Input::Propose { candidate } => {
                self.propose(candidate);
            }
            Input::Activity => self.on_activity(),
            Input::Visibility { visible } => {
                self.on_visibility(visible);
            }
            Input::Context { update } => {
                self.on_context(update);
            }
            Input::Surface { surface } => {
                self.set_surface(surface);
            }
            Input::Dismiss => {
                self.dismiss();
            }
            Input::OutsideClick => {
                self.outside_click();
            }
            Input::ActivateAction => return self.activate_action(),
            Input::MuteToday => self.mute_today(),
            Input::MuteForever => self.mute_forever(),
            Input::Unmute => self.unmute(),
            Input::Pause => {
                self.pause();
            }
            Input::Resume => {
                self.resume();
            }
            Input::AmbientTick => {
                self.on_ambient_tick();
            }
        }
        None
    }

    /// Drop in-flight bubbles. Persisted gate and ledger state stays.
    pub fn shutdown(&mut self) {
        debug!(queued = self.scheduler.queue().len(), "companion shutting down");
        self.scheduler.clear();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn submit(&mut self, candidate: Candidate, now: &LocalTime) -> ProposeOutcome {
        if !self.config.enabled {
            debug!(id = %candidate.id, "bubble dropped: companion disabled");
            return ProposeOutcome::Dropped {
                reason: DropReason::Muted,
            };
        }
        self.scheduler.propose(candidate, now)
    }

    fn submit_break_invite(&mut self, candidate: Candidate, now: &LocalTime) -> ProposeOutcome {
        let outcome = self.submit(candidate, now);
        self.break_invite.settle(outcome, epoch_ms(now));
        outcome
    }

    fn poll_hint(&mut self, now: &LocalTime) -> Option<ProposeOutcome> {
        let shown = self.scheduler.state().ledger().contextual_hint_shown();
        let ctx = trigger_ctx(now, &self.scheduler, &self.catalog, self.rng.as_mut());
        let candidate = self.hint.poll(shown, ctx)?;
        let outcome = self.submit(candidate, now);
        self.hint.settle(outcome);
        Some(outcome)
    }
}

fn trigger_ctx<'a>(
    now: &'a LocalTime,
    scheduler: &'a Scheduler,
    catalog: &'a Catalog,
    rng: &'a mut dyn RngCore,
) -> TriggerContext<'a> {
    TriggerContext {
        now,
        gate: scheduler.state().gate(),
        seen: scheduler.state().ledger().seen(),
        catalog,
        rng,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{CandidateKind, Priority};
    use crate::catalog::Mood;
    use crate::clock::ManualClock;
    use crate::hint::Course;
    use crate::storage::MemoryStore;
    use chrono::{DateTime, Duration};

    struct Harness {
        clock: ManualClock,
        durable: MemoryStore,
        tab: MemoryStore,
    }

    impl Harness {
        fn new() -> Self {
            let start = DateTime::parse_from_rfc3339("2026-03-09T10:00:00+01:00").unwrap();
            Self {
                clock: ManualClock::new(start),
                durable: MemoryStore::new(),
                tab: MemoryStore::new(),
            }
        }

        fn companion(&self) -> Companion {
            self.companion_with(CompanionConfig::default())
        }

        fn companion_with(&self, config: CompanionConfig) -> Companion {
            Companion::with_seed(
                config,
                Arc::new(self.durable.clone()),
                Arc::new(self.tab.clone()),
                Arc::new(self.clock.clone()),
                11,
            )
        }

        fn advance(&self, by: Duration) {
            self.clock.advance(by);
        }
    }

    fn load_exam_context(companion: &mut Companion, exam_in_days: i64) -> Option<ProposeOutcome> {
        let today = companion.now().date_naive();
        companion.on_context(ContextUpdate::Courses(vec![Course {
            name: "Algebra II".into(),
            exam_date: Some(today + Duration::days(exam_in_days)),
        }]));
        companion.on_context(ContextUpdate::Tasks(Vec::new()));
        companion.on_context(ContextUpdate::Sessions(Vec::new()));
        companion.on_context(ContextUpdate::Applications(Vec::new()))
    }

    #[test]
    fn event_shows_bubble() {
        let h = Harness::new();
        let mut c = h.companion();
        let outcome = c.on_app_event(&AppEvent::TaskCompleted { title: None });
        assert_eq!(outcome, Some(ProposeOutcome::Shown));
        let view = c.view();
        assert!(view.visible);
        assert_eq!(view.mood, Some(Mood::Celebrate));
    }

    #[test]
    fn second_event_inside_cooldown_is_suppressed() {
        let h = Harness::new();
        let mut c = h.companion();
        c.on_app_event(&AppEvent::TaskCompleted { title: None });
        h.advance(Duration::minutes(1));
        assert_eq!(c.on_app_event(&AppEvent::ExerciseCompleted), None);
        assert!(c.scheduler().queue().is_empty());
    }

    #[test]
    fn tick_dismisses_after_duration() {
        let h = Harness::new();
        let mut c = h.companion();
        c.on_app_event(&AppEvent::GoalCreated);
        let deadline = c.next_deadline_ms().unwrap();
        assert!(deadline <= epoch_ms(&c.now()) + 8_000);

        h.advance(Duration::seconds(9));
        assert!(c.tick());
        assert!(c.view().hiding);
        h.advance(Duration::milliseconds(220));
        assert!(c.tick());
        assert!(!c.view().visible && !c.view().hiding);
    }

    #[test]
    fn ambient_fires_on_schedule() {
        let h = Harness::new();
        let mut c = h.companion();
        h.advance(Duration::minutes(45));
        assert!(c.tick());
        assert_eq!(c.view().mood, Some(Mood::Idle));
    }

    #[test]
    fn hidden_tab_skips_ambient_and_welcomes_back() {
        let h = Harness::new();
        let mut c = h.companion();
        c.on_visibility(false);
        h.advance(Duration::minutes(50));
        assert!(!c.tick());

        let outcome = c.on_visibility(true);
        assert_eq!(outcome, Some(ProposeOutcome::Shown));
        assert_eq!(c.view().mood, Some(Mood::Recovery));
    }

    #[test]
    fn break_invite_after_inactivity() {
        let h = Harness::new();
        let mut c = h.companion();
        h.advance(Duration::minutes(7));
        c.tick();
        let view = c.view();
        assert_eq!(view.kind, Some(CandidateKind::BreakInvite));
        assert!(!view.dismiss_on_outside_click);

        assert!(!c.outside_click());
        assert_eq!(
            c.activate_action(),
            Some(BubbleAction::StartBreak { minutes: 5 })
        );
        assert!(c.view().hiding);
    }

    #[test]
    fn break_invite_dropped_for_full_queue_is_offered_again() {
        let h = Harness::new();
        let mut c = h.companion();
        for id in ["due-1", "due-2", "due-3"] {
            c.propose(Candidate::new(id, "Due now.", Mood::Warning, Priority::Urgent));
        }
        assert_eq!(c.scheduler().queue().len(), 2);
        assert!(c.pause());

        h.advance(Duration::minutes(8));
        let full = Some(ProposeOutcome::Dropped {
            reason: DropReason::QueueFull,
        });
        assert_eq!(c.poll_break_invite(), full);
        h.advance(Duration::seconds(30));
        assert_eq!(c.poll_break_invite(), full);
    }

    #[test]
    fn contextual_hint_once_per_tab() {
        let h = Harness::new();
        let mut c = h.companion();
        assert_eq!(load_exam_context(&mut c, 1), Some(ProposeOutcome::Shown));
        assert!(c.view().text.unwrap_or_default().contains("tomorrow"));

        // Reload in the same tab: no second hint.
        let mut reloaded = h.companion();
        h.advance(Duration::minutes(20));
        assert_eq!(load_exam_context(&mut reloaded, 1), None);

        // A new tab over the same durable store may hint again.
        let fresh_tab = Harness {
            clock: h.clock.clone(),
            durable: h.durable.clone(),
            tab: MemoryStore::new(),
        };
        let mut other = fresh_tab.companion();
        assert_eq!(load_exam_context(&mut other, 1), Some(ProposeOutcome::Shown));
    }

    #[test]
    fn hint_waits_for_overview() {
        let h = Harness::new();
        let mut c = h.companion();
        c.set_surface(Surface::Other);
        assert_eq!(load_exam_context(&mut c, 0), None);
        assert_eq!(c.set_surface(Surface::Overview), Some(ProposeOutcome::Shown));
    }

    #[test]
    fn mute_today_silences_everything() {
        let h = Harness::new();
        let mut c = h.companion();
        c.on_app_event(&AppEvent::TaskCompleted { title: None });
        c.mute_today();
        assert!(c.view().hiding);

        let deadline = AppEvent::DeadlineApproaching {
            title: "Essay".into(),
            days_left: 1,
        };
        assert_eq!(c.on_app_event(&deadline), None);

        // Persisted: a reload stays muted.
        let mut reloaded = h.companion();
        assert_eq!(reloaded.on_app_event(&deadline), None);
        reloaded.unmute();
        assert!(reloaded.on_app_event(&deadline).is_some());
    }

    #[test]
    fn deadline_preempts_through_facade() {
        let h = Harness::new();
        let mut c = h.companion();
        c.on_app_event(&AppEvent::GoalCreated);
        let deadline = AppEvent::DeadlineApproaching {
            title: "Essay".into(),
            days_left: 0,
        };
        assert_eq!(c.on_app_event(&deadline), Some(ProposeOutcome::Preempting));
        h.advance(Duration::milliseconds(220));
        c.tick();
        let view = c.view();
        assert_eq!(view.mood, Some(Mood::Warning));
        assert_eq!(view.aria_role, Some(crate::candidate::AriaRole::Alert));
    }

    #[test]
    fn disabled_companion_drops_proposals() {
        let h = Harness::new();
        let config = CompanionConfig {
            enabled: false,
            ..CompanionConfig::default()
        };
        let mut c = h.companion_with(config);
        let outcome = c.propose(Candidate::new("x", "Hi", Mood::Idle, Priority::Low));
        assert_eq!(
            outcome,
            ProposeOutcome::Dropped {
                reason: DropReason::Muted
            }
        );
    }

    #[test]
    fn host_proposals_respect_the_cooldown() {
        let h = Harness::new();
        let mut c = h.companion();
        c.on_app_event(&AppEvent::TaskCompleted { title: None });
        c.dismiss();
        h.advance(Duration::seconds(1));
        c.tick();
        assert!(c.scheduler().state().gate().is_on_cooldown(&c.now()));

        let ordinary = Candidate::new("host-1", "From the host.", Mood::Idle, Priority::Low);
        assert_eq!(
            c.propose(ordinary.clone()),
            ProposeOutcome::Dropped {
                reason: DropReason::Cooldown
            }
        );
        let urgent = Candidate::new("host-2", "Due now.", Mood::Warning, Priority::Urgent);
        assert_eq!(c.propose(urgent), ProposeOutcome::Shown);

        h.advance(Duration::minutes(8));
        c.on_activity();
        c.dismiss();
        h.advance(Duration::milliseconds(220));
        c.tick();
        assert_eq!(c.propose(ordinary), ProposeOutcome::Shown);
    }

    #[test]
    fn wire_proposal_with_unfilled_token_is_not_shown() {
        let h = Harness::new();
        let mut c = h.companion();
        let input: Input = serde_json::from_str(
            r#"{"type":"propose","candidate":{"id":"x","text":"Day {days} of your streak","mood":"celebrate","priority":"low","aria_role":"status","kind":"default"}}"#,
        )
        .unwrap();
        c.apply(input);
        assert_eq!(c.view(), BubbleView::hidden());
        assert!(!c.scheduler().state().ledger().is_seen("x"));
    }

    #[test]
    fn extreme_config_values_do_not_overflow() {
        let h = Harness::new();
        let mut config = CompanionConfig::default();
        config.gate.cooldown_mins = u64::MAX;
        config.ambient.interval_mins = u64::MAX;
        config.break_invite.idle_mins = u64::MAX;
        config.break_invite.poll_secs = u64::MAX;
        config.display.exit_transition_ms = u64::MAX;
        let mut c = h.companion_with(config);

        assert_eq!(c.on_app_event(&AppEvent::GoalCreated), Some(ProposeOutcome::Shown));
        assert!(c.dismiss());
        h.advance(Duration::minutes(90));
        assert!(!c.tick());
        assert!(c.view().hiding);
        assert!(c.next_deadline_ms().is_some());
    }

    #[test]
    fn apply_routes_inputs() {
        let h = Harness::new();
        let mut c = h.companion();
        c.apply(Input::Event {
            event: AppEvent::LevelUp { level: 4 },
        });
        assert!(c.view().visible);
        c.apply(Input::Pause);
        assert!(c.view().paused);
        c.apply(Input::Resume);
        c.apply(Input::Dismiss);
        assert!(c.view().hiding);
    }

    #[test]
    fn shutdown_clears_slot() {
        let h = Harness::new();
        let mut c = h.companion();
        c.on_app_event(&AppEvent::GoalCreated);
        c.shutdown();
        assert_eq!(c.view(), BubbleView::hidden());
    }
}
