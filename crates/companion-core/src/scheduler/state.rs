use std::sync::Arc;

use crate::clock::LocalTime;
use crate::gate::Gate;
use crate::ledger::DedupLedger;
use crate::storage::Store;

/// Gate and ledger together with the two stores they persist into.
///
/// Injected into the [`Scheduler`](super::Scheduler) so the durable vs
/// tab-scoped split is decided by whoever builds it.
pub struct SchedulerState {
    gate: Gate,
    ledger: DedupLedger,
    durable: Arc<dyn Store>,
    tab: Arc<dyn Store>,
}

impl SchedulerState {
    /// Read gate and ledger from their stores. Never fails: unreadable
    /// state starts empty.
    pub fn load(durable: Arc<dyn Store>, tab: Arc<dyn Store>, cooldown_ms: u64) -> Self {
        let gate = Gate::load(durable.as_ref(), cooldown_ms);
        let ledger = DedupLedger::load(tab.as_ref(), durable.as_ref());
        Self {
            gate,
            ledger,
            durable,
            tab,
        }
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    pub fn durable(&self) -> &Arc<dyn Store> {
        &self.durable
    }

    pub fn tab(&self) -> &Arc<dyn Store> {
        &self.tab
    }

    pub fn record_shown(&mut self, now: &LocalTime) {
        self.gate.record_shown(now, self.durable.as_ref());
    }

    pub fn mark_seen(&mut self, id: &str) {
        self.ledger.mark_seen(id, self.tab.as_ref());
    }

    pub fn mark_contextual_hint_shown(&mut self) {
        self.ledger
            .mark_contextual_hint_shown(self.tab.as_ref(), self.durable.as_ref());
    }

    pub fn mute_today(&mut self, now: &LocalTime) {
        self.gate.mute_today(now, self.durable.as_ref());
    }

    pub fn mute_forever(&mut self) {
        self.gate.mute_forever(self.durable.as_ref());
    }

    pub fn unmute(&mut self) {
        self.gate.unmute(self.durable.as_ref());
    }
}
