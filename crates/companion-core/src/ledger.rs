//! Dedup ledger: which lines this tab has already shown, and whether the
//! contextual hint has had its one appearance.
//!
//! Seen ids and the hint flag live in the tab store. The durable store keeps
//! one extra marker, the identity of the tab that last showed the hint, so a
//! reload inside the same tab stays quiet while a brand-new tab may hint
//! again.

use std::collections::HashSet;

use tracing::warn;
use uuid::Uuid;

use crate::storage::{decode, Store};

pub const KEY_TAB_ID: &str = "companion.tab_id";
pub const KEY_SEEN_IDS: &str = "companion.seen_ids";
pub const KEY_HINT_SHOWN: &str = "companion.hint_shown";
pub const KEY_HINT_TAB: &str = "companion.hint_tab";

#[derive(Debug, Clone)]
pub struct DedupLedger {
    tab_id: String,
    seen: HashSet<String>,
    contextual_hint_shown: bool,
}

impl DedupLedger {
    /// Restore the ledger for the current tab, minting a tab identity on
    /// first use.
    pub fn load(tab: &dyn Store, durable: &dyn Store) -> Self {
        let tab_id = match read(tab, KEY_TAB_ID) {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                write(tab, KEY_TAB_ID, &id);
                id
            }
        };

        let seen = match decode(tab, KEY_SEEN_IDS, |raw| serde_json::from_str::<Vec<String>>(raw)) {
            Ok(ids) => ids.map(|ids| ids.into_iter().collect()).unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "ledger: starting with no seen ids");
                HashSet::new()
            }
        };

        let shown_in_tab = read(tab, KEY_HINT_SHOWN).as_deref() == Some("true");
        let marker_matches = read(durable, KEY_HINT_TAB).as_deref() == Some(tab_id.as_str());

        Self {
            tab_id,
            seen,
            contextual_hint_shown: shown_in_tab || marker_matches,
        }
    }

    pub fn tab_id(&self) -> &str {
        &self.tab_id
    }

    pub fn is_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn seen(&self) -> &HashSet<String> {
        &self.seen
    }

    pub fn contextual_hint_shown(&self) -> bool {
        self.contextual_hint_shown
    }

    pub fn mark_seen(&mut self, id: &str, tab: &dyn Store) {
        if !self.seen.insert(id.to_string()) {
            return;
        }
        let mut ids: Vec<&String> = self.seen.iter().collect();
        ids.sort();
        match serde_json::to_string(&ids) {
            Ok(json) => write(tab, KEY_SEEN_IDS, &json),
            Err(e) => warn!(error = %e, "ledger: failed to encode seen ids"),
        }
    }

    /// Record the hint's appearance in both stores.
    pub fn mark_contextual_hint_shown(&mut self, tab: &dyn Store, durable: &dyn Store) {
        if self.contextual_hint_shown {
            return;
        }
        self.contextual_hint_shown = true;
        write(tab, KEY_HINT_SHOWN, "true");
        write(durable, KEY_HINT_TAB, &self.tab_id);
    }
}

fn read(store: &dyn Store, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(v) => v,
        Err(e) => {
            warn!(key, error = %e, "ledger: store read failed");
            None
        }
    }
}

fn write(store: &dyn Store, key: &str, value: &str) {
    if let Err(e) = store.set(key, value) {
        warn!(key, error = %e, "ledger: store write failed");
    }
}
