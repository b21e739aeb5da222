//! Gate - "is the companion allowed to speak right now?"
//!
//! Three inputs decide it:
//! - a permanent mute flag
//! - a mute marker for one local calendar day
//! - a rolling cooldown measured from the last bubble that actually displayed
//!
//! All three live in the durable store and are read once at startup. Writes
//! go through immediately; a failed write is logged and the in-memory value
//! still applies for the rest of this run.

use std::fmt::Display;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::clock::{epoch_ms, LocalTime};
use crate::storage::{decode, Store};

pub const KEY_MUTED_FOREVER: &str = "companion.muted_forever";
pub const KEY_MUTED_FOR_DATE: &str = "companion.muted_for_date";
pub const KEY_LAST_SHOWN_AT: &str = "companion.last_shown_at";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gate {
    permanently_muted: bool,
    muted_for_date: Option<NaiveDate>,
    last_shown_at_ms: Option<u64>,
    cooldown_ms: u64,
}

impl Gate {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            permanently_muted: false,
            muted_for_date: None,
            last_shown_at_ms: None,
            cooldown_ms,
        }
    }

    /// Read gate state from the durable store. Unreadable or malformed
    /// values fall back to "not set".
    pub fn load(store: &dyn Store, cooldown_ms: u64) -> Self {
        Self {
            permanently_muted: load_value(store, KEY_MUTED_FOREVER, |raw| raw.parse::<bool>())
                .unwrap_or(false),
            muted_for_date: load_value(store, KEY_MUTED_FOR_DATE, |raw| {
                NaiveDate::parse_from_str(raw, DATE_FORMAT)
            }),
            last_shown_at_ms: load_value(store, KEY_LAST_SHOWN_AT, |raw| raw.parse::<u64>()),
            cooldown_ms,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Permanently muted, or muted for today's local date.
    pub fn is_muted(&self, now: &LocalTime) -> bool {
        self.permanently_muted || self.muted_for_date == Some(now.date_naive())
    }

    pub fn is_on_cooldown(&self, now: &LocalTime) -> bool {
        match self.last_shown_at_ms {
            Some(last) => epoch_ms(now).saturating_sub(last) < self.cooldown_ms,
            None => false,
        }
    }

    /// The check every ordinary trigger runs before proposing.
    pub fn allows(&self, now: &LocalTime) -> bool {
        !self.is_muted(now) && !self.is_on_cooldown(now)
    }

    /// The check the priority-0 path runs: mute only, cooldown bypassed.
    pub fn allows_urgent(&self, now: &LocalTime) -> bool {
        !self.is_muted(now)
    }

    pub fn permanently_muted(&self) -> bool {
        self.permanently_muted
    }

    pub fn muted_for_date(&self) -> Option<NaiveDate> {
        self.muted_for_date
    }

    pub fn last_shown_at_ms(&self) -> Option<u64> {
        self.last_shown_at_ms
    }

    /// Milliseconds until the cooldown lifts, zero if it already has.
    pub fn cooldown_remaining_ms(&self, now: &LocalTime) -> u64 {
        match self.last_shown_at_ms {
            Some(last) => self
                .cooldown_ms
                .saturating_sub(epoch_ms(now).saturating_sub(last)),
            None => 0,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Called once per candidate that enters the display slot.
    pub fn record_shown(&mut self, now: &LocalTime, store: &dyn Store) {
        let at = epoch_ms(now);
        self.last_shown_at_ms = Some(at);
        write(store, KEY_LAST_SHOWN_AT, &at.to_string());
    }

    /// Mute for the rest of the local calendar day. Idempotent.
    pub fn mute_today(&mut self, now: &LocalTime, store: &dyn Store) {
        let today = now.date_naive();
        self.muted_for_date = Some(today);
        write(store, KEY_MUTED_FOR_DATE, &today.format(DATE_FORMAT).to_string());
    }

    pub fn mute_forever(&mut self, store: &dyn Store) {
        self.permanently_muted = true;
        write(store, KEY_MUTED_FOREVER, "true");
    }

    /// Clear both mute flags. The cooldown is untouched.
    pub fn unmute(&mut self, store: &dyn Store) {
        self.permanently_muted = false;
        self.muted_for_date = None;
        for key in [KEY_MUTED_FOREVER, KEY_MUTED_FOR_DATE] {
            if let Err(e) = store.remove(key) {
                warn!(key, error = %e, "gate: store write failed");
            }
        }
    }
}

fn load_value<T, E: Display>(
    store: &dyn Store,
    key: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Option<T> {
    decode(store, key, parse).unwrap_or_else(|e| {
        warn!(key, error = %e, "gate: ignoring stored value");
        None
    })
}

fn write(store: &dyn Store, key: &str, value: &str) {
    if let Err(e) = store.set(key, value) {
        warn!(key, error = %e, "gate: store write failed");
    }
}
