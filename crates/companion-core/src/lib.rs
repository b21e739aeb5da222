//! # Companion Core Library
//!
//! The bubble companion: a small moderator that decides, without being asked,
//! whether to surface a short advisory message, which one, and for how long.
//! Many independent triggers propose candidates; one scheduler arbitrates
//! between them over a single display slot.
//!
//! ## Architecture
//!
//! - **Catalog**: mood-grouped message lines with `{token}` templates
//! - **Gate**: mute flags and the global cooldown, persisted in a durable store
//! - **Dedup Ledger**: lines already shown in this tab, plus the once-per-tab
//!   contextual hint marker
//! - **Scheduler**: a wall-clock state machine over the display slot and a
//!   bounded queue; the caller invokes `tick()` at its deadlines
//! - **Triggers**: app events, ambient ticks, break invites, welcome-back and
//!   the contextual hint engine
//! - **Runtime**: a tokio actor that serialises all inputs and timers
//!
//! ## Key Components
//!
//! - [`Companion`]: synchronous facade over scheduler and triggers
//! - [`Scheduler`]: display slot, queue and dismiss timer
//! - [`runtime::spawn`]: run a companion as an actor
//! - [`CompanionConfig`]: TOML configuration

pub mod candidate;
pub mod catalog;
pub mod clock;
pub mod companion;
pub mod error;
pub mod gate;
pub mod hint;
pub mod ledger;
pub mod runtime;
pub mod scheduler;
pub mod storage;
pub mod triggers;

pub use candidate::{AriaRole, BubbleAction, Candidate, CandidateKind, Priority};
pub use catalog::{Catalog, MessageLine, Mood};
pub use clock::{Clock, LocalTime, ManualClock, SystemClock};
pub use companion::Companion;
pub use error::{CompanionError, ConfigError, StoreError};
pub use gate::Gate;
pub use hint::{evaluate as evaluate_hint, ContextUpdate, Hint, HintContext, HintRule, Surface};
pub use ledger::DedupLedger;
pub use runtime::{CompanionHandle, Input};
pub use scheduler::{BubbleView, DisplaySlot, DropReason, ProposeOutcome, Scheduler, SchedulerState};
pub use storage::{CompanionConfig, MemoryStore, SqliteStore, Store};
pub use triggers::AppEvent;
