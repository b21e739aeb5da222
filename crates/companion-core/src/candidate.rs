//! Ready-to-display bubble messages.

use serde::{Deserialize, Serialize};

use crate::catalog::Mood;

/// Display priority. `Urgent` (0) is the only level allowed to preempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// 0: imminent deadlines
    Urgent,
    /// 1
    High,
    /// 2
    Normal,
    /// 3
    Low,
}

impl Priority {
    /// Get numeric level value (0-3)
    pub fn as_u8(self) -> u8 {
        match self {
            Priority::Urgent => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
        }
    }

    /// Convert from numeric level value
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Priority::Urgent,
            1 => Priority::High,
            2 => Priority::Normal,
            _ => Priority::Low,
        }
    }

    pub fn is_urgent(self) -> bool {
        self == Priority::Urgent
    }
}

/// Accessibility role the render layer announces the bubble with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AriaRole {
    Status,
    Alert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Default,
    /// Carries an action, fixed duration, ignores outside clicks.
    BreakInvite,
}

/// Action affordance attached to a bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BubbleAction {
    StartBreak { minutes: u32 },
}

/// A fully-resolved message ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub text: String,
    pub mood: Mood,
    pub priority: Priority,
    pub aria_role: AriaRole,
    pub kind: CandidateKind,
    #[serde(default)]
    pub duration_ms_override: Option<u64>,
    #[serde(default)]
    pub action: Option<BubbleAction>,
    /// Set on the once-per-tab contextual hint so showing it writes the
    /// tab marker to the durable store.
    #[serde(default)]
    pub contextual_hint: bool,
}

impl Candidate {
    /// A default-kind candidate. Urgent candidates and warnings announce as alerts.
    pub fn new(id: impl Into<String>, text: impl Into<String>, mood: Mood, priority: Priority) -> Self {
        let aria_role = if priority.is_urgent() || mood == Mood::Warning {
            AriaRole::Alert
        } else {
            AriaRole::Status
        };
        Self {
            id: id.into(),
            text: text.into(),
            mood,
            priority,
            aria_role,
            kind: CandidateKind::Default,
            duration_ms_override: None,
            action: None,
            contextual_hint: false,
        }
    }

    pub fn as_break_invite(mut self, duration_ms: u64, action: BubbleAction) -> Self {
        self.kind = CandidateKind::BreakInvite;
        self.duration_ms_override = Some(duration_ms);
        self.action = Some(action);
        self
    }

    pub fn as_contextual_hint(mut self) -> Self {
        self.contextual_hint = true;
        self
    }
}
