use rand::Rng;
use serde::{Deserialize, Serialize};

use super::TriggerContext;
use crate::candidate::{Candidate, Priority};
use crate::catalog::Mood;

/// Application-level events the companion listens to. The companion only
/// subscribes; it never publishes these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    TaskCompleted {
        #[serde(default)]
        title: Option<String>,
    },
    ExerciseCompleted,
    GoalCreated,
    ApplicationSent {
        #[serde(default)]
        company: Option<String>,
    },
    FocusSessionStarted,
    FocusSessionEnded {
        #[serde(default)]
        minutes: Option<u32>,
    },
    LevelUp {
        level: u32,
    },
    StreakMilestone {
        days: u32,
    },
    StreakBroken {
        days: u32,
    },
    DeadlineApproaching {
        title: String,
        days_left: u32,
    },
}

/// How an event maps onto the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRoute {
    pub mood: Mood,
    pub priority: Priority,
    pub vars: Vec<(&'static str, String)>,
    /// Chance of speaking at all, `None` for always.
    pub chance: Option<f64>,
}

impl EventRoute {
    fn new(mood: Mood, priority: Priority) -> Self {
        Self {
            mood,
            priority,
            vars: Vec::new(),
            chance: None,
        }
    }

    fn var(mut self, token: &'static str, value: impl ToString) -> Self {
        self.vars.push((token, value.to_string()));
        self
    }
}

impl AppEvent {
    pub fn route(&self, focus_start_probability: f64) -> EventRoute {
        match self {
            AppEvent::TaskCompleted { .. } => EventRoute::new(Mood::Celebrate, Priority::Normal),
            AppEvent::ExerciseCompleted => EventRoute::new(Mood::Celebrate, Priority::Normal),
            AppEvent::GoalCreated => EventRoute::new(Mood::Motivate, Priority::Low),
            AppEvent::ApplicationSent { .. } => EventRoute::new(Mood::Celebrate, Priority::Normal),
            AppEvent::FocusSessionStarted => EventRoute {
                chance: Some(focus_start_probability),
                ..EventRoute::new(Mood::Motivate, Priority::Low)
            },
            AppEvent::FocusSessionEnded { .. } => EventRoute::new(Mood::Celebrate, Priority::Normal),
            AppEvent::LevelUp { level } => {
                EventRoute::new(Mood::Celebrate, Priority::High).var("level", level)
            }
            AppEvent::StreakMilestone { days } => {
                EventRoute::new(Mood::Celebrate, Priority::High).var("days", days)
            }
            AppEvent::StreakBroken { days } => {
                EventRoute::new(Mood::Recovery, Priority::Normal).var("days", days)
            }
            AppEvent::DeadlineApproaching { title, days_left } => {
                EventRoute::new(Mood::Warning, Priority::Urgent)
                    .var("title", title)
                    .var("days", days_left)
            }
        }
    }
}

/// Maps app events to catalog lines.
#[derive(Debug, Clone)]
pub struct EventTrigger {
    focus_start_probability: f64,
}

impl EventTrigger {
    pub fn new(focus_start_probability: f64) -> Self {
        Self {
            focus_start_probability: focus_start_probability.clamp(0.0, 1.0),
        }
    }

    pub fn on_event(&self, event: &AppEvent, ctx: TriggerContext<'_>) -> Option<Candidate> {
        let route = event.route(self.focus_start_probability);
        if !ctx.gate_allows("event", route.priority) {
            return None;
        }
        if let Some(p) = route.chance {
            if !ctx.rng.gen_bool(p) {
                return None;
            }
        }
        ctx.catalog
            .select_line(route.mood, route.priority, &route.vars, ctx.seen, ctx.rng)
    }
}
