//! Domain snapshots the hint engine reads.
//!
//! Each collection is fetched independently by the host and may arrive late,
//! stale or empty. `None` means "not loaded yet" and is never treated as an
//! empty list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::LocalTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    #[serde(default)]
    pub exam_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayTask {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSession {
    pub started_at: LocalTime,
    pub duration_mins: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Applied,
    Interviewing,
    Offer,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    /// No follow-up makes sense once a process has ended.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Offer
                | ApplicationStatus::Accepted
                | ApplicationStatus::Rejected
                | ApplicationStatus::Withdrawn
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobApplication {
    pub company: String,
    pub status: ApplicationStatus,
    pub updated_at: LocalTime,
}

/// The four snapshots, each `None` until its fetch lands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintContext {
    #[serde(default)]
    pub courses: Option<Vec<Course>>,
    #[serde(default)]
    pub tasks: Option<Vec<TodayTask>>,
    #[serde(default)]
    pub sessions: Option<Vec<FocusSession>>,
    #[serde(default)]
    pub applications: Option<Vec<JobApplication>>,
}

impl HintContext {
    pub fn is_ready(&self) -> bool {
        self.courses.is_some()
            && self.tasks.is_some()
            && self.sessions.is_some()
            && self.applications.is_some()
    }

    /// Fold a fetch result in. Failures leave the slot unloaded.
    pub fn apply(&mut self, update: ContextUpdate) {
        match update {
            ContextUpdate::Courses(v) => self.courses = Some(v),
            ContextUpdate::Tasks(v) => self.tasks = Some(v),
            ContextUpdate::Sessions(v) => self.sessions = Some(v),
            ContextUpdate::Applications(v) => self.applications = Some(v),
            ContextUpdate::FetchFailed { source, reason } => {
                tracing::debug!(?source, %reason, "hint context fetch failed");
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    Courses,
    Tasks,
    Sessions,
    Applications,
}

/// A fetch completion delivered to the companion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ContextUpdate {
    Courses(Vec<Course>),
    Tasks(Vec<TodayTask>),
    Sessions(Vec<FocusSession>),
    Applications(Vec<JobApplication>),
    FetchFailed {
        source: ContextSource,
        reason: String,
    },
}

/// Which screen the user is on. Hints only evaluate on the daily overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    #[default]
    Overview,
    Other,
}
