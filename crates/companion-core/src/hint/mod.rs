//! Contextual hint engine.
//!
//! A pure function from the user's live data to at most one opportunistic
//! hint. Rules run top-down and the first match wins; inside a rule the first
//! qualifying course or application in input order wins. Day distances are
//! counted between local calendar dates, never raw timestamps.
//!
//! | rule | priority | condition |
//! |---|---|---|
//! | exam imminent | 0 | exam 0-2 days out |
//! | exam soon | 1 | exam 3-7 days out (warning if no focus in 2+ days) |
//! | exam early | 2 | exam 8-14 days out |
//! | afternoon slump | 3 | after 14:00, nothing done today, something open |
//! | stale application | 3 | open application untouched 14+ days |

pub mod context;

pub use context::{
    ApplicationStatus, ContextSource, ContextUpdate, Course, FocusSession, HintContext,
    JobApplication, Surface, TodayTask,
};

use chrono::{NaiveDate, Timelike};
use serde::Serialize;

use crate::candidate::{Candidate, Priority};
use crate::catalog::{has_unresolved_tokens, interpolate, Mood};
use crate::clock::LocalTime;

const AFTERNOON_HOUR: u32 = 14;
const SESSION_GAP_DAYS: i64 = 2;
const STALE_APPLICATION_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HintRule {
    ExamImminent,
    ExamSoon,
    ExamEarly,
    AfternoonSlump,
    StaleApplication,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hint {
    pub id: &'static str,
    pub rule: HintRule,
    pub text: String,
    pub mood: Mood,
    pub priority: Priority,
}

impl Hint {
    pub fn into_candidate(self) -> Candidate {
        Candidate::new(self.id, self.text, self.mood, self.priority).as_contextual_hint()
    }
}

/// Evaluate the rule ladder. `None` when nothing qualifies or the context
/// is not fully loaded.
pub fn evaluate(context: &HintContext, now: &LocalTime) -> Option<Hint> {
    let (Some(courses), Some(tasks), Some(sessions), Some(applications)) = (
        context.courses.as_deref(),
        context.tasks.as_deref(),
        context.sessions.as_deref(),
        context.applications.as_deref(),
    ) else {
        return None;
    };
    let today = now.date_naive();

    if let Some(hint) = exam_imminent(courses, today) {
        return Some(hint);
    }
    if let Some(hint) = exam_soon(courses, sessions, today, now) {
        return Some(hint);
    }
    if let Some(hint) = exam_early(courses, today) {
        return Some(hint);
    }
    if let Some(hint) = afternoon_slump(tasks, today, now) {
        return Some(hint);
    }
    stale_application(applications, today, now)
}

fn exam_in_range(courses: &[Course], today: NaiveDate, lo: i64, hi: i64) -> Option<(&Course, i64)> {
    courses.iter().find_map(|course| {
        let days = (course.exam_date? - today).num_days();
        (lo..=hi).contains(&days).then_some((course, days))
    })
}

fn exam_imminent(courses: &[Course], today: NaiveDate) -> Option<Hint> {
    let (course, days) = exam_in_range(courses, today, 0, 2)?;
    let (id, template) = match days {
        0 => ("hint-exam-today", "Your {course} exam is today. You've put in the work, go show it."),
        1 => ("hint-exam-tomorrow", "{course} exam is tomorrow. Light review tonight, then an early night."),
        _ => ("hint-exam-two-days", "{course} exam is in two days. Block out a focused review session."),
    };
    render(id, HintRule::ExamImminent, template, &[("course", course.name.clone())], Mood::Warning, Priority::Urgent)
}

fn exam_soon(
    courses: &[Course],
    sessions: &[FocusSession],
    today: NaiveDate,
    now: &LocalTime,
) -> Option<Hint> {
    let (course, days) = exam_in_range(courses, today, 3, 7)?;
    let last_session = sessions
        .iter()
        .map(|s| s.started_at.with_timezone(now.offset()).date_naive())
        .max();
    let vars = [("course", course.name.clone()), ("days", days.to_string())];

    match last_session.map(|d| (today - d).num_days()) {
        Some(gap) if gap < SESSION_GAP_DAYS => render(
            "hint-exam-steady",
            HintRule::ExamSoon,
            "{course} exam in {days} days and you've been putting in focus time. Keep that rhythm.",
            &vars,
            Mood::Motivate,
            Priority::High,
        ),
        Some(gap) => {
            let vars = [vars[0].clone(), vars[1].clone(), ("gap", gap.to_string())];
            render(
                "hint-exam-gap",
                HintRule::ExamSoon,
                "{course} exam is in {days} days and your last focus session was {gap} days ago. A short one today keeps it fresh.",
                &vars,
                Mood::Warning,
                Priority::High,
            )
        }
        None => render(
            "hint-exam-gap",
            HintRule::ExamSoon,
            "{course} exam is in {days} days and there's no focus session this week yet. A short one today helps.",
            &vars,
            Mood::Warning,
            Priority::High,
        ),
    }
}

fn exam_early(courses: &[Course], today: NaiveDate) -> Option<Hint> {
    let (course, days) = exam_in_range(courses, today, 8, 14)?;
    render(
        "hint-exam-early",
        HintRule::ExamEarly,
        "{course} exam is {days} days out. A little prep now beats cramming later.",
        &[("course", course.name.clone()), ("days", days.to_string())],
        Mood::Motivate,
        Priority::Normal,
    )
}

fn afternoon_slump(tasks: &[TodayTask], today: NaiveDate, now: &LocalTime) -> Option<Hint> {
    if now.hour() < AFTERNOON_HOUR {
        return None;
    }
    let todays = tasks.iter().filter(|t| t.date == today);
    let (done, open) = todays.fold((0usize, 0usize), |(done, open), t| {
        if t.completed {
            (done + 1, open)
        } else {
            (done, open + 1)
        }
    });
    if done > 0 || open == 0 {
        return None;
    }
    render(
        "hint-afternoon-slump",
        HintRule::AfternoonSlump,
        "Nothing ticked off yet and {open} still open. Pick the smallest one and give it five minutes.",
        &[("open", open.to_string())],
        Mood::Motivate,
        Priority::Low,
    )
}

fn stale_application(
    applications: &[JobApplication],
    today: NaiveDate,
    now: &LocalTime,
) -> Option<Hint> {
    applications.iter().find_map(|app| {
        if app.status.is_terminal() {
            return None;
        }
        let updated = app.updated_at.with_timezone(now.offset()).date_naive();
        let days = (today - updated).num_days();
        if days < STALE_APPLICATION_DAYS {
            return None;
        }
        render(
            "hint-stale-application",
            HintRule::StaleApplication,
            "No news from {company} in {days} days. A short follow-up email can move things along.",
            &[("company", app.company.clone()), ("days", days.to_string())],
            Mood::Motivate,
            Priority::Low,
        )
    })
}

fn render(
    id: &'static str,
    rule: HintRule,
    template: &str,
    vars: &[(&str, String)],
    mood: Mood,
    priority: Priority,
) -> Option<Hint> {
    let text = interpolate(template, vars);
    if has_unresolved_tokens(&text) {
        return None;
    }
    Some(Hint {
        id,
        rule,
        text,
        mood,
        priority,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    fn now() -> LocalTime {
        DateTime::parse_from_rfc3339("2026-06-01T10:00:00+02:00").unwrap()
    }

    fn today() -> NaiveDate {
        now().date_naive()
    }

    fn course(name: &str, days: i64) -> Course {
        Course {
            name: name.to_string(),
            exam_date: Some(today() + Duration::days(days)),
        }
    }

    fn session(days_ago: i64) -> FocusSession {
        FocusSession {
            started_at: now() - Duration::days(days_ago),
            duration_mins: 25,
        }
    }

    fn ready() -> HintContext {
        HintContext {
            courses: Some(Vec::new()),
            tasks: Some(Vec::new()),
            sessions: Some(Vec::new()),
            applications: Some(Vec::new()),
        }
    }

    #[test]
    fn exam_tomorrow_is_urgent() {
        let mut ctx = ready();
        ctx.courses = Some(vec![course("Algebra II", 1)]);
        let hint = evaluate(&ctx, &now()).unwrap();
        assert_eq!(hint.priority, Priority::Urgent);
        assert_eq!(hint.rule, HintRule::ExamImminent);
        assert!(hint.text.contains("tomorrow"));
        assert!(hint.text.contains("Algebra II"));
    }

    #[test]
    fn exam_today_and_in_two_days() {
        let mut ctx = ready();
        ctx.courses = Some(vec![course("Chem", 0)]);
        assert!(evaluate(&ctx, &now()).unwrap().text.contains("today"));
        ctx.courses = Some(vec![course("Chem", 2)]);
        assert!(evaluate(&ctx, &now()).unwrap().text.contains("two days"));
    }

    #[test]
    fn day_distance_uses_local_midnight() {
        // 23:30 local: the exam tomorrow is one calendar day away even
        // though it's only half an hour until midnight.
        let late = DateTime::parse_from_rfc3339("2026-06-01T23:30:00+02:00").unwrap();
        let mut ctx = ready();
        ctx.courses = Some(vec![Course {
            name: "Bio".into(),
            exam_date: NaiveDate::from_ymd_opt(2026, 6, 2),
        }]);
        assert!(evaluate(&ctx, &late).unwrap().text.contains("tomorrow"));
    }

    #[test]
    fn past_exams_are_ignored() {
        let mut ctx = ready();
        ctx.courses = Some(vec![course("Old", -1)]);
        assert!(evaluate(&ctx, &now()).is_none());
    }

    #[test]
    fn exam_soon_mood_depends_on_recent_focus() {
        let mut ctx = ready();
        ctx.courses = Some(vec![course("Physics", 5)]);

        ctx.sessions = Some(vec![session(1), session(4)]);
        let steady = evaluate(&ctx, &now()).unwrap();
        assert_eq!(steady.priority, Priority::High);
        assert_eq!(steady.mood, Mood::Motivate);

        ctx.sessions = Some(vec![session(3)]);
        let gap = evaluate(&ctx, &now()).unwrap();
        assert_eq!(gap.priority, Priority::High);
        assert_eq!(gap.mood, Mood::Warning);
        assert!(gap.text.contains("3 days ago"));

        ctx.sessions = Some(Vec::new());
        assert_eq!(evaluate(&ctx, &now()).unwrap().mood, Mood::Warning);
    }

    #[test]
    fn first_tier_beats_input_order() {
        let mut ctx = ready();
        ctx.courses = Some(vec![course("Later", 10), course("Soon", 4), course("Now", 2)]);
        let hint = evaluate(&ctx, &now()).unwrap();
        assert_eq!(hint.rule, HintRule::ExamImminent);
        assert!(hint.text.contains("Now"));
    }

    #[test]
    fn first_match_within_tier_wins() {
        let mut ctx = ready();
        ctx.courses = Some(vec![course("First", 12), course("Closer", 8)]);
        let hint = evaluate(&ctx, &now()).unwrap();
        assert_eq!(hint.rule, HintRule::ExamEarly);
        assert!(hint.text.contains("First"));
        assert!(hint.text.contains("12 days"));
    }

    #[test]
    fn afternoon_slump_needs_open_and_nothing_done() {
        let afternoon = DateTime::parse_from_rfc3339("2026-06-01T14:05:00+02:00").unwrap();
        let task = |completed| TodayTask {
            title: "Essay".into(),
            completed,
            date: today(),
        };
        let mut ctx = ready();

        ctx.tasks = Some(vec![task(false), task(false)]);
        assert!(evaluate(&ctx, &now()).is_none());
        let hint = evaluate(&ctx, &afternoon).unwrap();
        assert_eq!(hint.rule, HintRule::AfternoonSlump);
        assert_eq!(hint.priority, Priority::Low);
        assert!(hint.text.contains("2 still open"));

        ctx.tasks = Some(vec![task(true), task(false)]);
        assert!(evaluate(&ctx, &afternoon).is_none());

        ctx.tasks = Some(Vec::new());
        assert!(evaluate(&ctx, &afternoon).is_none());
    }

    #[test]
    fn afternoon_slump_shadows_stale_application() {
        let afternoon = DateTime::parse_from_rfc3339("2026-06-01T15:00:00+02:00").unwrap();
        let mut ctx = ready();
        ctx.tasks = Some(vec![TodayTask {
            title: "Read".into(),
            completed: false,
            date: today(),
        }]);
        ctx.applications = Some(vec![JobApplication {
            company: "Acme".into(),
            status: ApplicationStatus::Applied,
            updated_at: now() - Duration::days(30),
        }]);
        assert_eq!(evaluate(&ctx, &afternoon).unwrap().rule, HintRule::AfternoonSlump);
        assert_eq!(evaluate(&ctx, &now()).unwrap().rule, HintRule::StaleApplication);
    }

    #[test]
    fn stale_application_skips_terminal_and_recent() {
        let app = |company: &str, status, days| JobApplication {
            company: company.into(),
            status,
            updated_at: now() - Duration::days(days),
        };
        let mut ctx = ready();
        ctx.applications = Some(vec![
            app("Closed", ApplicationStatus::Rejected, 40),
            app("Fresh", ApplicationStatus::Interviewing, 13),
            app("Quiet", ApplicationStatus::Applied, 14),
            app("Quieter", ApplicationStatus::Applied, 50),
        ]);
        let hint = evaluate(&ctx, &now()).unwrap();
        assert!(hint.text.contains("Quiet in 14 days"));
        assert_eq!(hint.priority, Priority::Low);
    }

    #[test]
    fn unloaded_context_defers() {
        let mut ctx = ready();
        ctx.courses = Some(vec![course("Algebra II", 1)]);
        ctx.sessions = None;
        assert!(evaluate(&ctx, &now()).is_none());
    }

    #[test]
    fn nothing_matches_means_silence() {
        assert!(evaluate(&ready(), &now()).is_none());
    }

    #[test]
    fn hint_candidate_is_flagged() {
        let mut ctx = ready();
        ctx.courses = Some(vec![course("Algebra II", 1)]);
        let candidate = evaluate(&ctx, &now()).unwrap().into_candidate();
        assert!(candidate.contextual_hint);
        assert_eq!(candidate.id, "hint-exam-tomorrow");
    }
}
