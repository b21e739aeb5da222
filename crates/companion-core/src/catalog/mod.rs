//! Message catalog and line selection.
//!
//! Lines are grouped by [`Mood`] and carry stable ids. Templates may contain
//! `{token}` placeholders; a line whose template still has an unfilled token
//! after interpolation is never offered. Selection excludes ids already
//! shown in this tab, so a mood can run dry: that is expected and callers
//! treat `None` as "say nothing".

mod lines;

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, Priority};

/// Coarse emotional register used to pick catalog lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Motivate,
    Celebrate,
    Warning,
    Recovery,
    Idle,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Motivate,
        Mood::Celebrate,
        Mood::Warning,
        Mood::Recovery,
        Mood::Idle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Motivate => "motivate",
            Mood::Celebrate => "celebrate",
            Mood::Warning => "warning",
            Mood::Recovery => "recovery",
            Mood::Idle => "idle",
        }
    }
}

impl std::str::FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown mood: {s}"))
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageLine {
    pub id: &'static str,
    pub mood: Mood,
    pub template: &'static str,
}

/// Substitution variables, `(token, value)` pairs.
pub type Vars<'a> = [(&'a str, String)];

/// Immutable, process-wide set of lines.
#[derive(Debug, Clone)]
pub struct Catalog {
    lines: Vec<MessageLine>,
    break_invites: Vec<MessageLine>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The shipped catalog.
    pub fn builtin() -> Self {
        Self {
            lines: lines::BUBBLE_LINES.to_vec(),
            break_invites: lines::BREAK_INVITE_LINES.to_vec(),
        }
    }

    /// Build a catalog from explicit tables.
    pub fn from_lines(lines: Vec<MessageLine>, break_invites: Vec<MessageLine>) -> Self {
        Self {
            lines,
            break_invites,
        }
    }

    pub fn lines(&self) -> &[MessageLine] {
        &self.lines
    }

    pub fn lines_for(&self, mood: Mood) -> impl Iterator<Item = &MessageLine> {
        self.lines.iter().filter(move |l| l.mood == mood)
    }

    pub fn break_invites(&self) -> &[MessageLine] {
        &self.break_invites
    }

    /// Pick an unseen, fully-rendered line of `mood` uniformly at random.
    pub fn select_line(
        &self,
        mood: Mood,
        priority: Priority,
        vars: &Vars<'_>,
        seen: &HashSet<String>,
        rng: &mut dyn RngCore,
    ) -> Option<Candidate> {
        let pool = self.lines.iter().filter(|l| l.mood == mood);
        pick(pool, vars, seen, rng).map(|(id, text)| Candidate::new(id, text, mood, priority))
    }

    /// Pick an unseen break-invite line. The caller decorates it as a
    /// break-invite candidate.
    pub fn select_break_invite(
        &self,
        vars: &Vars<'_>,
        seen: &HashSet<String>,
        rng: &mut dyn RngCore,
    ) -> Option<(String, String)> {
        pick(self.break_invites.iter(), vars, seen, rng)
    }
}

fn pick<'a>(
    pool: impl Iterator<Item = &'a MessageLine>,
    vars: &Vars<'_>,
    seen: &HashSet<String>,
    rng: &mut dyn RngCore,
) -> Option<(String, String)> {
    let survivors: Vec<(&'static str, String)> = pool
        .filter(|l| !seen.contains(l.id))
        .map(|l| (l.id, interpolate(l.template, vars)))
        .filter(|(_, text)| !has_unresolved_tokens(text))
        .collect();

    survivors
        .choose(rng)
        .map(|(id, text)| (id.to_string(), text.clone()))
}

/// Replace every `{token}` that has a value in `vars`. Unknown tokens stay.
pub fn interpolate(template: &str, vars: &Vars<'_>) -> String {
    let mut out = template.to_string();
    for (token, value) in vars {
        out = out.replace(&format!("{{{token}}}"), value);
    }
    out
}

/// True if `text` still contains a `{identifier}` placeholder.
pub fn has_unresolved_tokens(text: &str) -> bool {
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                if !name.is_empty()
                    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return true;
                }
                rest = &after[close + 1..];
            }
            None => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn rng() -> Pcg64 {
        Pcg64::seed_from_u64(7)
    }

    #[test]
    fn builtin_ids_are_unique() {
        let catalog = Catalog::builtin();
        let mut ids = HashSet::new();
        for line in catalog.lines().iter().chain(catalog.break_invites()) {
            assert!(ids.insert(line.id), "duplicate id {}", line.id);
        }
    }

    #[test]
    fn every_mood_has_lines() {
        let catalog = Catalog::builtin();
        for mood in Mood::ALL {
            assert!(catalog.lines_for(mood).count() >= 3, "{mood:?} is thin");
        }
    }

    #[test]
    fn interpolate_fills_known_tokens() {
        let text = interpolate("Day {days} of {what}", &[("days", "3".to_string())]);
        assert_eq!(text, "Day 3 of {what}");
        assert!(has_unresolved_tokens(&text));
    }

    #[test]
    fn braces_without_identifier_are_not_tokens() {
        assert!(!has_unresolved_tokens("a {} b"));
        assert!(!has_unresolved_tokens("a { b"));
        assert!(!has_unresolved_tokens("{not a token}"));
        assert!(has_unresolved_tokens("left {over_1}"));
    }

    #[test]
    fn select_line_skips_seen_and_unresolved() {
        let catalog = Catalog::from_lines(
            vec![
                MessageLine { id: "a", mood: Mood::Celebrate, template: "Nice!" },
                MessageLine { id: "b", mood: Mood::Celebrate, template: "{days} days!" },
                MessageLine { id: "c", mood: Mood::Idle, template: "Hm." },
            ],
            Vec::new(),
        );
        let mut rng = rng();

        let first = catalog
            .select_line(Mood::Celebrate, Priority::Normal, &[], &HashSet::new(), &mut rng)
            .unwrap();
        assert_eq!(first.id, "a");

        let seen: HashSet<String> = ["a".to_string()].into();
        assert!(catalog
            .select_line(Mood::Celebrate, Priority::Normal, &[], &seen, &mut rng)
            .is_none());

        let with_days = catalog
            .select_line(
                Mood::Celebrate,
                Priority::Normal,
                &[("days", "5".to_string())],
                &seen,
                &mut rng,
            )
            .unwrap();
        assert_eq!(with_days.text, "5 days!");
        assert_eq!(with_days.priority, Priority::Normal);
    }

    #[test]
    fn mood_runs_dry_instead_of_repeating() {
        let catalog = Catalog::builtin();
        let mut rng = rng();
        let mut seen = HashSet::new();
        while let Some(c) =
            catalog.select_line(Mood::Idle, Priority::Low, &[], &seen, &mut rng)
        {
            assert!(seen.insert(c.id));
        }
        assert_eq!(seen.len(), catalog.lines_for(Mood::Idle).count());
    }

    #[test]
    fn mood_parses_case_insensitively() {
        assert_eq!("Recovery".parse::<Mood>().unwrap(), Mood::Recovery);
        assert!("grumpy".parse::<Mood>().is_err());
    }
}
