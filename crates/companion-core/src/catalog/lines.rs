use super::{MessageLine, Mood};

const fn line(id: &'static str, mood: Mood, template: &'static str) -> MessageLine {
    MessageLine { id, mood, template }
}

pub(super) const BUBBLE_LINES: &[MessageLine] = &[
    // Motivate
    line("mot-01", Mood::Motivate, "Small steps still move you forward."),
    line("mot-02", Mood::Motivate, "Pick one thing. Just one. Start there."),
    line("mot-03", Mood::Motivate, "You showed up. That is the hardest part."),
    line("mot-04", Mood::Motivate, "Ten focused minutes beat an hour of worrying."),
    line("mot-05", Mood::Motivate, "New goal on the board. Future you says thanks."),
    line("mot-06", Mood::Motivate, "Phone face down, one tab open, let's go."),
    line("mot-07", Mood::Motivate, "Progress over perfection today."),
    // Celebrate
    line("cel-01", Mood::Celebrate, "Done! That one is off your plate."),
    line("cel-02", Mood::Celebrate, "Nice work. Take a second to enjoy that."),
    line("cel-03", Mood::Celebrate, "Another one down. You're on a roll."),
    line("cel-04", Mood::Celebrate, "{days} days in a row. That's a real habit now."),
    line("cel-05", Mood::Celebrate, "A {days}-day streak! Keep the chain going."),
    line("cel-06", Mood::Celebrate, "Level {level}! All those sessions add up."),
    line("cel-07", Mood::Celebrate, "Application sent. Fortune favours the bold."),
    line("cel-08", Mood::Celebrate, "Session complete. Your focus is getting sharper."),
    // Warning
    line("warn-01", Mood::Warning, "\"{title}\" is due in {days} days. Time to plan it in."),
    line("warn-02", Mood::Warning, "Heads up: \"{title}\" is coming up fast."),
    line("warn-03", Mood::Warning, "{days} days left on \"{title}\". A small start today helps."),
    line("warn-04", Mood::Warning, "A deadline is getting close. Check your list?"),
    // Recovery
    line("rec-01", Mood::Recovery, "Welcome back. No pressure, just pick up where you left off."),
    line("rec-02", Mood::Recovery, "Streaks break. Starting again is what counts."),
    line("rec-03", Mood::Recovery, "The {days}-day streak ended, but the skills stayed."),
    line("rec-04", Mood::Recovery, "Good to see you again. Want to ease in with something small?"),
    line("rec-05", Mood::Recovery, "Fresh start. Yesterday doesn't get a vote."),
    // Idle
    line("idle-01", Mood::Idle, "Still here if you need me."),
    line("idle-02", Mood::Idle, "Water break? Your brain is mostly water."),
    line("idle-03", Mood::Idle, "Quick posture check."),
    line("idle-04", Mood::Idle, "Look away from the screen for twenty seconds."),
    line("idle-05", Mood::Idle, "How is the day going so far?"),
    line("idle-06", Mood::Idle, "Remember to breathe out, too."),
];

pub(super) const BREAK_INVITE_LINES: &[MessageLine] = &[
    line("break-01", Mood::Idle, "You've been still for a while. Five-minute stretch?"),
    line("break-02", Mood::Idle, "Quiet stretch of time. Want to take a short break?"),
    line("break-03", Mood::Idle, "Time to stand up and move for a few minutes?"),
];
