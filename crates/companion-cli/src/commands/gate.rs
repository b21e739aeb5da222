use clap::Subcommand;
use companion_core::{Gate, SqliteStore};
use serde_json::json;

#[derive(Subcommand)]
pub enum GateAction {
    /// Print mute flags and cooldown as JSON
    Status,
    /// Mute for the rest of today
    MuteToday,
    /// Mute until unmuted
    Mute,
    /// Clear both mute flags
    Unmute,
}

pub fn run(action: GateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = companion_core::CompanionConfig::load_or_default();
    let store = SqliteStore::open()?;
    let mut gate = Gate::load(&store, config.gate.cooldown_ms());
    let now = chrono::Local::now().fixed_offset();

    match action {
        GateAction::Status => {
            let status = json!({
                "muted": gate.is_muted(&now),
                "permanently_muted": gate.permanently_muted(),
                "muted_for_date": gate.muted_for_date(),
                "last_shown_at_ms": gate.last_shown_at_ms(),
                "cooldown_remaining_ms": gate.cooldown_remaining_ms(&now),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        GateAction::MuteToday => {
            gate.mute_today(&now, &store);
            println!("muted for {}", now.date_naive());
        }
        GateAction::Mute => {
            gate.mute_forever(&store);
            println!("muted");
        }
        GateAction::Unmute => {
            gate.unmute(&store);
            println!("unmuted");
        }
    }
    Ok(())
}
