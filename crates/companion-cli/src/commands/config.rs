use clap::Subcommand;
use companion_core::{CompanionConfig, ConfigError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting
    Get {
        /// Dot-separated key (e.g. "gate.cooldown_mins", "display.queue_capacity")
        key: String,
    },
    /// Change one setting and save
    Set {
        key: String,
        value: String,
    },
    /// Print every setting as `key = value`
    List {
        /// Print the whole config as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Restore one setting, or all of them, to the built-in default
    Reset {
        key: Option<String>,
    },
    /// Print the config file location
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = CompanionConfig::load()?;
            println!("{}", lookup(&config, &key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = CompanionConfig::load()?;
            let before = lookup(&config, &key)?;
            config.set(&key, &value)?;
            println!("{key} = {} (was {before})", lookup(&config, &key)?);
        }
        ConfigAction::List { json } => {
            let config = CompanionConfig::load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                for (key, value) in config.entries() {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Reset { key: None } => {
            CompanionConfig::default().save()?;
            println!("all settings restored to defaults");
        }
        ConfigAction::Reset { key: Some(key) } => {
            let default = lookup(&CompanionConfig::default(), &key)?;
            let mut config = CompanionConfig::load()?;
            config.set(&key, &default)?;
            println!("{key} = {default}");
        }
        ConfigAction::Path => {
            println!("{}", CompanionConfig::path()?.display());
        }
    }
    Ok(())
}

fn lookup(config: &CompanionConfig, key: &str) -> Result<String, ConfigError> {
    config
        .get(key)
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
}
