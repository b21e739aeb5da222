//! TOML-based companion configuration.
//!
//! Stores the tunables of the bubble scheduler:
//! - Display slot sizing and dismiss durations
//! - Gate cooldown window
//! - Ambient ticker, break invite and welcome-back thresholds
//! - Event trigger probabilities
//!
//! Configuration is stored at `~/.config/companion/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Display slot and dismiss timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_exit_transition_ms")]
    pub exit_transition_ms: u64,
    #[serde(default = "default_short_text_chars")]
    pub short_text_chars: usize,
    #[serde(default = "default_medium_text_chars")]
    pub medium_text_chars: usize,
    #[serde(default = "default_short_ms")]
    pub short_ms: u64,
    #[serde(default = "default_medium_ms")]
    pub medium_ms: u64,
    #[serde(default = "default_long_ms")]
    pub long_ms: u64,
}

/// Global cooldown configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_cooldown_mins")]
    pub cooldown_mins: u64,
}

/// Ambient idle ticker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbientConfig {
    #[serde(default = "default_ambient_interval_mins")]
    pub interval_mins: u64,
}

/// Inactivity break invite configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakInviteConfig {
    #[serde(default = "default_idle_mins")]
    pub idle_mins: u64,
    #[serde(default = "default_break_cooldown_mins")]
    pub cooldown_mins: u64,
    #[serde(default = "default_break_duration_secs")]
    pub duration_secs: u64,
    /// How often the runtime checks the inactivity clock.
    #[serde(default = "default_break_poll_secs")]
    pub poll_secs: u64,
}

/// Returning-user check-in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeBackConfig {
    #[serde(default = "default_away_mins")]
    pub away_mins: u64,
}

/// App event trigger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_focus_start_probability")]
    pub focus_start_probability: f64,
}

/// Companion configuration.
///
/// Serialized to/from TOML at `~/.config/companion/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub ambient: AmbientConfig,
    #[serde(default)]
    pub break_invite: BreakInviteConfig,
    #[serde(default)]
    pub welcome_back: WelcomeBackConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_queue_capacity() -> usize {
    2
}
fn default_exit_transition_ms() -> u64 {
    220
}
fn default_short_text_chars() -> usize {
    40
}
fn default_medium_text_chars() -> usize {
    80
}
fn default_short_ms() -> u64 {
    4_000
}
fn default_medium_ms() -> u64 {
    6_000
}
fn default_long_ms() -> u64 {
    8_000
}
fn default_cooldown_mins() -> u64 {
    8
}
fn default_ambient_interval_mins() -> u64 {
    45
}
fn default_idle_mins() -> u64 {
    7
}
fn default_break_cooldown_mins() -> u64 {
    30
}
fn default_break_duration_secs() -> u64 {
    15
}
fn default_break_poll_secs() -> u64 {
    30
}
fn default_away_mins() -> u64 {
    30
}
fn default_focus_start_probability() -> f64 {
    0.4
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            exit_transition_ms: default_exit_transition_ms(),
            short_text_chars: default_short_text_chars(),
            medium_text_chars: default_medium_text_chars(),
            short_ms: default_short_ms(),
            medium_ms: default_medium_ms(),
            long_ms: default_long_ms(),
        }
    }
}

const SECOND_MS: u64 = 1000;
const MINUTE_MS: u64 = 60 * SECOND_MS;

// Millisecond views of the user-editable durations. Saturating, since any
// u64 is accepted by `config set`.

impl GateConfig {
    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown_mins.saturating_mul(MINUTE_MS)
    }
}

impl AmbientConfig {
    pub fn interval_ms(&self) -> u64 {
        self.interval_mins.saturating_mul(MINUTE_MS)
    }
}

impl BreakInviteConfig {
    pub fn idle_ms(&self) -> u64 {
        self.idle_mins.saturating_mul(MINUTE_MS)
    }

    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown_mins.saturating_mul(MINUTE_MS)
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_secs.saturating_mul(SECOND_MS)
    }

    pub fn poll_ms(&self) -> u64 {
        self.poll_secs.saturating_mul(SECOND_MS)
    }
}

impl WelcomeBackConfig {
    pub fn away_ms(&self) -> u64 {
        self.away_mins.saturating_mul(MINUTE_MS)
    }
}

impl DisplayConfig {
    /// Dismiss duration derived from text length.
    pub fn duration_for(&self, text: &str) -> u64 {
        let chars = text.chars().count();
        if chars <= self.short_text_chars {
            self.short_ms
        } else if chars <= self.medium_text_chars {
            self.medium_ms
        } else {
            self.long_ms
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            cooldown_mins: default_cooldown_mins(),
        }
    }
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            interval_mins: default_ambient_interval_mins(),
        }
    }
}

impl Default for BreakInviteConfig {
    fn default() -> Self {
        Self {
            idle_mins: default_idle_mins(),
            cooldown_mins: default_break_cooldown_mins(),
            duration_secs: default_break_duration_secs(),
            poll_secs: default_break_poll_secs(),
        }
    }
}

impl Default for WelcomeBackConfig {
    fn default() -> Self {
        Self {
            away_mins: default_away_mins(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            focus_start_probability: default_focus_start_probability(),
        }
    }
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            display: DisplayConfig::default(),
            gate: GateConfig::default(),
            ambient: AmbientConfig::default(),
            break_invite: BreakInviteConfig::default(),
            welcome_back: WelcomeBackConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

impl CompanionConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map(|p| p.is_empty()).unwrap_or(true) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content).map_err(|e| match e {
                ConfigError::InvalidValue { message, .. } => ConfigError::LoadFailed {
                    path: path.clone(),
                    message,
                },
                other => other,
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Parse a TOML document, filling missing keys with defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidValue {
            key: String::new(),
            message: e.to_string(),
        })
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Cross-field checks the type system can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };
        if !(0.0..=1.0).contains(&self.events.focus_start_probability) {
            return Err(invalid(
                "events.focus_start_probability",
                "must be between 0 and 1",
            ));
        }
        if self.display.short_text_chars > self.display.medium_text_chars {
            return Err(invalid(
                "display.short_text_chars",
                "must not exceed display.medium_text_chars",
            ));
        }
        if self.break_invite.poll_secs == 0 {
            return Err(invalid("break_invite.poll_secs", "must be at least 1"));
        }
        Ok(())
    }

    /// Every leaf setting as `(dot.key, value)`, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out.sort();
        out
    }

    /// Set a config value by key and save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
