//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Countdown duration
//! - Which feedback intervals are enabled
//! - Feedback channel preferences (haptics, mute, sound directory)
//! - Notification permission bookkeeping
//!
//! Configuration is stored at `~/.config/haptic-timer/config.toml`.
//! Timer state itself is never persisted.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::feedback::{DeviceChannels, PermissionGate, PermissionStatus};
use crate::interval::IntervalToggles;
use crate::liveness::fallback::DEFAULT_MAX_PENDING;
use crate::timer::TimerDuration;

/// Timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u32,
}

/// Feedback channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Use haptics when the device has them.
    #[serde(default = "default_true")]
    pub haptics: bool,
    /// Treat audio output as muted.
    #[serde(default)]
    pub muted: bool,
    /// Directory holding the tick WAV files.
    /// If set, a missing file makes audio feedback fail.
    #[serde(default)]
    pub sounds_dir: Option<String>,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub explanation_shown: bool,
    #[serde(default)]
    pub permission: PermissionStatus,
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/haptic-timer/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub intervals: IntervalToggles,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
fn default_duration_secs() -> u32 {
    60
}
fn default_true() -> bool {
    true
}
fn default_max_pending() -> usize {
    DEFAULT_MAX_PENDING
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration_secs(),
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            haptics: true,
            muted: false,
            sounds_dir: None,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            explanation_shown: false,
            permission: PermissionStatus::NotDetermined,
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

impl Config {
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
        if parts.peek().map_or(true, |p| p.is_empty()) {
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
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // optional fields: "none" clears them
                    serde_json::Value::Null | serde_json::Value::String(_)
                        if value.eq_ignore_ascii_case("none") =>
                    {
                        serde_json::Value::Null
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

    /// Load from disk, writing the default config if none exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        TimerDuration::new(u64::from(self.timer.duration_secs)).map_err(|e| {
            ConfigError::InvalidValue {
                key: "timer.duration_secs".into(),
                message: e.to_string(),
            }
        })?;
        if self.notifications.max_pending == 0 {
            return Err(ConfigError::InvalidValue {
                key: "notifications.max_pending".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
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

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// or fails validation. The config is left unchanged on error.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    pub fn duration(&self) -> TimerDuration {
        TimerDuration::new(u64::from(self.timer.duration_secs)).unwrap_or_default()
    }

    pub fn permission_gate(&self) -> PermissionGate {
        PermissionGate::new(
            self.notifications.permission,
            self.notifications.explanation_shown,
        )
    }

    /// Record the answered outcome of the permission flow.
    ///
    /// Returns true when anything that is persisted changed. A request the
    /// user never answered changes nothing, so it is asked again next time.
    pub fn record_permission(&mut self, gate: PermissionGate) -> bool {
        let changed = self.notifications.permission != gate.status()
            || self.notifications.explanation_shown != gate.explanation_shown();
        self.notifications.permission = gate.status();
        self.notifications.explanation_shown = gate.explanation_shown();
        changed
    }

    /// Apply the feedback and notification switches to the channels a
    /// device offers.
    pub fn filter_channels(&self, mut channels: DeviceChannels) -> DeviceChannels {
        if !self.feedback.haptics {
            channels.haptic = None;
        }
        if !self.notifications.enabled {
            channels.notifications = None;
        }
        channels
    }

    /// Every settable dot-separated key, sorted within each section.
    pub fn keys(&self) -> Vec<String> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<String>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (name, child) in map {
                        let key = if prefix.is_empty() {
                            name.clone()
                        } else {
                            format!("{prefix}.{name}")
                        };
                        walk(&key, child, out);
                    }
                }
                _ => out.push(prefix.to_string()),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }
}
