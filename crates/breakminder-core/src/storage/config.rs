//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Defaults applied to newly created reminders
//! - Activity detection toggle and tuning
//! - Notification delivery
//!
//! Configuration is stored at `~/.config/breakminder/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::activity::ActivityConfig;
use crate::error::{ConfigError, Result};

/// Values used when a new reminder does not specify its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderDefaults {
    #[serde(default = "default_interval_min")]
    pub interval_min: u64,
    /// `0` disables the ignore penalty.
    #[serde(default = "default_ignore_interval_min")]
    pub ignore_interval_min: u64,
    /// `0` never resets the penalty on its own.
    #[serde(default = "default_max_ignored")]
    pub max_ignored: u32,
    /// `0` means the first fire waits a full interval.
    #[serde(default)]
    pub start_override_min: u64,
}

/// Activity detection preference and tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySettings {
    /// Runs the global input hook while on.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_activity_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_window_size")]
    pub window_size: u32,
    #[serde(default = "default_hit_threshold")]
    pub hit_threshold: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Bring the main window forward when continuous activity is detected.
    #[serde(default = "default_true")]
    pub surface_on_activity: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breakminder/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: ReminderDefaults,
    #[serde(default)]
    pub activity: ActivitySettings,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_interval_min() -> u64 {
    30
}
fn default_ignore_interval_min() -> u64 {
    5
}
fn default_max_ignored() -> u32 {
    3
}
fn default_activity_interval_ms() -> u64 {
    ActivityConfig::default().interval_ms
}
fn default_window_size() -> u32 {
    ActivityConfig::default().window_size
}
fn default_hit_threshold() -> u32 {
    ActivityConfig::default().hit_threshold
}
fn default_true() -> bool {
    true
}

impl Default for ReminderDefaults {
    fn default() -> Self {
        Self {
            interval_min: default_interval_min(),
            ignore_interval_min: default_ignore_interval_min(),
            max_ignored: default_max_ignored(),
            start_override_min: 0,
        }
    }
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: default_activity_interval_ms(),
            window_size: default_window_size(),
            hit_threshold: default_hit_threshold(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            surface_on_activity: true,
        }
    }
}

impl ActivitySettings {
    pub fn detector_config(&self) -> ActivityConfig {
        ActivityConfig {
            interval_ms: self.interval_ms,
            window_size: self.window_size,
            hit_threshold: self.hit_threshold,
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
        key.split('.').try_fold(root, |current, part| current.get(part))
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

        let (parent, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        let mut current = root;
        if let Some(parent) = parent {
            for part in parent.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                let n = value
                    .parse::<u64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?;
                serde_json::Value::Number(n.into())
            }
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                return Err(invalid("only leaf values can be set".into()));
            }
            _ => serde_json::Value::String(value.into()),
        };
        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
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
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
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

    /// Update a value in memory by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        Ok(())
    }

    /// [`apply`](Config::apply) then save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.defaults.interval_min, 30);
        assert_eq!(parsed.activity.interval_ms, 4000);
        assert!(!parsed.activity.enabled);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[activity]\nenabled = true\n").unwrap();
        assert!(cfg.activity.enabled);
        assert_eq!(cfg.activity.hit_threshold, 6);
        assert_eq!(cfg.defaults.max_ignored, 3);
        assert!(cfg.notifications.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("activity.enabled").as_deref(), Some("false"));
        assert_eq!(cfg.get("defaults.interval_min").as_deref(), Some("30"));
        assert!(cfg.get("activity.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("activity.enabled", "true").unwrap();
        cfg.apply("defaults.ignore_interval_min", "0").unwrap();
        assert!(cfg.activity.enabled);
        assert_eq!(cfg.defaults.ignore_interval_min, 0);
    }

    #[test]
    fn apply_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("activity.nonexistent", "1"),
            Err(crate::CoreError::Config(ConfigError::UnknownKey(_)))
        ));
        assert!(matches!(
            cfg.apply("activity.enabled", "not_a_bool"),
            Err(crate::CoreError::Config(ConfigError::InvalidValue { .. }))
        ));
        assert!(cfg.apply("activity", "1").is_err());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.defaults.interval_min, 30);
        assert!(path.exists());

        let mut cfg = cfg;
        cfg.apply("defaults.interval_min", "45").unwrap();
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().defaults.interval_min, 45);
    }

    #[test]
    fn detector_config_mirrors_settings() {
        let mut cfg = Config::default();
        cfg.apply("activity.hit_threshold", "4").unwrap();
        let det = cfg.activity.detector_config();
        assert_eq!(det.hit_threshold, 4);
        assert_eq!(det.window_size, 10);
    }
}
