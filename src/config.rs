//! Configuration loading and management
//!
//! Handles parsing of `agenda.toml` in the data directory.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::validation::ValidationLimits;

/// Name of the configuration file inside the data directory
pub const CONFIG_FILE: &str = "agenda.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Reminder configuration
    #[serde(default)]
    pub reminders: RemindersConfig,

    /// Task rules configuration
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Which reminders are registered for a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindersConfig {
    /// Immediate "task scheduled" notice
    #[serde(default = "default_true")]
    pub confirmation: bool,

    /// Weekly reminder at the start time, per selected day
    #[serde(default = "default_true")]
    pub at_start: bool,

    /// Weekly reminder at the end time, per selected day
    #[serde(default = "default_true")]
    pub at_end: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            confirmation: true,
            at_start: true,
            at_end: true,
        }
    }
}

/// Limits applied when validating tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Shortest allowed task, in minutes
    #[serde(default = "default_min_duration_minutes")]
    pub min_duration_minutes: u32,

    /// Longest allowed title, in characters after trimming
    #[serde(default = "default_max_title_len")]
    pub max_title_len: usize,
}

fn default_min_duration_minutes() -> u32 {
    15
}

fn default_max_title_len() -> usize {
    100
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            min_duration_minutes: default_min_duration_minutes(),
            max_title_len: default_max_title_len(),
        }
    }
}

impl TasksConfig {
    pub fn limits(&self) -> ValidationLimits {
        ValidationLimits {
            max_title_len: self.max_title_len,
            min_duration_minutes: self.min_duration_minutes,
        }
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.min_duration_minutes == 0 || self.min_duration_minutes > 24 * 60 {
            return Err(crate::error::Error::InvalidConfig(
                "tasks.min_duration_minutes must be between 1 and 1440".to_string(),
            ));
        }
        if self.max_title_len == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "tasks.max_title_len must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `agenda.toml` from the data directory, or return defaults
    pub fn load_from_dir(data_dir: &Path) -> Self {
        let config_path = data_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> crate::error::Result<()> {
        self.tasks.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert!(cfg.reminders.confirmation);
        assert!(cfg.reminders.at_start);
        assert!(cfg.reminders.at_end);
        assert_eq!(cfg.tasks.min_duration_minutes, 15);
        assert_eq!(cfg.tasks.max_title_len, 100);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
[reminders]
confirmation = false
at_end = false

[tasks]
min_duration_minutes = 30
max_title_len = 40
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert!(!cfg.reminders.confirmation);
        assert!(cfg.reminders.at_start);
        assert!(!cfg.reminders.at_end);
        assert_eq!(cfg.tasks.min_duration_minutes, 30);
        assert_eq!(cfg.tasks.max_title_len, 40);

        let limits = cfg.tasks.limits();
        assert_eq!(limits.min_duration_minutes, 30);
        assert_eq!(limits.max_title_len, 40);
    }

    #[test]
    fn invalid_task_limits_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[tasks]\nmin_duration_minutes = 0").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            crate::error::Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn load_from_dir_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.tasks.min_duration_minutes, 15);
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        Config::default().save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("min_duration_minutes = 15"));
        assert!(written.contains("[reminders]"));
    }
}
