//! Harness configuration from `runlog.toml` and the environment.
//!
//! ```toml
//! [harness]
//! log_dir = "run_logs"
//! action_base_name = "trainable"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::HarnessError;

pub const CONFIG_FILE_NAME: &str = "runlog.toml";
pub const LOG_DIR_ENV: &str = "RUNLOG_LOG_DIR";
pub const DEFAULT_LOG_DIR: &str = "run_logs";
pub const DEFAULT_ACTION_BASE_NAME: &str = "trainable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Relative paths resolve against the working directory.
    pub log_dir: PathBuf,
    /// Registry name of the default user action.
    pub action_base_name: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            action_base_name: DEFAULT_ACTION_BASE_NAME.to_string(),
        }
    }
}

/// Top-level wrapper matching the TOML `[harness]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    harness: HarnessSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct HarnessSection {
    log_dir: Option<PathBuf>,
    action_base_name: Option<String>,
}

impl HarnessConfig {
    /// Parse TOML text; unset keys keep their defaults. `origin` is only
    /// used in error messages.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, HarnessError> {
        let file: ConfigFile = toml::from_str(text).map_err(|e| HarnessError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut config = HarnessConfig::default();
        if let Some(dir) = file.harness.log_dir {
            config.log_dir = dir;
        }
        if let Some(name) = file.harness.action_base_name {
            if name.is_empty() {
                return Err(HarnessError::Config {
                    path: origin.to_path_buf(),
                    message: "action_base_name cannot be empty".to_string(),
                });
            }
            config.action_base_name = name;
        }
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self, HarnessError> {
        let text = std::fs::read_to_string(path).map_err(|e| HarnessError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load `runlog.toml` from `dir` when present, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self, HarnessError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(LOG_DIR_ENV).filter(|v| !v.is_empty()) {
            self.log_dir = PathBuf::from(dir);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.log_dir, PathBuf::from("run_logs"));
        assert_eq!(config.action_base_name, "trainable");
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = HarnessConfig::from_toml_str(
            "[harness]\nlog_dir = \"logs/runs\"\n",
            Path::new("runlog.toml"),
        )
        .unwrap();
        assert_eq!(config.log_dir, PathBuf::from("logs/runs"));
        assert_eq!(config.action_base_name, "trainable");
    }

    #[test]
    fn empty_file_is_defaults() {
        let config = HarnessConfig::from_toml_str("", Path::new("runlog.toml")).unwrap();
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = HarnessConfig::from_toml_str(
            "[harness]\nlogdir = \"x\"\n",
            Path::new("runlog.toml"),
        )
        .unwrap_err();
        assert!(matches!(err, HarnessError::Config { .. }));
    }

    #[test]
    fn empty_base_name_is_rejected() {
        let err = HarnessConfig::from_toml_str(
            "[harness]\naction_base_name = \"\"\n",
            Path::new("runlog.toml"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("action_base_name"));
    }

    #[test]
    fn discover_reads_file_when_present() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(
            HarnessConfig::discover(tmp.path()).unwrap(),
            HarnessConfig::default()
        );
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "[harness]\naction_base_name = \"job\"\n",
        )
        .unwrap();
        let config = HarnessConfig::discover(tmp.path()).unwrap();
        assert_eq!(config.action_base_name, "job");
    }

    #[test]
    fn env_overrides_log_dir() {
        let config = HarnessConfig::default().with_env(|key| {
            (key == LOG_DIR_ENV).then(|| "/var/tmp/runs".to_string())
        });
        assert_eq!(config.log_dir, PathBuf::from("/var/tmp/runs"));

        let untouched = HarnessConfig::default().with_env(|_| Some(String::new()));
        assert_eq!(untouched.log_dir, PathBuf::from("run_logs"));
    }
}
