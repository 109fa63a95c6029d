//! Configuration management for rotolog

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::LogError;
use crate::logging::DEFAULT_BUFFER_CAPACITY;

/// Logger configuration, usually read from a `[log]`-style TOML file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Threshold level: "ERROR", "WARN", "INFO" (default) or "DEBUG"
    #[serde(default = "default_level")]
    pub level: String,

    /// Base directory; files go to `{base_path}/log/`. Supports `~` and `$VAR`.
    /// Without it (or without `filename_prefix`) output goes to stderr.
    #[serde(default)]
    pub base_path: Option<String>,

    /// File name prefix, e.g. "svc" for `svc.log` / `svc-2024-05-01.log`
    #[serde(default)]
    pub filename_prefix: Option<String>,

    /// Rotation cycle: "D" (default), "H", "M" or "NONE"
    #[serde(default = "default_rotate_cycle")]
    pub rotate_cycle: String,

    /// Buffer records in memory and write them in batches
    #[serde(default)]
    pub cache: bool,

    /// Buffered bytes that force a flush (default: 64 KiB)
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

fn default_level() -> String {
    "INFO".to_string()
}

fn default_rotate_cycle() -> String {
    "D".to_string()
}

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            base_path: None,
            filename_prefix: None,
            rotate_cycle: default_rotate_cycle(),
            cache: false,
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

impl LoggerConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse logger config")
    }

    /// Load configuration from file, or return default if not found
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read logger config")?;
            Self::from_toml_str(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize logger config")?;
        std::fs::write(path, content).context("Failed to write logger config")?;
        Ok(())
    }

    /// Expanded base path and prefix, when both are set
    pub fn location(&self) -> Option<crate::Result<(PathBuf, String)>> {
        let base = self.base_path.as_deref()?;
        let prefix = self.filename_prefix.clone()?;
        Some(expand_base_path(base).map(|path| (path, prefix)))
    }
}

/// Expand `~` and environment variables in a configured base path
pub fn expand_base_path(raw: &str) -> crate::Result<PathBuf> {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.into_owned()))
        .map_err(|e| LogError::InvalidArgument(format!("cannot expand base path '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, "INFO");
        assert_eq!(config.rotate_cycle, "D");
        assert!(!config.cache);
        assert!(config.location().is_none());
        assert_eq!(config.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = LoggerConfig::from_toml_str(
            r#"
            base_path = "/tmp/app"
            filename_prefix = "svc"
            cache = true
            "#,
        )
        .unwrap();
        assert_eq!(config.level, "INFO");
        assert_eq!(config.rotate_cycle, "D");
        assert!(config.cache);

        let (path, prefix) = config.location().unwrap().unwrap();
        assert_eq!(path, PathBuf::from("/tmp/app"));
        assert_eq!(prefix, "svc");
    }

    #[test]
    fn test_location_requires_both_parts() {
        let config = LoggerConfig {
            base_path: Some("/tmp/app".into()),
            ..LoggerConfig::default()
        };
        assert!(config.location().is_none());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(LoggerConfig::from_toml_str("cache = \"maybe\"").is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = LoggerConfig {
            level: "DEBUG".into(),
            rotate_cycle: "H".into(),
            ..LoggerConfig::default()
        };
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: LoggerConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = LoggerConfig::load(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, LoggerConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.toml");
        let config = LoggerConfig {
            base_path: Some("/srv/app".into()),
            filename_prefix: Some("api".into()),
            cache: true,
            ..LoggerConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(LoggerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_expand_base_path_env_var() {
        std::env::set_var("ROTOLOG_TEST_BASE", "/var/lib/rotolog");
        let path = expand_base_path("$ROTOLOG_TEST_BASE/app").unwrap();
        assert_eq!(path, PathBuf::from("/var/lib/rotolog/app"));
    }

    #[test]
    fn test_expand_base_path_unknown_var_is_invalid() {
        let err = expand_base_path("$ROTOLOG_TEST_SURELY_UNSET_VAR/app").unwrap_err();
        assert!(matches!(err, LogError::InvalidArgument(_)));
    }
}
