use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::LogConfig;
use crate::prediction::PredictionConfig;
use crate::statistics::StatisticsConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// General application settings
    pub settings: AppSettings,

    /// Prediction constants
    #[serde(default)]
    pub prediction: PredictionConfig,

    /// Statistics settings
    #[serde(default)]
    pub statistics: StatisticsConfig,

    /// Logging setup
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// JSON file holding the user's profile, cycles and activities
    pub data_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            settings: AppSettings::default(),
            prediction: PredictionConfig::default(),
            statistics: StatisticsConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            data_file: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("cyclefem")
                .join("records.json"),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cyclefem")
            .join("config.toml")
    }

    /// Load configuration from `path`, or defaults when it can't be read
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Ignoring unreadable config {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Read a setting by dotted key, e.g. `prediction.luteal_phase_days`
    pub fn get(&self, key: &str) -> Result<String> {
        let root = toml::Value::try_from(self).context("Failed to serialize configuration")?;

        let value = key
            .split('.')
            .try_fold(&root, |node, part| node.get(part))
            .with_context(|| format!("Unknown configuration key: {}", key))?;

        Ok(match value {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Set a setting by dotted key. The new value must parse as the type
    /// the key already holds.
    pub fn set(&mut self, key: &str, raw_value: &str) -> Result<()> {
        let mut root = toml::Value::try_from(&*self).context("Failed to serialize configuration")?;

        let slot = key
            .split('.')
            .try_fold(&mut root, |node, part| node.get_mut(part))
            .with_context(|| format!("Unknown configuration key: {}", key))?;

        let new_value = match slot {
            toml::Value::Integer(_) => toml::Value::Integer(
                raw_value
                    .parse()
                    .with_context(|| format!("{} expects an integer", key))?,
            ),
            toml::Value::Boolean(_) => toml::Value::Boolean(
                raw_value
                    .parse()
                    .with_context(|| format!("{} expects true or false", key))?,
            ),
            toml::Value::String(_) => toml::Value::String(raw_value.to_string()),
            _ => anyhow::bail!("{} cannot be set from the command line", key),
        };
        *slot = new_value;

        let updated: AppConfig = root
            .try_into()
            .with_context(|| format!("Invalid value for {}: {}", key, raw_value))?;
        *self = updated;
        self.metadata.updated_at = Utc::now();
        Ok(())
    }
}
