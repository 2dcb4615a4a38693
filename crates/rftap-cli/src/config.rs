//! Configuration system for the RFtap CLI.

use rftap_core::{EncapsulationConfig, FieldPolicy, LinkTypeSource};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// RFtap CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Encapsulation configuration
    #[serde(default)]
    pub encapsulation: EncapsulationConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Read a TOML configuration file
    ///
    /// # Errors
    ///
    /// Returns an error naming the path if the file cannot be read or is not
    /// a valid configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Write the configuration as TOML, creating missing directories
    ///
    /// # Errors
    ///
    /// Returns an error naming the path if it cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let text = toml::to_string_pretty(self)?;
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        fs::write(path, text).with_context(|| format!("Failed to write config {}", path.display()))
    }

    /// `rftap/config.toml` under the user config directory, or the working
    /// directory when there is none
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_default()
            .join("rftap")
            .join("config.toml")
    }

    /// Load config from the given path, or from the default path if it
    /// exists, or fall back to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if an existing config file cannot be read or parsed.
    pub fn resolve(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Replace the link type source, keeping the field policy
    pub fn set_source(&mut self, source: LinkTypeSource) {
        let policy = self.encapsulation.field_policy();
        self.encapsulation = EncapsulationConfig::new(source).with_field_policy(policy);
    }

    /// Replace the field policy, keeping the link type source
    pub fn set_field_policy(&mut self, policy: FieldPolicy) {
        self.encapsulation = self.encapsulation.clone().with_field_policy(policy);
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.encapsulation.validate()?;

        self.logging
            .level
            .parse::<tracing::Level>()
            .map_err(|_| anyhow::anyhow!("Invalid log level: {}", self.logging.level))?;

        Ok(())
    }
}
