//! Runtime configuration (fixtura.toml)
//!
//! ```toml
//! resources_root = "src/test/resources"
//! provision_timeout_ms = 5000
//!
//! [random]
//! seed = 7
//! collection_size = { min = 1, max = 4 }
//! ```

use fixtura_core::RandomConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Fixture runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureConfig {
    /// Directory that resource paths are resolved against
    #[serde(default = "default_resources_root")]
    pub resources_root: PathBuf,

    /// How long a caller waits for a missing resource to be synthesized
    #[serde(default = "default_provision_timeout_ms")]
    pub provision_timeout_ms: u64,

    /// Random population settings for synthesized resources
    #[serde(default)]
    pub random: RandomConfig,
}

fn default_resources_root() -> PathBuf {
    PathBuf::from("src/test/resources")
}

fn default_provision_timeout_ms() -> u64 {
    5000
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            resources_root: default_resources_root(),
            provision_timeout_ms: default_provision_timeout_ms(),
            random: RandomConfig::default(),
        }
    }
}

impl FixtureConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: FixtureConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Provisioning timeout as a duration
    pub fn provision_timeout(&self) -> Duration {
        Duration::from_millis(self.provision_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.provision_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "provision_timeout_ms must be greater than zero".to_string(),
            ));
        }
        for (name, range) in [
            ("collection_size", self.random.collection_size),
            ("string_length", self.random.string_length),
        ] {
            if range.min > range.max {
                return Err(ConfigError::ValidationError(format!(
                    "random.{} has min {} greater than max {}",
                    name, range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixtura_core::SizeRange;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = FixtureConfig::from_toml_str("").unwrap();
        assert_eq!(config, FixtureConfig::default());
        assert_eq!(config.resources_root, PathBuf::from("src/test/resources"));
        assert_eq!(config.provision_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
resources_root = "fixtures"
provision_timeout_ms = 250

[random]
seed = 7
collection_size = { min = 2, max = 3 }
"#;

        let config = FixtureConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.resources_root, PathBuf::from("fixtures"));
        assert_eq!(config.provision_timeout_ms, 250);
        assert_eq!(config.random.seed, 7);
        assert_eq!(config.random.collection_size, SizeRange::new(2, 3));
        assert_eq!(config.random.string_length, RandomConfig::default().string_length);
    }

    #[test]
    fn test_reject_zero_timeout() {
        let err = FixtureConfig::from_toml_str("provision_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_reject_inverted_range() {
        let toml = "[random]\nstring_length = { min = 9, max = 3 }\n";
        let err = FixtureConfig::from_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("random.string_length"));
    }

    #[test]
    fn test_reject_malformed_toml() {
        let err = FixtureConfig::from_toml_str("resources_root = ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
