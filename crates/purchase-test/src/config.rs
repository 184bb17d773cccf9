//! Controller configuration.
//!
//! Validated at load time, with defaults for every field.

use std::time::Duration;

use purchase_core::SimulatedStoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TestError};

/// Test controller configuration.
///
/// ```toml
/// test_timeout = "5s"
///
/// [store]
/// decline_purchases = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// How long one test may run before it is recorded as failed.
    #[serde(default = "default_test_timeout")]
    #[serde(with = "humantime_serde")]
    pub test_timeout: Duration,

    /// Store the built-in suite runs against.
    #[serde(default)]
    pub store: SimulatedStoreConfig,
}

fn default_test_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            test_timeout: default_test_timeout(),
            store: SimulatedStoreConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Sets the per-test timeout.
    #[must_use]
    pub fn with_test_timeout(mut self, timeout: Duration) -> Self {
        self.test_timeout = timeout;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the timeout is zero or the store config is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.test_timeout.is_zero() {
            return Err(TestError::config("test_timeout must be greater than 0"));
        }
        self.store.validate()?;
        Ok(())
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    /// Returns an error if the document cannot be parsed or is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| TestError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns [`TestError::Io`] if the file cannot be read, or a
    /// configuration error if it cannot be parsed.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }
}

/// Serde helper for humantime durations.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.test_timeout, Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ControllerConfig::default().with_test_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_humantime_and_store() {
        let config = ControllerConfig::from_toml_str(
            r#"
            test_timeout = "250ms"

            [store]
            reject_receipts = true
            "#,
        )
        .unwrap();
        assert_eq!(config.test_timeout, Duration::from_millis(250));
        assert!(config.store.reject_receipts);
        assert!(!config.store.catalog.is_empty());
    }

    #[test]
    fn test_invalid_store_rejected() {
        let err = ControllerConfig::from_toml_str(
            r#"
            [store]
            owned = ["ghost"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, TestError::Purchase(_)));
    }

    #[test]
    fn test_bad_duration_rejected() {
        assert!(ControllerConfig::from_toml_str(r#"test_timeout = "soon""#).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ControllerConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(
            err,
            TestError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound
        ));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = ControllerConfig::default().with_test_timeout(Duration::from_secs(3));
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("test_timeout = \"3s\""));
        let parsed = ControllerConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.test_timeout, Duration::from_secs(3));
    }
}
