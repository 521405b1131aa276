//! Client configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::units::LengthUnit;

/// Default API host
pub const DEFAULT_BASE_URL: &str = "https://cad.onshape.com";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors loading configuration
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Connection settings for [`crate::OnshapeClient`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnshapeConfig {
    /// API host, without trailing slash
    pub base_url: String,
    /// API access key (sent as basic credentials)
    pub access_key: Option<String>,
    /// API secret key
    pub secret_key: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Unit of caller-facing lengths
    pub units: LengthUnit,
}

impl Default for OnshapeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_key: None,
            secret_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            units: LengthUnit::default(),
        }
    }
}

impl OnshapeConfig {
    /// Defaults overridden by `ONSHAPE_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Load a RON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        ron::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply overrides from a variable lookup (e.g. the process environment)
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("ONSHAPE_BASE_URL") {
            self.base_url = url;
        }
        if let Some(key) = lookup("ONSHAPE_ACCESS_KEY") {
            self.access_key = Some(key);
        }
        if let Some(secret) = lookup("ONSHAPE_SECRET_KEY") {
            self.secret_key = Some(secret);
        }
        if let Some(timeout) = lookup("ONSHAPE_TIMEOUT_SECS") {
            self.timeout_secs =
                timeout
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "ONSHAPE_TIMEOUT_SECS",
                        value: timeout.clone(),
                    })?;
        }
        if let Some(units) = lookup("ONSHAPE_UNITS") {
            self.units = units.parse().map_err(|_| ConfigError::InvalidValue {
                key: "ONSHAPE_UNITS",
                value: units.clone(),
            })?;
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Whether both API keys are set
    pub fn has_credentials(&self) -> bool {
        self.access_key.is_some() && self.secret_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = OnshapeConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.units, LengthUnit::Inch);
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_overrides() {
        let config = OnshapeConfig::default()
            .with_overrides(lookup(&[
                ("ONSHAPE_BASE_URL", "https://example.onshape.com/"),
                ("ONSHAPE_ACCESS_KEY", "ak"),
                ("ONSHAPE_SECRET_KEY", "sk"),
                ("ONSHAPE_TIMEOUT_SECS", "5"),
                ("ONSHAPE_UNITS", "mm"),
            ]))
            .unwrap();
        assert_eq!(config.base_url, "https://example.onshape.com");
        assert!(config.has_credentials());
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.units, LengthUnit::Millimeter);
    }

    #[test]
    fn test_invalid_override() {
        let err = OnshapeConfig::default()
            .with_overrides(lookup(&[("ONSHAPE_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "ONSHAPE_TIMEOUT_SECS",
                ..
            }
        ));
    }

    #[test]
    fn test_load_ron() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("onshape.ron");
        std::fs::write(&path, r#"(access_key: Some("ak"), units: millimeter)"#).unwrap();

        let config = OnshapeConfig::load(&path).unwrap();
        assert_eq!(config.access_key.as_deref(), Some("ak"));
        assert_eq!(config.units, LengthUnit::Millimeter);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);

        let missing = OnshapeConfig::load(&dir.path().join("missing.ron"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
