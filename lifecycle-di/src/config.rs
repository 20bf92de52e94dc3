//! Container configuration

#[cfg(feature = "config")]
use crate::error::{DiError, DiResult};
use crate::specification::DEFAULT_SCOPE;
use serde::{Deserialize, Serialize};

/// How the cycle detector compares a request against its requester chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleDetection {
    /// Any ancestor with the same specification is a cycle
    #[default]
    Strict,
    /// Only an ancestor with the same specification and scope id is a cycle
    Lenient,
}

/// Container configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Container name, used in diagnostics
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub cycle_detection: CycleDetection,
    /// Scope id used when a request does not name one
    #[serde(default = "default_scope")]
    pub default_scope: String,
}

fn default_name() -> String {
    "container".to_string()
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            cycle_detection: CycleDetection::default(),
            default_scope: default_scope(),
        }
    }
}

impl ContainerConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_cycle_detection(mut self, cycle_detection: CycleDetection) -> Self {
        self.cycle_detection = cycle_detection;
        self
    }

    /// Load configuration from TOML string
    #[cfg(feature = "config")]
    pub fn from_toml(toml_str: &str) -> DiResult<Self> {
        toml::from_str(toml_str)
            .map_err(|e| DiError::ConfigError(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration from JSON string
    #[cfg(feature = "config")]
    pub fn from_json(json_str: &str) -> DiResult<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| DiError::ConfigError(format!("Failed to parse JSON: {}", e)))
    }
}

// Example configuration file:
// ```toml
// name = "app"
// cycle_detection = "lenient"
// default_scope = "request"
// ```

#[cfg(all(test, feature = "config"))]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = ContainerConfig::from_toml(r#"name = "app""#).unwrap();
        assert_eq!(config.name, "app");
        assert_eq!(config.cycle_detection, CycleDetection::Strict);
        assert_eq!(config.default_scope, "default");
    }

    #[test]
    fn test_json_cycle_detection() {
        let config =
            ContainerConfig::from_json(r#"{"cycle_detection": "lenient", "default_scope": "request"}"#)
                .unwrap();
        assert_eq!(config.name, "container");
        assert_eq!(config.cycle_detection, CycleDetection::Lenient);
        assert_eq!(config.default_scope, "request");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = ContainerConfig::from_toml("cycle_detection = \"sometimes\"");
        assert!(matches!(result, Err(DiError::ConfigError(_))));
    }
}
