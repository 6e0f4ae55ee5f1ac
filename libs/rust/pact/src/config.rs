//! Registry configuration.
//!
//! Loaded from environment variables (and a `.env` file if present).

use crate::telemetry::TracingConfig;
use std::env;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable present but unparseable
    #[error("Invalid {name}: {reason}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Parse failure
        reason: String,
    },
}

/// Registry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Service name attached to log output
    pub service_name: String,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON log lines
    pub json_logs: bool,
    /// Require exact pacticipant name matches on lookups
    pub case_sensitive_names: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            service_name: "pact-registry".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            case_sensitive_names: false,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            service_name: lookup("PACT_REGISTRY_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("PACT_REGISTRY_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logs: parse_var(&lookup, "PACT_REGISTRY_LOG_JSON", defaults.json_logs)?,
            case_sensitive_names: parse_var(
                &lookup,
                "PACT_REGISTRY_CASE_SENSITIVE_NAMES",
                defaults.case_sensitive_names,
            )?,
        })
    }

    /// Tracing settings derived from this configuration.
    #[must_use]
    pub fn tracing(&self) -> TracingConfig {
        let config = TracingConfig::default()
            .with_service_name(&self.service_name)
            .with_log_level(&self.log_level);
        if self.json_logs {
            config.with_json_output()
        } else {
            config
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.service_name, "pact-registry");
        assert!(!config.case_sensitive_names);
    }

    #[test]
    fn test_overrides() {
        let config = RegistryConfig::from_lookup(lookup_from(&[
            ("PACT_REGISTRY_SERVICE_NAME", "broker"),
            ("PACT_REGISTRY_LOG_LEVEL", "debug"),
            ("PACT_REGISTRY_LOG_JSON", "true"),
            ("PACT_REGISTRY_CASE_SENSITIVE_NAMES", " true "),
        ]))
        .unwrap();

        assert_eq!(config.service_name, "broker");
        assert!(config.json_logs);
        assert!(config.case_sensitive_names);

        let tracing = config.tracing();
        assert_eq!(tracing.service_name, "broker");
        assert_eq!(tracing.log_level, "debug");
        assert!(tracing.json_output);
    }

    #[test]
    fn test_invalid_bool() {
        let err = RegistryConfig::from_lookup(lookup_from(&[("PACT_REGISTRY_LOG_JSON", "yes")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { name: "PACT_REGISTRY_LOG_JSON", .. }
        ));
    }
}
