//! Observability configuration parsing from environment variables.
//!
//! This module handles the debug flag and log output format.

use super::{ConfigError, Lookup, non_empty, parse_bool};
use std::str::FromStr;

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Invalid LOG_FORMAT: {}. Must be 'pretty' or 'json'", s),
        }
    }
}

/// Observability environment configuration
#[derive(Debug, Clone, Default)]
pub struct ObservabilityEnvConfig {
    pub debug: bool,
    pub log_format: LogFormat,
}

impl ObservabilityEnvConfig {
    pub fn from_lookup(lookup: Lookup) -> Result<Self, ConfigError> {
        let log_format = match non_empty(lookup, "LOG_FORMAT") {
            None => LogFormat::default(),
            Some(raw) => raw.parse::<LogFormat>().map_err(|e| ConfigError::Invalid {
                key: "LOG_FORMAT",
                reason: e.to_string(),
                value: raw,
            })?,
        };

        Ok(Self {
            debug: parse_bool(lookup, "DEBUG", false)?,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::vars;

    #[test]
    fn test_observability_config_defaults() {
        let config = ObservabilityEnvConfig::from_lookup(&vars(&[])).unwrap();
        assert!(!config.debug);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_empty_debug_resolves_to_off() {
        // Compose passes `DEBUG: ${DEBUG}` through as an empty string when unset
        let config = ObservabilityEnvConfig::from_lookup(&vars(&[("DEBUG", "")])).unwrap();
        assert!(!config.debug);
    }

    #[test]
    fn test_debug_and_json() {
        let config =
            ObservabilityEnvConfig::from_lookup(&vars(&[("DEBUG", "True"), ("LOG_FORMAT", "JSON")]))
                .unwrap();
        assert!(config.debug);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_malformed_debug_fails() {
        let result = ObservabilityEnvConfig::from_lookup(&vars(&[("DEBUG", "sometimes")]));
        assert!(result.is_err());
    }
}
