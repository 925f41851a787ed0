//! Configuration module for the Toy Exchange API.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Database, Server, Supervision, and Observability.

mod database_config;
mod observability_config;
mod server_config;
mod supervision_config;

pub use database_config::{DatabaseBackend, DatabaseEnvConfig};
pub use observability_config::{LogFormat, ObservabilityEnvConfig};
pub use server_config::ServerEnvConfig;
pub use supervision_config::SupervisionEnvConfig;

pub use crate::domain::errors::ConfigError;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Source of raw configuration values, keyed by variable name
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Administrative API token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminToken(String);

impl AdminToken {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AdminToken(***)")
    }
}

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseEnvConfig,
    pub server: ServerEnvConfig,
    pub supervision: SupervisionEnvConfig,
    pub observability: ObservabilityEnvConfig,
    pub admin_api_token: Option<AdminToken>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: Lookup) -> Result<Self, ConfigError> {
        Ok(Self {
            database: DatabaseEnvConfig::from_lookup(lookup)?,
            server: ServerEnvConfig::from_lookup(lookup)?,
            supervision: SupervisionEnvConfig::from_lookup(lookup)?,
            observability: ObservabilityEnvConfig::from_lookup(lookup)?,
            admin_api_token: non_empty(lookup, "ADMIN_API_TOKEN").map(AdminToken),
        })
    }

    pub fn debug(&self) -> bool {
        self.observability.debug
    }
}

/// Value for `key`, with surrounding whitespace removed; empty counts as unset.
pub(crate) fn non_empty(lookup: Lookup, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn parse_or<T>(lookup: Lookup, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match non_empty(lookup, key) {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value: raw,
        }),
    }
}

pub(crate) fn parse_bool(lookup: Lookup, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = non_empty(lookup, key) else {
        return Ok(default);
    };

    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "expected true/false, 1/0, yes/no or on/off".to_string(),
        }),
    }
}
