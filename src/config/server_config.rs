//! HTTP server configuration parsing from environment variables.

use super::{ConfigError, Lookup, non_empty, parse_or};
use std::net::IpAddr;

/// Server environment configuration
#[derive(Debug, Clone)]
pub struct ServerEnvConfig {
    pub host: String,
    pub port: u16,
    /// Normalized API prefix: empty, or `/segment[/segment...]` without a trailing slash
    pub api_prefix: String,
    pub project_name: String,
    pub project_version: String,
}

impl Default for ServerEnvConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            api_prefix: "/api/v1".to_string(),
            project_name: "Toy Exchange API".to_string(),
            project_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerEnvConfig {
    pub fn from_lookup(lookup: Lookup) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            host: non_empty(lookup, "APP_HOST").unwrap_or(defaults.host),
            port: parse_or(lookup, "APP_PORT", defaults.port)?,
            api_prefix: normalize_prefix(
                &non_empty(lookup, "API_V1_STR").unwrap_or(defaults.api_prefix),
            ),
            project_name: non_empty(lookup, "PROJECT_NAME").unwrap_or(defaults.project_name),
            project_version: non_empty(lookup, "PROJECT_VERSION")
                .unwrap_or(defaults.project_version),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL a client on the same host uses to reach the server.
    ///
    /// Wildcard bind addresses are reached over loopback.
    pub fn local_base_url(&self) -> String {
        let host = match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V4(ip)) if ip.is_unspecified() => "127.0.0.1".to_string(),
            Ok(IpAddr::V6(ip)) if ip.is_unspecified() => "[::1]".to_string(),
            Ok(IpAddr::V6(ip)) => format!("[{}]", ip),
            _ => self.host.clone(),
        };
        format!("http://{}:{}", host, self.port)
    }
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
