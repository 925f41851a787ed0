//! Database configuration parsing from environment variables.

use super::{ConfigError, Lookup, non_empty, parse_or};
use std::time::Duration;
use url::Url;

const DEFAULT_DATABASE_URL: &str = "sqlite://stock_market.db?mode=rwc";

/// Database engine selected by the connection string scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

impl DatabaseBackend {
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        let scheme = url.split(':').next().unwrap_or_default().to_lowercase();
        match scheme.as_str() {
            "sqlite" => Ok(DatabaseBackend::Sqlite),
            "postgres" | "postgresql" => Ok(DatabaseBackend::Postgres),
            _ => Err(ConfigError::Invalid {
                key: "DATABASE_URL",
                value: redact(url),
                reason: "scheme must be sqlite:// or postgres://".to_string(),
            }),
        }
    }

    /// Standard listening port, if the backend has a network endpoint
    pub fn default_port(self) -> Option<u16> {
        match self {
            DatabaseBackend::Sqlite => None,
            DatabaseBackend::Postgres => Some(5432),
        }
    }
}

/// Database environment configuration
#[derive(Clone)]
pub struct DatabaseEnvConfig {
    pub url: String,
    pub backend: DatabaseBackend,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for DatabaseEnvConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            backend: DatabaseBackend::Sqlite,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl DatabaseEnvConfig {
    pub fn from_lookup(lookup: Lookup) -> Result<Self, ConfigError> {
        let url = non_empty(lookup, "DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let backend = DatabaseBackend::from_url(&url)?;

        let max_connections = parse_or(lookup, "DATABASE_MAX_CONNECTIONS", 5u32)?;
        if max_connections == 0 {
            return Err(ConfigError::OutOfRange {
                key: "DATABASE_MAX_CONNECTIONS",
                value: max_connections.to_string(),
                constraint: "at least 1",
            });
        }

        Ok(Self {
            url,
            backend,
            max_connections,
            acquire_timeout: Duration::from_secs(parse_or(
                lookup,
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                5u64,
            )?),
        })
    }

    /// Connection string with any password masked, safe for logs
    pub fn redacted_url(&self) -> String {
        redact(&self.url)
    }
}

impl std::fmt::Debug for DatabaseEnvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseEnvConfig")
            .field("url", &self.redacted_url())
            .field("backend", &self.backend)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

fn redact(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::vars;

    #[test]
    fn test_database_config_defaults() {
        let config = DatabaseEnvConfig::from_lookup(&vars(&[])).unwrap();
        assert_eq!(config.url, DEFAULT_DATABASE_URL);
        assert_eq!(config.backend, DatabaseBackend::Sqlite);
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn test_postgres_url_selects_backend_and_redacts_password() {
        let config = DatabaseEnvConfig::from_lookup(&vars(&[(
            "DATABASE_URL",
            "postgresql://exchange:hunter2@db:5432/exchange",
        )]))
        .unwrap();

        assert_eq!(config.backend, DatabaseBackend::Postgres);
        assert!(!config.redacted_url().contains("hunter2"));
        assert!(config.redacted_url().contains("db:5432/exchange"));
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_unsupported_scheme_is_rejected() {
        let result = DatabaseEnvConfig::from_lookup(&vars(&[("DATABASE_URL", "mysql://localhost/db")]));
        assert!(matches!(result, Err(ConfigError::Invalid { key: "DATABASE_URL", .. })));
    }

    #[test]
    fn test_zero_pool_size_is_rejected() {
        let result = DatabaseEnvConfig::from_lookup(&vars(&[("DATABASE_MAX_CONNECTIONS", "0")]));
        assert!(matches!(result, Err(ConfigError::OutOfRange { .. })));
    }
}
