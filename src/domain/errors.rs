use thiserror::Error;

/// Errors raised while loading configuration from the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{key} must be {constraint}, got {value}")]
    OutOfRange {
        key: &'static str,
        value: String,
        constraint: &'static str,
    },
}

/// Errors raised while loading or applying schema migrations
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Failed to connect to the database for migrations: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Failed to load migrations from {path}: {source}")]
    Load {
        path: String,
        source: sqlx::migrate::MigrateError,
    },

    #[error("Migration failed: {0}")]
    Apply(#[from] sqlx::migrate::MigrateError),

    #[error("Failed to read migration history: {0}")]
    History(#[source] sqlx::Error),
}

/// Errors raised by the readiness gate
#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error(
        "{probe} not ready after {attempts} attempts ({failures} consecutive failures): {last_error}"
    )]
    Exhausted {
        probe: String,
        attempts: u32,
        failures: u32,
        last_error: String,
    },

    #[error("Readiness wait for {probe} cancelled by shutdown")]
    Cancelled { probe: String },
}

/// Errors that abort process startup.
///
/// Each variant maps to a distinct process exit status so the orchestrator
/// (and operators reading container logs) can tell the failure class apart.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error(transparent)]
    Readiness(#[from] ReadinessError),

    #[error("Database unavailable: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Server(#[source] std::io::Error),
}

impl StartupError {
    /// Process exit status for this failure (sysexits.h values where one fits)
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::Config(_) => 78,
            StartupError::Database(_) | StartupError::Readiness(_) => 69,
            StartupError::Migration(_) => 70,
            StartupError::Bind { .. } | StartupError::Server(_) => 1,
        }
    }
}
