//! Schema migrations.
//!
//! The SQL files under `migrations/<backend>/` are embedded at compile time, so
//! the binary needs nothing on disk to bring a database up to date. Both sets
//! carry the same versions; only the column types differ. Applied
//! versions are tracked by sqlx in `_sqlx_migrations`, which makes a rerun
//! after a crash or restart a no-op for everything already applied.

use crate::config::{DatabaseBackend, DatabaseEnvConfig};
use crate::domain::errors::MigrationError;
use crate::infrastructure::persistence::database::Database;
use sqlx::AnyPool;
use sqlx::error::DatabaseError;
use sqlx::migrate::Migrator;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

static SQLITE: Migrator = sqlx::migrate!("./migrations/sqlite");
static POSTGRES: Migrator = sqlx::migrate!("./migrations/postgres");

/// Applied versions before and after a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Versions applied by this run, in order
    pub applied: Vec<i64>,
    /// Number of up-migrations known to the runner
    pub known: usize,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// One row of `migrate-status` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}

enum Source {
    Embedded(&'static Migrator),
    Loaded(Migrator),
}

/// Applies pending migrations from a fixed source
pub struct MigrationRunner {
    source: Source,
}

impl MigrationRunner {
    /// Migrations compiled into the binary for `backend`
    pub fn embedded(backend: DatabaseBackend) -> Self {
        let migrator = match backend {
            DatabaseBackend::Sqlite => &SQLITE,
            DatabaseBackend::Postgres => &POSTGRES,
        };
        Self {
            source: Source::Embedded(migrator),
        }
    }

    /// Migrations read from a directory at runtime
    pub async fn from_dir(path: impl AsRef<Path>) -> Result<Self, MigrationError> {
        let path = path.as_ref();
        let migrator = Migrator::new(path.to_path_buf())
            .await
            .map_err(|source| MigrationError::Load {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self {
            source: Source::Loaded(migrator),
        })
    }

    fn migrator(&self) -> &Migrator {
        match &self.source {
            Source::Embedded(migrator) => *migrator,
            Source::Loaded(migrator) => migrator,
        }
    }

    /// Up-migrations as `(version, description)`, in apply order
    pub fn migrations(&self) -> Vec<(i64, String)> {
        self.migrator()
            .iter()
            .filter(|m| !m.migration_type.is_down_migration())
            .map(|m| (m.version, m.description.to_string()))
            .collect()
    }

    /// Connect with a dedicated single-connection pool, migrate, and close it.
    pub async fn run(&self, database: &DatabaseEnvConfig) -> Result<MigrationReport, MigrationError> {
        let pool = Database::open_pool(&database.url, 1, database.acquire_timeout)
            .await
            .map_err(MigrationError::Connect)?;

        let result = self.run_on(&pool).await;
        pool.close().await;
        result
    }

    pub async fn run_on(&self, pool: &AnyPool) -> Result<MigrationReport, MigrationError> {
        let before = applied_versions(pool).await?;
        let pending = self
            .migrations()
            .iter()
            .filter(|(version, _)| !before.contains(version))
            .count();
        info!(
            "Applying migrations: {} known, {} pending",
            self.migrations().len(),
            pending
        );

        self.migrator().run(pool).await?;

        let after = applied_versions(pool).await?;
        let applied: Vec<i64> = after.difference(&before).copied().collect();
        for version in &applied {
            info!("Applied migration {}", version);
        }

        Ok(MigrationReport {
            applied,
            known: self.migrations().len(),
        })
    }

    pub async fn status(&self, pool: &AnyPool) -> Result<Vec<MigrationStatus>, MigrationError> {
        let applied = applied_versions(pool).await?;
        Ok(self
            .migrations()
            .into_iter()
            .map(|(version, description)| MigrationStatus {
                version,
                applied: applied.contains(&version),
                description,
            })
            .collect())
    }
}

async fn applied_versions(pool: &AnyPool) -> Result<BTreeSet<i64>, MigrationError> {
    let rows = sqlx::query_scalar::<_, i64>("SELECT version FROM _sqlx_migrations ORDER BY version")
        .fetch_all(pool)
        .await;

    match rows {
        Ok(versions) => Ok(versions.into_iter().collect()),
        // Fresh database: the bookkeeping table doesn't exist yet
        Err(sqlx::Error::Database(e)) if is_missing_table(e.as_ref()) => {
            warn!("No migration history found ({}), assuming empty", e.message());
            Ok(BTreeSet::new())
        }
        Err(e) => Err(MigrationError::History(e)),
    }
}

fn is_missing_table(error: &dyn DatabaseError) -> bool {
    // 42P01 is PostgreSQL's undefined_table; SQLite only says so in the message
    error.code().as_deref() == Some("42P01") || error.message().contains("no such table")
}
