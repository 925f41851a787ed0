use crate::config::DatabaseEnvConfig;
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::info;

/// Register the sqlite and postgres drivers with the `Any` backend.
pub fn install_drivers() {
    sqlx::any::install_default_drivers();
}

/// Shared connection pool handed to request handlers
#[derive(Clone)]
pub struct Database {
    pub pool: AnyPool,
}

impl Database {
    pub async fn connect(config: &DatabaseEnvConfig) -> Result<Self, sqlx::Error> {
        let pool = Self::open_pool(&config.url, config.max_connections, config.acquire_timeout).await?;
        info!("Connected to database: {}", config.redacted_url());
        Ok(Self { pool })
    }

    /// Open a pool without wrapping it, for short-lived work such as migrations.
    pub async fn open_pool(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<AnyPool, sqlx::Error> {
        install_drivers();
        ensure_sqlite_directory(url).await?;

        AnyPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .test_before_acquire(true)
            .connect(url)
            .await
    }

    /// Round-trip a trivial statement to prove the database answers.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        info!("Closing database connection pool.");
        self.pool.close().await;
    }
}

// SQLite creates the file but not its parent directory
async fn ensure_sqlite_directory(url: &str) -> Result<(), sqlx::Error> {
    if let Some(path_part) = url.strip_prefix("sqlite://") {
        let path_part = path_part.split('?').next().unwrap_or_default();
        let path = Path::new(path_part);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}
