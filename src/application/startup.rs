//! Migrate-then-serve startup sequence.
//!
//! The schema is brought up to date on a dedicated connection before any
//! request handling exists. A migration failure aborts startup before the
//! listener is bound, so a half-started service is never reachable. On
//! success the same process moves on to the server main loop and receives
//! termination signals directly.

use crate::application::readiness_gate::ReadinessGate;
use crate::application::shutdown::ShutdownSignal;
use crate::application::supervisor::{Supervisor, SupervisorOutcome};
use crate::config::Config;
use crate::domain::errors::StartupError;
use crate::domain::ports::ReadinessProbe;
use crate::infrastructure::http::{AppState, HttpServer, ServiceInfo};
use crate::infrastructure::persistence::database::Database;
use crate::infrastructure::persistence::migrations::{MigrationReport, MigrationRunner};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct StartupSequence {
    config: Config,
    migrations: Arc<MigrationRunner>,
}

/// Migrated, connected and bound; not yet accepting requests
pub struct PreparedServer {
    server: HttpServer,
    db: Database,
    migration_report: MigrationReport,
}

impl StartupSequence {
    pub fn new(config: Config, migrations: Arc<MigrationRunner>) -> Self {
        Self { config, migrations }
    }

    /// Run migrations to completion, then connect and bind.
    pub async fn prepare(&self) -> Result<PreparedServer, StartupError> {
        info!("--- Application startup ---");
        info!("Project Name: {}", self.config.server.project_name);
        info!("API Version: {}", self.config.server.project_version);
        info!("Debug mode: {}", self.config.debug());
        info!(
            "Admin API token: {}",
            if self.config.admin_api_token.is_some() {
                "configured"
            } else {
                "not configured"
            }
        );

        // Step 1: Migrations (fatal on failure)
        info!("Step 1: Running database migrations...");
        let migration_report = self
            .migrations
            .run(&self.config.database)
            .await
            .map_err(|e| {
                error!("FATAL: Migrations failed, server will not start: {}", e);
                StartupError::Migration(e)
            })?;
        info!(
            "Migrations complete ({} applied, {} known)",
            migration_report.applied.len(),
            migration_report.known
        );

        // Step 2: Serving pool
        info!("Step 2: Checking database connection...");
        let db = Database::connect(&self.config.database)
            .await
            .map_err(StartupError::Database)?;
        if let Err(e) = db.ping().await {
            db.close().await;
            return Err(StartupError::Database(e));
        }
        info!("Database connection checked successfully.");

        // Step 3: Listener
        let state = AppState::new(db.clone(), ServiceInfo::from_config(&self.config));
        let server = match HttpServer::bind(&self.config.server, state).await {
            Ok(server) => server,
            Err(e) => {
                db.close().await;
                return Err(e);
            }
        };

        Ok(PreparedServer {
            server,
            db,
            migration_report,
        })
    }

    /// `prepare`, then serve until shutdown.
    pub async fn run(&self, shutdown: ShutdownSignal) -> Result<(), StartupError> {
        self.prepare().await?.serve(shutdown).await
    }
}

impl PreparedServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    pub fn migration_report(&self) -> &MigrationReport {
        &self.migration_report
    }

    /// Hand control to the server main loop; closes the pool on the way out.
    pub async fn serve(self, shutdown: ShutdownSignal) -> Result<(), StartupError> {
        let result = self.server.serve(shutdown.wait()).await;
        info!("--- Application shutdown ---");
        self.db.close().await;
        result
    }
}

/// Wait for `probe` to turn healthy, then run `sequence` under `supervisor`
/// until shutdown.
///
/// Nothing is migrated or bound unless the gate reports healthy.
pub async fn run_gated(
    gate: &ReadinessGate,
    probe: &dyn ReadinessProbe,
    sequence: &StartupSequence,
    supervisor: &Supervisor,
    shutdown: ShutdownSignal,
) -> Result<(), StartupError> {
    gate.wait_or_cancel(probe, shutdown.clone()).await?;

    let outcome = supervisor
        .run(
            |signal| {
                let sequence = sequence.clone();
                async move { sequence.run(signal).await }
            },
            shutdown,
        )
        .await;

    match outcome {
        SupervisorOutcome::Stopped { runs } => {
            info!("Stopped after {} run(s)", runs);
            Ok(())
        }
        SupervisorOutcome::Exited { result, .. } => result,
    }
}
