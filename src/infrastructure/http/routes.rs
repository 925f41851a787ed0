use crate::config::Config;
use crate::infrastructure::persistence::database::Database;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Static facts about the running service
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub debug: bool,
}

impl ServiceInfo {
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: config.server.project_name.clone(),
            version: config.server.project_version.clone(),
            debug: config.debug(),
        }
    }
}

/// State injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub info: Arc<ServiceInfo>,
}

impl AppState {
    pub fn new(db: Database, info: ServiceInfo) -> Self {
        Self {
            db,
            info: Arc::new(info),
        }
    }
}

/// Build the router. Operational routes are served at the root and again
/// beneath `api_prefix` when one is configured.
pub fn router(state: AppState, api_prefix: &str) -> Router {
    let operational = Router::new()
        .route("/ping", get(ping))
        .route("/health", get(health))
        .route("/version", get(version));

    let mut app = operational.clone();
    if !api_prefix.is_empty() {
        app = app.nest(api_prefix, operational);
    }

    app.fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn ping() -> Json<Value> {
    info!("Ping received");
    Json(json!({ "message": "pong" }))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "up" })),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "database": "down" })),
            )
        }
    }
}

async fn version(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(state.info.as_ref().clone())
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" })))
}
