use crate::config::{Config, DatabaseBackend};
use std::env;
use std::sync::Mutex;
use std::sync::OnceLock;

// Global lock to prevent race conditions when modifying environment variables in tests
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn get_env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

fn set(key: &str, value: &str) {
    // SAFETY: env mutation is serialized by ENV_LOCK
    unsafe { env::set_var(key, value) };
}

fn unset(key: &str) {
    // SAFETY: env mutation is serialized by ENV_LOCK
    unsafe { env::remove_var(key) };
}

#[test]
fn test_config_from_env_without_debug() {
    let _guard = get_env_lock().lock().unwrap();
    unset("DEBUG");

    let config = Config::from_env().unwrap();

    // Unset DEBUG resolves to off instead of failing startup
    assert!(!config.debug());
}

#[test]
fn test_config_from_env_reads_injected_values() {
    let _guard = get_env_lock().lock().unwrap();
    set("DATABASE_URL", "postgres://exchange:secret@db:5432/exchange");
    set("ADMIN_API_TOKEN", "admintoken");
    set("DEBUG", "true");

    let config = Config::from_env().unwrap();

    assert_eq!(config.database.backend, DatabaseBackend::Postgres);
    assert_eq!(
        config.admin_api_token.as_ref().map(|t| t.expose()),
        Some("admintoken")
    );
    assert!(config.debug());

    // Cleanup
    unset("DATABASE_URL");
    unset("ADMIN_API_TOKEN");
    unset("DEBUG");
}

#[test]
fn test_config_from_env_rejects_malformed_values() {
    let _guard = get_env_lock().lock().unwrap();
    set("APP_PORT", "not-a-port");

    let result = Config::from_env();
    assert!(result.is_err());

    // Cleanup
    unset("APP_PORT");
}
