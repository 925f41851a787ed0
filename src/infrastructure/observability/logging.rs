use crate::config::{LogFormat, ObservabilityEnvConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Default filter when `RUST_LOG` is unset.
///
/// Debug mode also turns on per-statement SQL logging.
pub fn default_directives(debug: bool) -> &'static str {
    if debug {
        "debug,sqlx::query=debug,hyper=info,h2=info"
    } else {
        "info,sqlx=warn"
    }
}

pub fn build_filter(config: &ObservabilityEnvConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(config.debug)))
}

/// Install the global subscriber. Call once, from `main`.
pub fn init_tracing(config: &ObservabilityEnvConfig) {
    let registry = tracing_subscriber::registry().with(build_filter(config));

    match config.log_format {
        LogFormat::Pretty => {
            let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();
            registry.with(stdout_layer).init();
        }
        LogFormat::Json => {
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .flatten_event(true);
            registry.with(json_layer).init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_enables_sql_logging() {
        assert!(default_directives(true).contains("sqlx::query=debug"));
        assert!(default_directives(false).contains("sqlx=warn"));
    }

    #[test]
    fn test_default_directives_parse() {
        for debug in [true, false] {
            assert!(EnvFilter::try_new(default_directives(debug)).is_ok());
        }
    }
}
