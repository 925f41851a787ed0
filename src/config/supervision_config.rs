//! Readiness gate and restart policy configuration.
//!
//! Defaults mirror the compose health check: probe every 5s, 5s per attempt,
//! 5 retries, and restart unless explicitly stopped.

use super::{ConfigError, Lookup, non_empty, parse_or};
use crate::domain::readiness::ReadinessPolicy;
use crate::domain::restart::{Backoff, RestartPolicy};
use std::time::Duration;

/// Supervision environment configuration
#[derive(Debug, Clone, Default)]
pub struct SupervisionEnvConfig {
    pub readiness: ReadinessPolicy,
    pub restart_policy: RestartPolicy,
    pub restart_backoff: Backoff,
}

impl SupervisionEnvConfig {
    pub fn from_lookup(lookup: Lookup) -> Result<Self, ConfigError> {
        let retries = parse_or(lookup, "READINESS_RETRIES", 5u32)?;
        if retries == 0 {
            return Err(ConfigError::OutOfRange {
                key: "READINESS_RETRIES",
                value: retries.to_string(),
                constraint: "at least 1",
            });
        }

        let interval = parse_or(lookup, "READINESS_INTERVAL_SECS", 5u64)?;
        if interval == 0 {
            return Err(ConfigError::OutOfRange {
                key: "READINESS_INTERVAL_SECS",
                value: interval.to_string(),
                constraint: "at least 1",
            });
        }

        let readiness = ReadinessPolicy {
            interval: Duration::from_secs(interval),
            timeout: Duration::from_secs(parse_or(lookup, "READINESS_TIMEOUT_SECS", 5u64)?),
            retries,
            start_period: Duration::from_secs(parse_or(
                lookup,
                "READINESS_START_PERIOD_SECS",
                0u64,
            )?),
        };

        let restart_policy = match non_empty(lookup, "RESTART_POLICY") {
            None => RestartPolicy::default(),
            Some(raw) => raw.parse::<RestartPolicy>().map_err(|e| ConfigError::Invalid {
                key: "RESTART_POLICY",
                reason: e.to_string(),
                value: raw,
            })?,
        };

        let initial = parse_or(lookup, "RESTART_BACKOFF_MS", 1000u64)?;
        let max = parse_or(lookup, "RESTART_BACKOFF_MAX_MS", 30_000u64)?;
        if max < initial {
            return Err(ConfigError::OutOfRange {
                key: "RESTART_BACKOFF_MAX_MS",
                value: max.to_string(),
                constraint: "greater than or equal to RESTART_BACKOFF_MS",
            });
        }

        Ok(Self {
            readiness,
            restart_policy,
            restart_backoff: Backoff {
                initial: Duration::from_millis(initial),
                max: Duration::from_millis(max),
            },
        })
    }
}
