use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How a supervised task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Success,
    Failure,
}

/// When an exited task is started again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartPolicy {
    /// Never restart
    No,
    /// Restart only after a failure, optionally a bounded number of times
    OnFailure { max_restarts: Option<u32> },
    /// Restart after any exit until explicitly stopped
    #[default]
    UnlessStopped,
}

impl RestartPolicy {
    /// Decide whether to restart after an exit, given restarts already performed.
    pub fn should_restart(&self, exit: ExitKind, restarts: u32) -> bool {
        match self {
            RestartPolicy::No => false,
            RestartPolicy::OnFailure { max_restarts } => {
                exit == ExitKind::Failure && max_restarts.is_none_or(|max| restarts < max)
            }
            RestartPolicy::UnlessStopped => true,
        }
    }
}

impl FromStr for RestartPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "no" => Ok(RestartPolicy::No),
            "unless-stopped" => Ok(RestartPolicy::UnlessStopped),
            "on-failure" => Ok(RestartPolicy::OnFailure { max_restarts: None }),
            other => match other.strip_prefix("on-failure:") {
                Some(count) => {
                    let max = count.parse::<u32>().map_err(|e| {
                        anyhow::anyhow!("Invalid restart count in '{}': {}", s, e)
                    })?;
                    Ok(RestartPolicy::OnFailure {
                        max_restarts: Some(max),
                    })
                }
                None => anyhow::bail!(
                    "Invalid RESTART_POLICY: {}. Must be 'no', 'on-failure[:N]', or 'unless-stopped'",
                    s
                ),
            },
        }
    }
}

impl fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestartPolicy::No => write!(f, "no"),
            RestartPolicy::OnFailure { max_restarts: None } => write!(f, "on-failure"),
            RestartPolicy::OnFailure {
                max_restarts: Some(max),
            } => write!(f, "on-failure:{}", max),
            RestartPolicy::UnlessStopped => write!(f, "unless-stopped"),
        }
    }
}

/// Exponential restart delay: `initial * 2^n`, capped at `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(1000),
            max: Duration::from_millis(30_000),
        }
    }
}

impl Backoff {
    pub fn delay(&self, restarts: u32) -> Duration {
        let factor = 1u32.checked_shl(restarts.min(31)).unwrap_or(u32::MAX);
        self.initial
            .checked_mul(factor)
            .unwrap_or(self.max)
            .min(self.max)
    }
}
