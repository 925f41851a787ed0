use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Lifecycle of a readiness check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReadinessState {
    Waiting,  // Idle until the next interval tick
    Probing,  // An attempt is in flight
    Healthy,  // Probe succeeded (terminal)
    Failed,   // Retry budget exhausted (terminal)
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessState::Waiting => write!(f, "waiting"),
            ReadinessState::Probing => write!(f, "probing"),
            ReadinessState::Healthy => write!(f, "healthy"),
            ReadinessState::Failed => write!(f, "failed"),
        }
    }
}

/// Polling cadence and retry budget for a readiness probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Delay between attempts (the first attempt also waits one interval)
    pub interval: Duration,
    /// Upper bound on a single attempt
    pub timeout: Duration,
    /// Consecutive counted failures before giving up
    pub retries: u32,
    /// Grace period from start during which failures are not counted
    pub start_period: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(5),
            retries: 5,
            start_period: Duration::ZERO,
        }
    }
}

/// Result of a single probe attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success,
    Failed(String),
    TimedOut(Duration),
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Success => write!(f, "success"),
            ProbeOutcome::Failed(reason) => write!(f, "{}", reason),
            ProbeOutcome::TimedOut(limit) => write!(f, "timed out after {:?}", limit),
        }
    }
}

/// Pure readiness state machine.
///
/// Transitions:
/// - `Waiting -> Probing` on [`tick`](Self::tick)
/// - `Probing -> Healthy` on a successful attempt
/// - `Probing -> Failed` once counted failures reach `retries`
/// - `Probing -> Waiting` on any other failure
///
/// Terminal states ignore further input. Time is passed in by the caller so
/// the machine never reads a clock.
#[derive(Debug, Clone)]
pub struct ReadinessMachine {
    policy: ReadinessPolicy,
    state: ReadinessState,
    attempts: u32,
    consecutive_failures: u32,
    last_error: Option<String>,
}

impl ReadinessMachine {
    pub fn new(policy: ReadinessPolicy) -> Self {
        Self {
            policy,
            state: ReadinessState::Waiting,
            attempts: 0,
            consecutive_failures: 0,
            last_error: None,
        }
    }

    pub fn state(&self) -> ReadinessState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Interval elapsed: start the next attempt if waiting.
    pub fn tick(&mut self) -> ReadinessState {
        if self.state == ReadinessState::Waiting {
            self.state = ReadinessState::Probing;
            self.attempts += 1;
        }
        self.state
    }

    /// Record the outcome of the in-flight attempt.
    ///
    /// `since_start` is the time elapsed since the check began; failures that
    /// land inside the start period do not count towards the retry budget.
    pub fn record(&mut self, outcome: ProbeOutcome, since_start: Duration) -> ReadinessState {
        if self.state != ReadinessState::Probing {
            return self.state;
        }

        match outcome {
            ProbeOutcome::Success => {
                self.consecutive_failures = 0;
                self.state = ReadinessState::Healthy;
            }
            failure => {
                self.last_error = Some(failure.to_string());

                if since_start < self.policy.start_period {
                    self.state = ReadinessState::Waiting;
                    return self.state;
                }

                self.consecutive_failures += 1;
                // A zero budget still allows one attempt
                if self.consecutive_failures >= self.policy.retries.max(1) {
                    self.state = ReadinessState::Failed;
                } else {
                    self.state = ReadinessState::Waiting;
                }
            }
        }

        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(retries: u32, start_period: Duration) -> ReadinessPolicy {
        ReadinessPolicy {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(1),
            retries,
            start_period,
        }
    }

    fn fail(machine: &mut ReadinessMachine, at: Duration) -> ReadinessState {
        machine.tick();
        machine.record(ProbeOutcome::Failed("connection refused".into()), at)
    }

    #[test]
    fn test_starts_waiting_and_ticks_into_probing() {
        let mut machine = ReadinessMachine::new(policy(3, Duration::ZERO));
        assert_eq!(machine.state(), ReadinessState::Waiting);
        assert_eq!(machine.tick(), ReadinessState::Probing);
        assert_eq!(machine.attempts(), 1);

        // A second tick while probing doesn't start another attempt
        assert_eq!(machine.tick(), ReadinessState::Probing);
        assert_eq!(machine.attempts(), 1);
    }

    #[test]
    fn test_success_is_terminal_healthy() {
        let mut machine = ReadinessMachine::new(policy(3, Duration::ZERO));
        fail(&mut machine, Duration::from_secs(1));
        machine.tick();
        let state = machine.record(ProbeOutcome::Success, Duration::from_secs(2));

        assert_eq!(state, ReadinessState::Healthy);
        assert_eq!(machine.consecutive_failures(), 0);
        assert_eq!(machine.tick(), ReadinessState::Healthy);
        assert_eq!(machine.attempts(), 2);
    }

    #[test]
    fn test_fails_after_exhausting_retries() {
        let mut machine = ReadinessMachine::new(policy(3, Duration::ZERO));

        assert_eq!(fail(&mut machine, Duration::from_secs(1)), ReadinessState::Waiting);
        assert_eq!(fail(&mut machine, Duration::from_secs(2)), ReadinessState::Waiting);
        assert_eq!(fail(&mut machine, Duration::from_secs(3)), ReadinessState::Failed);
        assert_eq!(machine.last_error(), Some("connection refused"));

        // Failed is terminal: a late success changes nothing
        machine.tick();
        assert_eq!(
            machine.record(ProbeOutcome::Success, Duration::from_secs(4)),
            ReadinessState::Failed
        );
    }

    #[test]
    fn test_timeout_counts_as_failure() {
        let mut machine = ReadinessMachine::new(policy(1, Duration::ZERO));
        machine.tick();
        let state = machine.record(
            ProbeOutcome::TimedOut(Duration::from_secs(1)),
            Duration::from_secs(2),
        );

        assert_eq!(state, ReadinessState::Failed);
        assert!(machine.last_error().unwrap().contains("timed out"));
    }

    #[test]
    fn test_start_period_failures_are_not_counted() {
        let mut machine = ReadinessMachine::new(policy(2, Duration::from_secs(10)));

        for secs in 1..=5 {
            assert_eq!(
                fail(&mut machine, Duration::from_secs(secs)),
                ReadinessState::Waiting
            );
        }
        assert_eq!(machine.consecutive_failures(), 0);

        assert_eq!(fail(&mut machine, Duration::from_secs(11)), ReadinessState::Waiting);
        assert_eq!(fail(&mut machine, Duration::from_secs(12)), ReadinessState::Failed);
        assert_eq!(machine.attempts(), 7);
    }

    #[test]
    fn test_zero_retries_still_probes_once() {
        let mut machine = ReadinessMachine::new(policy(0, Duration::ZERO));
        assert_eq!(fail(&mut machine, Duration::from_secs(1)), ReadinessState::Failed);
        assert_eq!(machine.attempts(), 1);
    }

    #[test]
    fn test_record_outside_probing_is_ignored() {
        let mut machine = ReadinessMachine::new(policy(3, Duration::ZERO));
        let state = machine.record(ProbeOutcome::Success, Duration::ZERO);
        assert_eq!(state, ReadinessState::Waiting);
        assert_eq!(machine.attempts(), 0);
    }
}
