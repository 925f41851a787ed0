use crate::application::shutdown::ShutdownSignal;
use crate::domain::errors::ReadinessError;
use crate::domain::ports::ReadinessProbe;
use crate::domain::readiness::{ProbeOutcome, ReadinessMachine, ReadinessPolicy, ReadinessState};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Event broadcast when the gate changes state
#[derive(Debug, Clone)]
pub struct ReadinessEvent {
    pub probe: String,
    pub state: ReadinessState,
    pub attempt: u32,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

/// Summary of a successful wait
#[derive(Debug, Clone)]
pub struct ReadinessReport {
    pub probe: String,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Polls a probe on a fixed interval until it is healthy or the retry
/// budget runs out.
pub struct ReadinessGate {
    policy: ReadinessPolicy,
    state: RwLock<ReadinessState>,
    event_tx: broadcast::Sender<ReadinessEvent>,
}

impl ReadinessGate {
    pub fn new(policy: ReadinessPolicy) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            policy,
            state: RwLock::new(ReadinessState::Waiting),
            event_tx,
        }
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<ReadinessEvent> {
        self.event_tx.subscribe()
    }

    pub async fn state(&self) -> ReadinessState {
        *self.state.read().await
    }

    /// Block until `probe` succeeds, or fail once the retry budget is spent.
    pub async fn wait_until_ready(
        &self,
        probe: &dyn ReadinessProbe,
    ) -> Result<ReadinessReport, ReadinessError> {
        let started = Instant::now();
        let mut machine = ReadinessMachine::new(self.policy);
        self.set_state(probe.name(), &machine, None).await;

        info!(
            "Waiting for {} (interval {:?}, timeout {:?}, retries {}, start period {:?})",
            probe.name(),
            self.policy.interval,
            self.policy.timeout,
            self.policy.retries,
            self.policy.start_period
        );

        let mut ticker = tokio::time::interval_at(started + self.policy.interval, self.policy.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            machine.tick();
            self.set_state(probe.name(), &machine, None).await;

            let outcome = match tokio::time::timeout(self.policy.timeout, probe.check()).await {
                Ok(Ok(())) => ProbeOutcome::Success,
                Ok(Err(e)) => ProbeOutcome::Failed(format!("{:#}", e)),
                Err(_) => ProbeOutcome::TimedOut(self.policy.timeout),
            };

            let reason = match &outcome {
                ProbeOutcome::Success => None,
                failure => Some(failure.to_string()),
            };

            match machine.record(outcome, started.elapsed()) {
                ReadinessState::Healthy => {
                    self.set_state(probe.name(), &machine, None).await;
                    info!(
                        "{} is healthy after {} attempt(s)",
                        probe.name(),
                        machine.attempts()
                    );
                    return Ok(ReadinessReport {
                        probe: probe.name().to_string(),
                        attempts: machine.attempts(),
                        elapsed: started.elapsed(),
                    });
                }
                ReadinessState::Failed => {
                    self.set_state(probe.name(), &machine, reason.clone()).await;
                    error!(
                        "{} never became healthy: {} consecutive failures",
                        probe.name(),
                        machine.consecutive_failures()
                    );
                    return Err(ReadinessError::Exhausted {
                        probe: probe.name().to_string(),
                        attempts: machine.attempts(),
                        failures: machine.consecutive_failures(),
                        last_error: reason.unwrap_or_default(),
                    });
                }
                _ => {
                    warn!(
                        "{} not ready (attempt {}, {}/{} failures): {}",
                        probe.name(),
                        machine.attempts(),
                        machine.consecutive_failures(),
                        self.policy.retries,
                        reason.as_deref().unwrap_or("unknown")
                    );
                    self.set_state(probe.name(), &machine, reason).await;
                }
            }
        }
    }

    /// [`wait_until_ready`](Self::wait_until_ready), abandoned when `shutdown` fires.
    pub async fn wait_or_cancel(
        &self,
        probe: &dyn ReadinessProbe,
        shutdown: ShutdownSignal,
    ) -> Result<ReadinessReport, ReadinessError> {
        tokio::select! {
            result = self.wait_until_ready(probe) => result,
            _ = shutdown.wait() => {
                warn!("Stopped waiting for {}: shutdown requested", probe.name());
                Err(ReadinessError::Cancelled {
                    probe: probe.name().to_string(),
                })
            }
        }
    }

    async fn set_state(&self, probe: &str, machine: &ReadinessMachine, reason: Option<String>) {
        let mut lock = self.state.write().await;
        *lock = machine.state();

        let event = ReadinessEvent {
            probe: probe.to_string(),
            state: machine.state(),
            attempt: machine.attempts(),
            timestamp: Utc::now(),
            reason,
        };
        debug!("ReadinessGate: {} is now {}", probe, event.state);

        let _ = self.event_tx.send(event);
    }
}
