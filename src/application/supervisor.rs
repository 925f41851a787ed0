use crate::application::shutdown::ShutdownSignal;
use crate::domain::restart::{Backoff, ExitKind, RestartPolicy};
use std::fmt::Display;
use std::future::Future;
use tracing::{error, info, warn};

/// How supervision ended
#[derive(Debug)]
pub enum SupervisorOutcome<E> {
    /// Shutdown was requested; the last run was allowed to finish
    Stopped { runs: u32 },
    /// The task exited and the policy declined to restart it
    Exited { runs: u32, result: Result<(), E> },
}

/// Runs a task and restarts it according to a [`RestartPolicy`]
pub struct Supervisor {
    name: String,
    policy: RestartPolicy,
    backoff: Backoff,
}

impl Supervisor {
    pub fn new(name: impl Into<String>, policy: RestartPolicy, backoff: Backoff) -> Self {
        Self {
            name: name.into(),
            policy,
            backoff,
        }
    }

    /// Supervise tasks produced by `factory` until the policy gives up or
    /// `shutdown` fires.
    ///
    /// Each run gets its own copy of the shutdown signal so it can stop
    /// gracefully; the supervisor never cancels a run mid-flight.
    pub async fn run<F, Fut, E>(&self, mut factory: F, shutdown: ShutdownSignal) -> SupervisorOutcome<E>
    where
        F: FnMut(ShutdownSignal) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let mut runs = 0u32;
        let mut restarts = 0u32;

        loop {
            if shutdown.is_triggered() {
                return SupervisorOutcome::Stopped { runs };
            }

            runs += 1;
            info!("Supervisor [{}]: starting run {} (policy {})", self.name, runs, self.policy);
            let result = factory(shutdown.clone()).await;

            if shutdown.is_triggered() {
                info!("Supervisor [{}]: stopped after run {}", self.name, runs);
                return SupervisorOutcome::Stopped { runs };
            }

            let exit = match &result {
                Ok(()) => {
                    warn!("Supervisor [{}]: run {} exited", self.name, runs);
                    ExitKind::Success
                }
                Err(e) => {
                    error!("Supervisor [{}]: run {} failed: {}", self.name, runs, e);
                    ExitKind::Failure
                }
            };

            if !self.policy.should_restart(exit, restarts) {
                info!(
                    "Supervisor [{}]: not restarting (policy {}, {} restarts)",
                    self.name, self.policy, restarts
                );
                return SupervisorOutcome::Exited { runs, result };
            }

            let delay = self.backoff.delay(restarts);
            restarts += 1;
            info!("Supervisor [{}]: restarting in {:?}", self.name, delay);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.clone().wait() => {
                    info!("Supervisor [{}]: shutdown during backoff", self.name);
                    return SupervisorOutcome::Stopped { runs };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::shutdown::Shutdown;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn backoff() -> Backoff {
        Backoff {
            initial: Duration::from_millis(100),
            max: Duration::from_secs(1),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_policy_runs_once() {
        let shutdown = Shutdown::new();
        let supervisor = Supervisor::new("test", RestartPolicy::No, backoff());

        let outcome = supervisor
            .run(|_| async { Err::<(), _>("boom") }, shutdown.signal())
            .await;

        assert!(matches!(
            outcome,
            SupervisorOutcome::Exited {
                runs: 1,
                result: Err("boom")
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_failure_restarts_until_success() {
        let shutdown = Shutdown::new();
        let supervisor = Supervisor::new(
            "test",
            RestartPolicy::OnFailure { max_restarts: None },
            backoff(),
        );
        let calls = Arc::new(AtomicU32::new(0));

        let outcome = supervisor
            .run(
                |_| {
                    let calls = calls.clone();
                    async move {
                        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                            Err("database not ready")
                        } else {
                            Ok(())
                        }
                    }
                },
                shutdown.signal(),
            )
            .await;

        assert!(matches!(
            outcome,
            SupervisorOutcome::Exited {
                runs: 3,
                result: Ok(())
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_on_failure_gives_up() {
        let shutdown = Shutdown::new();
        let supervisor = Supervisor::new(
            "test",
            RestartPolicy::OnFailure {
                max_restarts: Some(2),
            },
            backoff(),
        );

        let outcome = supervisor
            .run(|_| async { Err::<(), _>("boom") }, shutdown.signal())
            .await;

        assert!(matches!(outcome, SupervisorOutcome::Exited { runs: 3, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unless_stopped_restarts_until_shutdown() {
        let shutdown = Shutdown::new();
        let supervisor = Supervisor::new("test", RestartPolicy::UnlessStopped, backoff());
        let calls = Arc::new(AtomicU32::new(0));
        let trigger = shutdown.clone();

        let outcome = supervisor
            .run(
                |signal| {
                    let calls = calls.clone();
                    let trigger = trigger.clone();
                    async move {
                        let run = calls.fetch_add(1, Ordering::SeqCst) + 1;
                        if run < 4 {
                            return Err("crashed");
                        }
                        // Fourth run "serves" until the stop arrives
                        trigger.trigger();
                        signal.wait().await;
                        Ok(())
                    }
                },
                shutdown.signal(),
            )
            .await;

        assert!(matches!(outcome, SupervisorOutcome::Stopped { runs: 4 }));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_backoff_stops() {
        let shutdown = Shutdown::new();
        let supervisor = Supervisor::new(
            "test",
            RestartPolicy::UnlessStopped,
            Backoff {
                initial: Duration::from_secs(60),
                max: Duration::from_secs(60),
            },
        );
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.trigger();
        });

        let outcome = supervisor
            .run(|_| async { Err::<(), _>("boom") }, shutdown.signal())
            .await;

        assert!(matches!(outcome, SupervisorOutcome::Stopped { runs: 1 }));
    }
}
