// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Destroy Status Poller
//!
//! Drives a stack deletion to completion after the delete request has been
//! acknowledged. The first status check happens one `interval` after the
//! acknowledgement, then once per `interval`. Every wait, including an in-flight status call, races the
//! deadline; the deadline is the only way a poll run is cancelled.
//!
//! Transition rules live in [`DestroyPoll`]; this module only owns the clock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::application::lifecycle::LifecycleError;
use crate::application::stack_handle::StackHandle;
use crate::domain::config::LifecycleConfig;
use crate::domain::poll::{DestroyPoll, PollState};
use crate::domain::stack::StackStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    pub interval: Duration,
    pub timeout: Duration,
    pub max_consecutive_unknown: u32,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self::from(&LifecycleConfig::default())
    }
}

impl From<&LifecycleConfig> for PollerSettings {
    fn from(config: &LifecycleConfig) -> Self {
        Self {
            interval: config.poll_interval,
            timeout: config.destroy_timeout,
            max_consecutive_unknown: config.max_unknown_polls,
        }
    }
}

/// One status observation made while the stack was still present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSample {
    pub attempt: u32,
    pub observed_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub attempts: u32,
    pub elapsed: Duration,
    pub last_status: Option<String>,
}

#[async_trait]
pub trait PollObserver: Send + Sync {
    async fn on_progress(&self, sample: &PollSample);

    async fn on_status_unknown(&self, _attempt: u32, _reason: &str) {}

    async fn on_deleted(&self, _outcome: &PollOutcome) {}
}

/// Observer that only logs.
pub struct TracingObserver;

#[async_trait]
impl PollObserver for TracingObserver {
    async fn on_progress(&self, sample: &PollSample) {
        info!(attempt = sample.attempt, status = %sample.status, "Stack still present");
    }
}

#[derive(Debug, Clone)]
pub struct StatusPoller {
    settings: PollerSettings,
}

impl StatusPoller {
    pub fn new(settings: PollerSettings) -> Self {
        Self { settings }
    }

    /// Poll `handle` until the stack is gone, the deadline passes, or status
    /// checks keep failing for reasons other than absence.
    pub async fn poll_until_deleted(
        &self,
        handle: &StackHandle,
        observer: &dyn PollObserver,
    ) -> Result<PollOutcome, LifecycleError> {
        let started = Instant::now();
        let deadline = started + self.settings.timeout;
        let mut poll = DestroyPoll::new(self.settings.timeout, self.settings.max_consecutive_unknown);

        let mut ticker = interval_at(started + self.settings.interval, self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            stack = %handle.name(),
            interval = ?self.settings.interval,
            timeout = ?self.settings.timeout,
            "Checking status"
        );

        loop {
            tokio::select! {
                biased;
                _ = sleep_until(deadline) => {
                    poll.expire();
                    break;
                }
                _ = ticker.tick() => {}
            }

            let status = tokio::select! {
                biased;
                _ = sleep_until(deadline) => {
                    poll.expire_in_flight();
                    break;
                }
                status = handle.status() => status,
            };

            let elapsed = started.elapsed();
            let state = poll.observe(elapsed, &status);
            metrics::counter!("devenv_destroy_status_polls_total", "result" => poll_result_label(&status))
                .increment(1);

            match (&status, state) {
                (StackStatus::Active(current), PollState::Polling) => {
                    observer
                        .on_progress(&PollSample {
                            attempt: poll.attempts(),
                            observed_at: Utc::now(),
                            elapsed,
                            status: current.clone(),
                        })
                        .await;
                }
                (StackStatus::Unknown(reason), PollState::Polling) => {
                    warn!(
                        stack = %handle.name(),
                        attempt = poll.attempts(),
                        error = %reason,
                        "Status check failed; stack state unknown"
                    );
                    observer.on_status_unknown(poll.attempts(), reason).await;
                }
                _ => break,
            }
        }

        let elapsed = started.elapsed();
        match poll.state() {
            PollState::Completed => {
                let outcome = PollOutcome {
                    attempts: poll.attempts(),
                    elapsed,
                    last_status: poll.last_status().map(str::to_string),
                };
                info!(
                    stack = %handle.name(),
                    attempts = outcome.attempts,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "Stack deletion complete"
                );
                observer.on_deleted(&outcome).await;
                Ok(outcome)
            }
            PollState::StatusUnavailable => Err(LifecycleError::StatusUnavailable {
                stack: handle.name().clone(),
                attempts: poll.attempts(),
                reason: poll.last_unknown().unwrap_or("unknown").to_string(),
            }),
            PollState::TimedOut | PollState::Polling => {
                warn!(stack = %handle.name(), attempts = poll.attempts(), "Stack deletion timeout exceeded");
                Err(LifecycleError::DestroyTimedOut {
                    stack: handle.name().clone(),
                    elapsed,
                    attempts: poll.attempts(),
                    last_status: poll.last_status().map(str::to_string),
                })
            }
        }
    }
}

fn poll_result_label(status: &StackStatus) -> &'static str {
    match status {
        StackStatus::Active(_) => "active",
        StackStatus::Deleted => "deleted",
        StackStatus::Unknown(_) => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provisioning::{DescribedStack, ProvisioningClient, ProvisioningError};
    use crate::domain::stack::{StackName, StackOutputs, StackSpec, StackSummary};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Answers describe calls from a script; once the script runs out it keeps
    /// repeating `fallback`.
    struct ScriptedDescribe {
        script: Mutex<Vec<Result<DescribedStack, ProvisioningError>>>,
        fallback: String,
        calls: AtomicU32,
        call_times: Mutex<Vec<Duration>>,
        started: Instant,
        latency: Duration,
    }

    impl ScriptedDescribe {
        fn new(script: Vec<Result<DescribedStack, ProvisioningError>>, fallback: &str) -> Self {
            Self {
                script: Mutex::new(script),
                fallback: fallback.to_string(),
                calls: AtomicU32::new(0),
                call_times: Mutex::new(Vec::new()),
                started: Instant::now(),
                latency: Duration::ZERO,
            }
        }

        fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }
    }

    #[async_trait]
    impl ProvisioningClient for ScriptedDescribe {
        async fn create_stack(&self, _spec: &StackSpec) -> Result<(), ProvisioningError> {
            Ok(())
        }

        async fn delete_stack(&self, _name: &StackName) -> Result<(), ProvisioningError> {
            Ok(())
        }

        async fn describe_stack(&self, name: &StackName) -> Result<DescribedStack, ProvisioningError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.call_times.lock().await.push(self.started.elapsed());
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            let mut script = self.script.lock().await;
            if script.is_empty() {
                Ok(DescribedStack {
                    name: name.to_string(),
                    status: self.fallback.clone(),
                })
            } else {
                script.remove(0)
            }
        }

        async fn stack_outputs(&self, _name: &StackName) -> Result<StackOutputs, ProvisioningError> {
            Ok(StackOutputs::new())
        }

        async fn list_stacks(&self) -> Result<Vec<StackSummary>, ProvisioningError> {
            Ok(vec![])
        }

        async fn caller_identity(&self) -> Result<String, ProvisioningError> {
            Ok("000000000000".to_string())
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        progress: Mutex<Vec<PollSample>>,
        unknown: Mutex<Vec<u32>>,
        deleted: Mutex<Option<PollOutcome>>,
    }

    #[async_trait]
    impl PollObserver for RecordingObserver {
        async fn on_progress(&self, sample: &PollSample) {
            self.progress.lock().await.push(sample.clone());
        }

        async fn on_status_unknown(&self, attempt: u32, _reason: &str) {
            self.unknown.lock().await.push(attempt);
        }

        async fn on_deleted(&self, outcome: &PollOutcome) {
            *self.deleted.lock().await = Some(outcome.clone());
        }
    }

    fn in_progress() -> Result<DescribedStack, ProvisioningError> {
        Ok(DescribedStack {
            name: "dev1".to_string(),
            status: "DELETE_IN_PROGRESS".to_string(),
        })
    }

    fn absent() -> Result<DescribedStack, ProvisioningError> {
        Err(ProvisioningError::Service {
            code: "ValidationError".to_string(),
            message: "Stack with id dev1 does not exist".to_string(),
            status: Some(400),
        })
    }

    fn throttled() -> Result<DescribedStack, ProvisioningError> {
        Err(ProvisioningError::Service {
            code: "Throttling".to_string(),
            message: "Rate exceeded".to_string(),
            status: Some(400),
        })
    }

    fn handle(client: Arc<ScriptedDescribe>) -> StackHandle {
        StackHandle::new(StackName::new("dev1").unwrap(), client)
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_at_third_poll_after_thirty_seconds() {
        let client = Arc::new(ScriptedDescribe::new(
            vec![in_progress(), in_progress(), absent()],
            "CREATE_COMPLETE",
        ));
        let observer = RecordingObserver::default();
        let poller = StatusPoller::new(PollerSettings::default());

        let outcome = poller
            .poll_until_deleted(&handle(client.clone()), &observer)
            .await
            .unwrap();

        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.elapsed.as_secs(), 30);
        assert_eq!(outcome.last_status.as_deref(), Some("DELETE_IN_PROGRESS"));

        let progress = observer.progress.lock().await;
        let offsets: Vec<_> = progress.iter().map(|s| s.elapsed.as_secs()).collect();
        assert_eq!(offsets, vec![10, 20]);
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
        assert_eq!(observer.deleted.lock().await.as_ref(), Some(&outcome));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_polling_at_first_absence() {
        for k in 1..=5u32 {
            let mut script: Vec<_> = (1..k).map(|_| in_progress()).collect();
            script.push(absent());
            let client = Arc::new(ScriptedDescribe::new(script, "DELETE_IN_PROGRESS"));
            let poller = StatusPoller::new(PollerSettings::default());

            let outcome = poller
                .poll_until_deleted(&handle(client.clone()), &TracingObserver)
                .await
                .unwrap();

            assert_eq!(outcome.attempts, k);
            // Give a lingering task the chance to poll again; none should.
            tokio::time::sleep(Duration::from_secs(60)).await;
            assert_eq!(client.calls.load(Ordering::SeqCst), k);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_are_time_ordered_on_the_cadence() {
        let client = Arc::new(ScriptedDescribe::new(vec![], "DELETE_IN_PROGRESS"));
        let poller = StatusPoller::new(PollerSettings::default());

        let _ = poller
            .poll_until_deleted(&handle(client.clone()), &RecordingObserver::default())
            .await;

        let times = client.call_times.lock().await;
        assert_eq!(times.len(), 59);
        assert!(times.windows(2).all(|w| (w[1] - w[0]).as_secs() == 10));
        // Nothing is checked before one full interval has passed.
        assert_eq!(times.first().map(Duration::as_secs), Some(10));
        assert_eq!(times.last().map(Duration::as_secs), Some(590));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_ten_simulated_minutes() {
        let client = Arc::new(ScriptedDescribe::new(vec![], "DELETE_IN_PROGRESS"));
        let poller = StatusPoller::new(PollerSettings::default());
        let started = Instant::now();

        let err = poller
            .poll_until_deleted(&handle(client.clone()), &RecordingObserver::default())
            .await
            .unwrap_err();

        match err {
            LifecycleError::DestroyTimedOut { attempts, elapsed, last_status, .. } => {
                assert_eq!(attempts, 59);
                assert_eq!(elapsed.as_secs(), 600);
                assert_eq!(last_status.as_deref(), Some("DELETE_IN_PROGRESS"));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(started.elapsed().as_secs(), 600);
        assert_eq!(client.calls.load(Ordering::SeqCst), 59);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cancels_in_flight_status_call() {
        let client = Arc::new(
            ScriptedDescribe::new(vec![], "DELETE_IN_PROGRESS").with_latency(Duration::from_secs(45)),
        );
        let poller = StatusPoller::new(PollerSettings {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(60),
            max_consecutive_unknown: 3,
        });
        let started = Instant::now();

        let err = poller
            .poll_until_deleted(&handle(client.clone()), &RecordingObserver::default())
            .await
            .unwrap_err();

        assert_eq!(started.elapsed().as_secs(), 60);
        // Calls at t=10 and t=55; the second one was still in flight at the
        // deadline and is counted as an attempt.
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
        match err {
            LifecycleError::DestroyTimedOut { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_absence_failures_are_never_completion() {
        let client = Arc::new(ScriptedDescribe::new(
            vec![throttled(), in_progress(), throttled(), throttled(), throttled()],
            "DELETE_IN_PROGRESS",
        ));
        let observer = RecordingObserver::default();
        let poller = StatusPoller::new(PollerSettings::default());

        let err = poller
            .poll_until_deleted(&handle(client), &observer)
            .await
            .unwrap_err();

        match err {
            LifecycleError::StatusUnavailable { attempts, reason, .. } => {
                assert_eq!(attempts, 5);
                assert!(reason.contains("Throttling"));
            }
            other => panic!("expected status unavailable, got {:?}", other),
        }
        assert_eq!(*observer.unknown.lock().await, vec![1, 3, 4]);
        assert!(observer.deleted.lock().await.is_none());
    }
}
