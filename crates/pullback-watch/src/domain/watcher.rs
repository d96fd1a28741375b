use std::time::Duration;

use error_stack::Report;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::domain::backoff::BackoffSnapshot;
use crate::domain::backoff::BackoffState;
use crate::domain::backoff::DetectionOptions;
use crate::domain::selector::DeploymentSelector;
use crate::infrastructure::k8s::KubernetesError;
use crate::infrastructure::k8s::PodSource;

/// How the watcher paces its queries and tolerates failed ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fixed wait after every cycle, failed or not.
    pub interval: Duration,
    /// Give up once this many queries in a row have failed. `None` retries forever.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_consecutive_failures: None,
        }
    }
}

/// Delivered once, when the deployment leaves `ImagePullBackOff`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovery {
    /// 1-based poll cycle on which recovery was observed.
    pub cycle: u64,
    /// Pods that were in backoff on the cycle before.
    pub recovered_pods: Vec<String>,
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Gave up after {failures} consecutive failed pod queries")]
    TooManyFailures { failures: u32 },
    #[error("Recovery receiver was dropped")]
    ReceiverDropped,
}

/// Polls the pods of one deployment until they recover from `ImagePullBackOff`.
pub struct PodStatusWatcher<S> {
    source: S,
    selector: DeploymentSelector,
    retry: RetryPolicy,
    detection: DetectionOptions,
}

impl<S: PodSource> PodStatusWatcher<S> {
    pub fn new(source: S, selector: DeploymentSelector) -> Self {
        Self {
            source,
            selector,
            retry: RetryPolicy::default(),
            detection: DetectionOptions::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_detection(mut self, detection: DetectionOptions) -> Self {
        self.detection = detection;
        self
    }

    /// Query the pods once and summarize them.
    ///
    /// # Errors
    ///
    /// - [`KubernetesError::ListFailed`] if the pods could not be listed
    pub async fn poll(&self) -> Result<BackoffSnapshot, Report<KubernetesError>> {
        let pods = self.source.list_pods(&self.selector).await?;
        Ok(BackoffSnapshot::from_pods(&pods, self.detection))
    }

    /// Run the polling loop until recovery is observed.
    ///
    /// The loop sends exactly one [`Recovery`] on `recovery_sender` and
    /// returns. Failed queries are logged and retried after the configured
    /// interval without touching the backoff state.
    ///
    /// # Errors
    ///
    /// - [`WatchError::TooManyFailures`] if a failure cap is configured and exceeded
    /// - [`WatchError::ReceiverDropped`] if nobody is waiting for the recovery
    #[tracing::instrument(
        skip(self, recovery_sender),
        fields(namespace = %self.selector.namespace(), deployment = %self.selector.deployment())
    )]
    pub async fn run(
        self,
        recovery_sender: oneshot::Sender<Recovery>,
    ) -> Result<(), Report<WatchError>> {
        info!(
            interval = ?self.retry.interval,
            selector = %self.selector,
            "Starting pod status watcher"
        );

        let mut state = BackoffState::Stable;
        let mut consecutive_failures = 0u32;
        let mut cycle = 0u64;

        loop {
            cycle += 1;

            match self.poll().await {
                Ok(snapshot) => {
                    consecutive_failures = 0;
                    for pod in &snapshot.pods_in_backoff {
                        warn!(pod = %pod, "Pod is in ImagePullBackOff status");
                    }

                    state = state.observe(&snapshot);
                    if let BackoffState::Done { recovered } = state {
                        info!(cycle, ?recovered, "Pods recovered from ImagePullBackOff");
                        return recovery_sender
                            .send(Recovery {
                                cycle,
                                recovered_pods: recovered,
                            })
                            .map_err(|_| Report::new(WatchError::ReceiverDropped));
                    }

                    debug!(cycle, %state, pods_seen = snapshot.pods_seen, "Poll cycle complete");
                }
                Err(e) => {
                    consecutive_failures += 1;
                    error!(cycle, consecutive_failures, "Error fetching pods: {e:?}");

                    if let Some(max) = self.retry.max_consecutive_failures {
                        if consecutive_failures > max {
                            return Err(e.change_context(WatchError::TooManyFailures {
                                failures: consecutive_failures,
                            }));
                        }
                    }
                }
            }

            tokio::time::sleep(self.retry.interval).await;
        }
    }
}
