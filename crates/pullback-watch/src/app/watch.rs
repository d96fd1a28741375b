use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::NotifierKind;
use crate::config::WatchArgs;
use crate::domain::watcher::PodStatusWatcher;
use crate::domain::watcher::Recovery;
use crate::domain::watcher::WatchError;
use crate::infrastructure::k8s::KubePodSource;
use crate::infrastructure::k8s::PodSource;
use crate::infrastructure::kube_client;
use crate::infrastructure::notifier::DesktopNotifier;
use crate::infrastructure::notifier::LogNotifier;
use crate::infrastructure::notifier::Notification;
use crate::infrastructure::notifier::Notifier;

/// How a watch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Recovery observed and the notification delivered.
    Notified(Recovery),
    /// Interrupted by a shutdown signal before recovery.
    Interrupted,
}

/// Run the `watch` command: poll in the background, notify once on recovery.
pub async fn run_watch(args: WatchArgs) -> Result<Outcome> {
    let client = kube_client::init_kube_client(args.target.kubeconfig.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize Kubernetes client: {e:?}"))?;

    let watcher = PodStatusWatcher::new(KubePodSource::new(client), args.selector())
        .with_retry_policy(args.retry_policy())
        .with_detection(args.detection());

    let notifier: Arc<dyn Notifier> = match args.notifier {
        NotifierKind::Desktop => Arc::new(DesktopNotifier),
        NotifierKind::Log => Arc::new(LogNotifier),
    };

    run_watch_with(watcher, notifier, args.notification(), shutdown_signal()).await
}

/// Start `watcher` in the background and race its recovery against `shutdown`.
///
/// If `shutdown` resolves first the watcher task is aborted and nothing is
/// sent. An error from `shutdown` itself is returned as is.
pub async fn run_watch_with<S, F>(
    watcher: PodStatusWatcher<S>,
    notifier: Arc<dyn Notifier>,
    notification: Notification,
    shutdown: F,
) -> Result<Outcome>
where
    S: PodSource + 'static,
    F: Future<Output = Result<()>>,
{
    let (recovery_sender, recovery_receiver) = oneshot::channel();
    let watcher_task = tokio::spawn(async move {
        let result = watcher.run(recovery_sender).await;
        tracing::info!("Pod status watcher task completed");
        result
    });
    let watcher_abort = watcher_task.abort_handle();

    tokio::select! {
        outcome = wait_and_notify(recovery_receiver, watcher_task, notifier, notification) => outcome,
        result = shutdown => {
            watcher_abort.abort();
            result?;
            tracing::info!("Shutdown signal received, stopping watch without notification");
            Ok(Outcome::Interrupted)
        }
    }
}

/// Block until the watcher reports recovery, then deliver `notification`.
///
/// A watcher that ends without reporting recovery, and a notification that
/// cannot be delivered, are both returned as errors. Delivery runs on the
/// blocking pool since desktop notifiers wait on the session bus.
pub async fn wait_and_notify(
    recovery_receiver: oneshot::Receiver<Recovery>,
    watcher_task: JoinHandle<Result<(), error_stack::Report<WatchError>>>,
    notifier: Arc<dyn Notifier>,
    notification: Notification,
) -> Result<Outcome> {
    let recovery = match recovery_receiver.await {
        Ok(recovery) => recovery,
        Err(_) => {
            // sender dropped: the task is finished, surface why
            return match watcher_task.await {
                Ok(Err(e)) => Err(anyhow::anyhow!("Pod status watcher failed: {e:?}")),
                Ok(Ok(())) => Err(anyhow::anyhow!(
                    "Pod status watcher stopped without reporting recovery"
                )),
                Err(e) => Err(anyhow::anyhow!("Pod status watcher task failed: {e}")),
            };
        }
    };

    tracing::info!(
        cycle = recovery.cycle,
        recovered = ?recovery.recovered_pods,
        "Recovery observed, sending notification"
    );

    tokio::task::spawn_blocking(move || notifier.notify(&notification))
        .await
        .map_err(|e| anyhow::anyhow!("Notification task failed: {e}"))?
        .map_err(|e| anyhow::anyhow!("Notification delivery failed: {e:?}"))?;

    Ok(Outcome::Notified(recovery))
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Received Ctrl+C");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    use error_stack::Report;
    use k8s_openapi::api::core::v1::ContainerState;
    use k8s_openapi::api::core::v1::ContainerStateWaiting;
    use k8s_openapi::api::core::v1::ContainerStatus;
    use k8s_openapi::api::core::v1::Pod;
    use k8s_openapi::api::core::v1::PodStatus;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use similar_asserts::assert_eq;
    use test_log::test;

    use super::*;
    use crate::domain::backoff::IMAGE_PULL_BACK_OFF;
    use crate::domain::selector::DeploymentSelector;
    use crate::infrastructure::k8s::KubernetesError;
    use crate::infrastructure::notifier::NotifyError;

    #[derive(Default)]
    struct CountingNotifier {
        sent: AtomicUsize,
        fail: bool,
    }

    impl Notifier for CountingNotifier {
        fn notify(&self, notification: &Notification) -> Result<(), Report<NotifyError>> {
            if self.fail {
                return Err(Report::new(NotifyError::DeliveryFailed {
                    title: notification.title.clone(),
                }));
            }
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Reports the queued backoff flags in order, then healthy pods forever.
    struct QueuedPodSource(Mutex<VecDeque<bool>>);

    impl QueuedPodSource {
        fn new(steps: impl IntoIterator<Item = bool>) -> Self {
            Self(Mutex::new(steps.into_iter().collect()))
        }
    }

    impl PodSource for QueuedPodSource {
        async fn list_pods(
            &self,
            _selector: &DeploymentSelector,
        ) -> Result<Vec<Pod>, Report<KubernetesError>> {
            let in_backoff = self.0.lock().unwrap().pop_front().unwrap_or(false);
            let waiting = in_backoff.then(|| ContainerStateWaiting {
                reason: Some(IMAGE_PULL_BACK_OFF.to_string()),
                message: None,
            });
            Ok(vec![Pod {
                metadata: ObjectMeta {
                    name: Some("web-1".to_string()),
                    ..Default::default()
                },
                spec: None,
                status: Some(PodStatus {
                    container_statuses: Some(vec![ContainerStatus {
                        name: "main".to_string(),
                        state: Some(ContainerState {
                            waiting,
                            ..Default::default()
                        }),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
            }])
        }
    }

    fn watcher(steps: impl IntoIterator<Item = bool>) -> PodStatusWatcher<QueuedPodSource> {
        PodStatusWatcher::new(
            QueuedPodSource::new(steps),
            DeploymentSelector::new("shop", "web"),
        )
    }

    fn recovery() -> Recovery {
        Recovery {
            cycle: 3,
            recovered_pods: vec!["web-2".to_string()],
        }
    }

    #[test(tokio::test)]
    async fn notifies_once_on_recovery() {
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            tx.send(recovery()).expect("receiver alive");
            Ok::<(), Report<WatchError>>(())
        });
        let notifier = Arc::new(CountingNotifier::default());

        let outcome = wait_and_notify(rx, task, notifier.clone(), Notification::default())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Notified(recovery()));
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 1);
    }

    #[test(tokio::test)]
    async fn notification_failure_is_fatal() {
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            tx.send(recovery()).expect("receiver alive");
            Ok::<(), Report<WatchError>>(())
        });
        let notifier = Arc::new(CountingNotifier {
            fail: true,
            ..Default::default()
        });

        let result = wait_and_notify(rx, task, notifier, Notification::default()).await;

        let err = result.expect_err("delivery failure should propagate");
        assert!(err.to_string().contains("Notification delivery failed"));
    }

    #[test(tokio::test)]
    async fn watcher_error_is_reported() {
        let (tx, rx) = oneshot::channel::<Recovery>();
        let task = tokio::spawn(async move {
            drop(tx);
            Err::<(), _>(Report::new(WatchError::TooManyFailures { failures: 4 }))
        });
        let notifier = Arc::new(CountingNotifier::default());

        let result = wait_and_notify(rx, task, notifier.clone(), Notification::default()).await;

        let err = result.expect_err("watcher failure should propagate");
        assert!(err.to_string().contains("Pod status watcher failed"));
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 0);
    }

    #[test(tokio::test(start_paused = true))]
    async fn shutdown_before_recovery_skips_notification() {
        let notifier = Arc::new(CountingNotifier::default());

        let outcome = run_watch_with(
            watcher([true, true, true]),
            notifier.clone(),
            Notification::default(),
            async { Ok::<(), anyhow::Error>(()) },
        )
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::Interrupted);
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 0);
    }

    #[test(tokio::test(start_paused = true))]
    async fn shutdown_error_is_returned() {
        let notifier = Arc::new(CountingNotifier::default());

        let result = run_watch_with(
            watcher([true]),
            notifier.clone(),
            Notification::default(),
            async { Err::<(), _>(anyhow::anyhow!("signal handler unavailable")) },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 0);
    }

    #[test(tokio::test(start_paused = true))]
    async fn recovery_without_shutdown_notifies() {
        let notifier = Arc::new(CountingNotifier::default());

        let outcome = run_watch_with(
            watcher([false, true, false]),
            notifier.clone(),
            Notification::default(),
            std::future::pending::<Result<()>>(),
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            Outcome::Notified(Recovery {
                cycle: 3,
                recovered_pods: vec!["web-1".to_string()],
            })
        );
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 1);
    }
}
