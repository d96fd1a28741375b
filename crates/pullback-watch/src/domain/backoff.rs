//! Classification of pod snapshots and the recovery state machine.
//!
//! A poll cycle reduces the listed pods to a [`BackoffSnapshot`], whose
//! aggregate flag drives [`BackoffState::observe`]. Recovery is the falling
//! edge `InBackOff -> Done`; `Done` is terminal.

use derive_more::Display;
use k8s_openapi::api::core::v1::ContainerStatus;
use k8s_openapi::api::core::v1::Pod;

/// Waiting reason reported by the kubelet while it backs off image pulls.
pub const IMAGE_PULL_BACK_OFF: &str = "ImagePullBackOff";

/// Which container statuses count towards the aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionOptions {
    pub include_init_containers: bool,
}

fn container_in_backoff(status: &ContainerStatus) -> bool {
    status
        .state
        .as_ref()
        .and_then(|state| state.waiting.as_ref())
        .and_then(|waiting| waiting.reason.as_deref())
        == Some(IMAGE_PULL_BACK_OFF)
}

/// Returns true if any container of `pod` is waiting in `ImagePullBackOff`.
pub fn pod_in_backoff(pod: &Pod, options: DetectionOptions) -> bool {
    let Some(status) = pod.status.as_ref() else {
        return false;
    };

    let containers = status.container_statuses.as_deref().unwrap_or_default();
    let init_containers: &[ContainerStatus] = if options.include_init_containers {
        status.init_container_statuses.as_deref().unwrap_or_default()
    } else {
        &[]
    };

    containers
        .iter()
        .chain(init_containers)
        .any(container_in_backoff)
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackoffSnapshot {
    /// Number of pods returned by the query.
    pub pods_seen: usize,
    /// Names of the pods with at least one container in backoff.
    pub pods_in_backoff: Vec<String>,
}

impl BackoffSnapshot {
    pub fn from_pods(pods: &[Pod], options: DetectionOptions) -> Self {
        let pods_in_backoff = pods
            .iter()
            .filter(|pod| pod_in_backoff(pod, options))
            .map(|pod| {
                pod.metadata
                    .name
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string())
            })
            .collect();

        Self {
            pods_seen: pods.len(),
            pods_in_backoff,
        }
    }

    /// Aggregate flag: OR over every pod and container.
    ///
    /// An empty pod list is indistinguishable from a healthy one.
    pub fn in_backoff(&self) -> bool {
        !self.pods_in_backoff.is_empty()
    }
}

/// Recovery state of a watched deployment.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum BackoffState {
    /// Not in backoff on the previous cycle.
    #[display("stable")]
    Stable,
    /// In backoff on the previous cycle.
    #[display("in-backoff")]
    InBackOff { pods: Vec<String> },
    /// Recovery observed. Terminal.
    #[display("done")]
    Done { recovered: Vec<String> },
}

impl BackoffState {
    /// Advance the state machine with the outcome of one successful cycle.
    pub fn observe(self, snapshot: &BackoffSnapshot) -> Self {
        match (self, snapshot.in_backoff()) {
            (Self::Done { recovered }, _) => Self::Done { recovered },
            (Self::InBackOff { pods }, false) => Self::Done { recovered: pods },
            (_, true) => Self::InBackOff {
                pods: snapshot.pods_in_backoff.clone(),
            },
            (Self::Stable, false) => Self::Stable,
        }
    }
}
