//! Kubernetes integration module.
//!
//! The main components are:
//! - [`PodSource`]: Lists the pods currently matching a deployment selector
//! - [`KubePodSource`]: [`PodSource`] backed by the cluster API
//! - [`KubernetesError`]: Errors raised while talking to the cluster

pub mod pod_source;
pub mod types;

pub use pod_source::KubePodSource;
pub use pod_source::PodSource;
pub use types::KubernetesError;
