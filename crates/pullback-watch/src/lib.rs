//! Watches the pods of a Kubernetes deployment and raises a single desktop
//! notification once they recover from `ImagePullBackOff`.

pub mod app;
pub mod config;
mod domain;
mod infrastructure;

// Re-export main modules
pub use domain::backoff;
pub use domain::selector;
pub use domain::watcher;
pub use infrastructure::k8s;
pub use infrastructure::kube_client;
pub use infrastructure::notifier;
