use std::future::Future;

use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::Api;
use kube::Client;
use tracing::debug;

use crate::domain::selector::DeploymentSelector;
use crate::infrastructure::k8s::types::KubernetesError;

/// Read-only access to the pods of a deployment.
///
/// The watcher only ever needs a point-in-time list, so this is the seam
/// between the polling loop and the cluster API.
pub trait PodSource: Send + Sync {
    /// List the pods matching `selector` right now.
    ///
    /// # Errors
    ///
    /// - [`KubernetesError::ListFailed`] if the query could not be answered
    fn list_pods(
        &self,
        selector: &DeploymentSelector,
    ) -> impl Future<Output = Result<Vec<Pod>, Report<KubernetesError>>> + Send;
}

/// [`PodSource`] that queries the Kubernetes API server.
#[derive(Clone)]
pub struct KubePodSource {
    client: Client,
}

impl KubePodSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl PodSource for KubePodSource {
    async fn list_pods(
        &self,
        selector: &DeploymentSelector,
    ) -> Result<Vec<Pod>, Report<KubernetesError>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), selector.namespace());
        let label_selector = selector.label_selector();
        let params = ListParams::default().labels(&label_selector);

        let pods = api
            .list(&params)
            .await
            .change_context(KubernetesError::ListFailed {
                message: format!(
                    "pods with labels {label_selector} in namespace {}",
                    selector.namespace()
                ),
            })?;

        debug!(count = pods.items.len(), "listed pods");
        Ok(pods.items)
    }
}
