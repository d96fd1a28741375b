use std::path::PathBuf;

use error_stack::Report;
use error_stack::ResultExt;
use kube::config::KubeConfigOptions;
use kube::config::Kubeconfig;
use kube::Client;
use kube::Config;
use tracing::info;
use tracing::warn;

use crate::infrastructure::k8s::KubernetesError;

/// Build a Kubernetes client.
///
/// An explicit `kubeconfig` path must be readable. Without one the local
/// kubeconfig (`$KUBECONFIG` or `~/.kube/config`) is tried first and the
/// in-cluster service account is used as a fallback.
///
/// # Errors
///
/// - [`KubernetesError::ConnectionFailed`] if no usable configuration is found
pub async fn init_kube_client(
    kubeconfig: Option<PathBuf>,
) -> Result<Client, Report<KubernetesError>> {
    let config = match kubeconfig {
        Some(kubeconfig_path) => {
            // Load kubeconfig from the specified file
            let kubeconfig = Kubeconfig::read_from(&kubeconfig_path).change_context(
                KubernetesError::ConnectionFailed {
                    message: format!(
                        "Failed to read kubeconfig file: {}",
                        kubeconfig_path.display()
                    ),
                },
            )?;

            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .change_context(KubernetesError::ConnectionFailed {
                    message: format!(
                        "Failed to create config from kubeconfig: {}",
                        kubeconfig_path.display()
                    ),
                })?
        }
        None => match Config::from_kubeconfig(&KubeConfigOptions::default()).await {
            Ok(config) => {
                info!("Using local kubeconfig");
                config
            }
            Err(e) => {
                warn!("Local kubeconfig unavailable ({e}), falling back to in-cluster config");
                Config::incluster().change_context(KubernetesError::ConnectionFailed {
                    message: "Failed to load in-cluster configuration".to_string(),
                })?
            }
        },
    };

    Client::try_from(config).change_context(KubernetesError::ConnectionFailed {
        message: "Failed to create Kubernetes client".to_string(),
    })
}
