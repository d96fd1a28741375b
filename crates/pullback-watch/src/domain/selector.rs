use derive_more::Display;

/// Identifies the pods of one deployment for the lifetime of a watch.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{namespace}/{label_key}={deployment}")]
pub struct DeploymentSelector {
    namespace: String,
    label_key: String,
    deployment: String,
}

impl DeploymentSelector {
    /// Label key used when none is configured.
    pub const DEFAULT_LABEL_KEY: &'static str = "app";

    pub fn new(namespace: impl Into<String>, deployment: impl Into<String>) -> Self {
        Self::with_label_key(namespace, Self::DEFAULT_LABEL_KEY, deployment)
    }

    pub fn with_label_key(
        namespace: impl Into<String>,
        label_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            label_key: label_key.into(),
            deployment: deployment.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    /// Label selector in the API server syntax, e.g. `app=web`.
    pub fn label_selector(&self) -> String {
        format!("{}={}", self.label_key, self.deployment)
    }
}
