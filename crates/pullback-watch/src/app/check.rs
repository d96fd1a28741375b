use std::io::Write;

use anyhow::Context;
use anyhow::Result;

use crate::config::CheckArgs;
use crate::domain::backoff::BackoffSnapshot;
use crate::domain::selector::DeploymentSelector;
use crate::domain::watcher::PodStatusWatcher;
use crate::infrastructure::k8s::KubePodSource;
use crate::infrastructure::kube_client;

/// Run the `check` command: one poll, pods in backoff printed to stdout.
pub async fn run_check(args: CheckArgs) -> Result<BackoffSnapshot> {
    let args = args.target;
    let client = kube_client::init_kube_client(args.kubeconfig.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize Kubernetes client: {e:?}"))?;

    let selector = args.selector();
    let watcher = PodStatusWatcher::new(KubePodSource::new(client), selector.clone())
        .with_detection(args.detection());

    let snapshot = watcher
        .poll()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to query pods: {e:?}"))?;

    tracing::info!(
        selector = %selector,
        pods_seen = snapshot.pods_seen,
        in_backoff = snapshot.pods_in_backoff.len(),
        "Check complete"
    );

    write_report(&mut std::io::stdout().lock(), &selector, &snapshot)?;
    Ok(snapshot)
}

/// Write one `namespace/name` line per pod in backoff.
fn write_report<W: Write>(
    out: &mut W,
    selector: &DeploymentSelector,
    snapshot: &BackoffSnapshot,
) -> Result<()> {
    for pod in &snapshot.pods_in_backoff {
        writeln!(out, "{}/{}", selector.namespace(), pod).context("write check report failed")?;
    }
    Ok(())
}
