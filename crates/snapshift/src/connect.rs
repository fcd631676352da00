use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use snapshift_core::ClusterRole;
use snapshift_operations::providers::KubeClusterClient;
use tracing::info;

use crate::error::{CliError, Result};

/// Where to find the credentials for one cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ConnectionOptions {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

/// Build a client for `role` and verify the API server answers before
/// `deadline`.
pub(crate) async fn connect(
    role: ClusterRole,
    options: &ConnectionOptions,
    deadline: Instant,
) -> Result<KubeClusterClient> {
    within_deadline(role, deadline, establish(role, options)).await
}

async fn within_deadline<T>(
    role: ClusterRole,
    deadline: Instant,
    attempt: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout_at(deadline.into(), attempt)
        .await
        .map_err(|_| CliError::ConnectTimeout { role })?
}

async fn establish(role: ClusterRole, options: &ConnectionOptions) -> Result<KubeClusterClient> {
    info!(%role, "connecting to cluster");
    let config = load_config(role, options).await?;
    let client = Client::try_from(config).map_err(|source| CliError::Client { role, source })?;
    let cluster = KubeClusterClient::new(client, role);
    let version = cluster.check_connection().await?;
    info!(%role, %version, "connected to cluster");
    Ok(cluster)
}

async fn load_config(role: ClusterRole, options: &ConnectionOptions) -> Result<Config> {
    let kube_options = KubeConfigOptions {
        context: options.context.clone(),
        ..KubeConfigOptions::default()
    };
    let kubeconfig_err = |source| CliError::Kubeconfig { role, source };

    match (&options.kubeconfig, &options.context) {
        (Some(path), _) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(kubeconfig_err)?;
            Config::from_custom_kubeconfig(kubeconfig, &kube_options)
                .await
                .map_err(kubeconfig_err)
        }
        (None, Some(_)) => Config::from_kubeconfig(&kube_options)
            .await
            .map_err(kubeconfig_err),
        (None, None) => Config::infer()
            .await
            .map_err(|source| CliError::InferConfig { role, source }),
    }
}
