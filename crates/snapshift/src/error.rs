use kube::config::{InferConfigError, KubeconfigError};
use snapshift_core::{ClusterError, ClusterRole};
use snapshift_operations::OperationError;
use snapshift_operations::operations::MigrationFailure;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("failed to load {role} kubeconfig")]
    Kubeconfig {
        role: ClusterRole,
        #[source]
        source: KubeconfigError,
    },

    #[error("failed to infer {role} cluster configuration")]
    InferConfig {
        role: ClusterRole,
        #[source]
        source: InferConfigError,
    },

    #[error("failed to create {role} cluster client")]
    Client {
        role: ClusterRole,
        #[source]
        source: kube::Error,
    },

    #[error("timed out connecting to {role} cluster")]
    ConnectTimeout { role: ClusterRole },

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    InvalidRequest(OperationError),

    #[error("snapshot migration failed")]
    Migration(#[source] Box<MigrationFailure>),
}

impl From<MigrationFailure> for CliError {
    fn from(failure: MigrationFailure) -> Self {
        Self::Migration(Box::new(failure))
    }
}

pub(crate) type Result<T> = std::result::Result<T, CliError>;
