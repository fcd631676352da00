use snapshift_core::{ClusterError, ClusterRole, ResourceKind};
use thiserror::Error;

/// Failure category a caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Cluster unreachable or credentials rejected.
    Connection,
    /// Source claim or an expected binding is missing.
    NotFound,
    /// Name collision on create.
    Conflict,
    /// The storage backend reported the snapshot itself failed.
    BackendReported,
    /// The deadline elapsed while waiting for readiness or for a call.
    ReadinessTimeout,
    /// Any other rejection by an API server.
    Api,
    /// The request was rejected before any cluster was contacted.
    InvalidRequest,
}

#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{role} VolumeSnapshot '{snapshot}' is ready but not bound to a VolumeSnapshotContent")]
    MissingBinding { role: ClusterRole, snapshot: String },

    #[error("{role} VolumeSnapshotContent '{content}' does not have a snapshot handle")]
    MissingHandle { role: ClusterRole, content: String },

    #[error("{role} {kind} '{identity}' failed: {message}")]
    BackendReported {
        role: ClusterRole,
        kind: ResourceKind,
        identity: String,
        message: String,
    },

    #[error("timed out waiting for {role} {kind} '{identity}' to become ready")]
    ReadinessTimeout {
        role: ClusterRole,
        kind: ResourceKind,
        identity: String,
    },

    #[error("deadline elapsed during {action} of {role} {kind} '{identity}'")]
    DeadlineExceeded {
        action: &'static str,
        role: ClusterRole,
        kind: ResourceKind,
        identity: String,
    },
}

impl OperationError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Cluster(ClusterError::Connection { .. }) => ErrorCategory::Connection,
            Self::Cluster(ClusterError::NotFound { .. })
            | Self::MissingBinding { .. }
            | Self::MissingHandle { .. } => ErrorCategory::NotFound,
            Self::Cluster(ClusterError::Conflict { .. }) => ErrorCategory::Conflict,
            Self::Cluster(ClusterError::Api { .. } | ClusterError::Malformed { .. }) => {
                ErrorCategory::Api
            }
            Self::BackendReported { .. } => ErrorCategory::BackendReported,
            Self::ReadinessTimeout { .. } | Self::DeadlineExceeded { .. } => {
                ErrorCategory::ReadinessTimeout
            }
            Self::InvalidRequest(_) => ErrorCategory::InvalidRequest,
        }
    }
}

pub type Result<T> = std::result::Result<T, OperationError>;
