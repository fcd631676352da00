use thiserror::Error;

use crate::types::{ClusterRole, ResourceKind};

/// Failure reported by a cluster connection.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("cannot reach {role} cluster: {message}")]
    Connection { role: ClusterRole, message: String },

    #[error("{kind} '{identity}' not found in {role} cluster")]
    NotFound {
        role: ClusterRole,
        kind: ResourceKind,
        identity: String,
    },

    #[error("{kind} '{identity}' already exists in {role} cluster")]
    Conflict {
        role: ClusterRole,
        kind: ResourceKind,
        identity: String,
    },

    #[error("{role} cluster rejected request for {kind} '{identity}' ({code}): {message}")]
    Api {
        role: ClusterRole,
        kind: ResourceKind,
        identity: String,
        code: u16,
        message: String,
    },

    #[error("{kind} '{identity}' in {role} cluster is malformed: {reason}")]
    Malformed {
        role: ClusterRole,
        kind: ResourceKind,
        identity: String,
        reason: String,
    },
}

impl ClusterError {
    #[must_use]
    pub fn role(&self) -> ClusterRole {
        match self {
            Self::Connection { role, .. }
            | Self::NotFound { role, .. }
            | Self::Conflict { role, .. }
            | Self::Api { role, .. }
            | Self::Malformed { role, .. } => *role,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown deletion policy '{0}'")]
pub struct UnknownDeletionPolicy(pub String);

pub type Result<T> = std::result::Result<T, ClusterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_error_names_offending_identity() {
        let err = ClusterError::Conflict {
            role: ClusterRole::Destination,
            kind: ResourceKind::SnapshotContent,
            identity: "snapcontent-db".to_string(),
        };

        let msg = err.to_string();

        assert!(msg.contains("snapcontent-db"));
        assert!(msg.contains("already exists"));
        assert!(msg.contains("destination"));
    }

    #[test]
    fn role_is_available_for_every_variant() {
        let err = ClusterError::Connection {
            role: ClusterRole::Origin,
            message: "connection refused".to_string(),
        };

        assert_eq!(err.role(), ClusterRole::Origin);
        assert!(!err.is_not_found());
    }
}
