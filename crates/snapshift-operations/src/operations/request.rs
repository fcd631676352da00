use std::time::Duration;

use snapshift_core::{ClusterRole, ObjectRef, SnapshotRef};

use crate::{OperationError, Result};

/// Overall deadline applied when the caller does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Request to replicate a destination claim from the replicated snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationClaimRequest {
    pub name: String,
}

/// Everything the caller asks of one migration run.
///
/// Optional names fall back to defaults in [`MigrationRequest::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRequest {
    pub source_claim: ObjectRef,
    pub snapshot_name: Option<String>,
    pub dest_snapshot_name: Option<String>,
    pub dest_namespace: Option<String>,
    pub snapshot_class: Option<String>,
    pub dest_claim: Option<DestinationClaimRequest>,
    /// Deadline for the whole saga, not per step.
    pub timeout: Duration,
}

impl MigrationRequest {
    #[must_use]
    pub fn new(source_claim: ObjectRef) -> Self {
        Self {
            source_claim,
            snapshot_name: None,
            dest_snapshot_name: None,
            dest_namespace: None,
            snapshot_class: None,
            dest_claim: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_snapshot_name(mut self, name: impl Into<String>) -> Self {
        self.snapshot_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_dest_snapshot_name(mut self, name: impl Into<String>) -> Self {
        self.dest_snapshot_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_dest_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.dest_namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn with_snapshot_class(mut self, class: impl Into<String>) -> Self {
        self.snapshot_class = Some(class.into());
        self
    }

    #[must_use]
    pub fn with_dest_claim(mut self, name: impl Into<String>) -> Self {
        self.dest_claim = Some(DestinationClaimRequest { name: name.into() });
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// # Errors
    ///
    /// Returns [`OperationError::InvalidRequest`] if the source claim identity
    /// or a requested destination claim name is empty.
    pub fn validate(&self) -> Result<()> {
        if self.source_claim.name.is_empty() {
            return Err(OperationError::InvalidRequest(
                "source claim name is required".to_string(),
            ));
        }
        if self.source_claim.namespace.is_empty() {
            return Err(OperationError::InvalidRequest(
                "source claim namespace is required".to_string(),
            ));
        }
        if self.dest_claim.as_ref().is_some_and(|c| c.name.is_empty()) {
            return Err(OperationError::InvalidRequest(
                "destination claim name is required when creating a destination claim"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Apply defaults: the snapshot name becomes
    /// `<claim>-snapshot-<unix_timestamp>`, and the destination snapshot
    /// name and namespace mirror the origin's.
    #[must_use]
    pub fn resolve(&self, unix_timestamp: i64) -> MigrationPlan {
        let source = &self.source_claim;
        let snapshot_name = non_empty(self.snapshot_name.as_deref()).map_or_else(
            || default_snapshot_name(&source.name, unix_timestamp),
            str::to_string,
        );
        let dest_snapshot_name = non_empty(self.dest_snapshot_name.as_deref())
            .map_or_else(|| snapshot_name.clone(), str::to_string);
        let dest_namespace = non_empty(self.dest_namespace.as_deref())
            .map_or_else(|| source.namespace.clone(), str::to_string);

        MigrationPlan {
            source_claim: source.clone(),
            origin_snapshot: SnapshotRef::new(ClusterRole::Origin, &source.namespace, snapshot_name),
            dest_claim: self
                .dest_claim
                .as_ref()
                .map(|claim| ObjectRef::new(&dest_namespace, &claim.name)),
            dest_snapshot: SnapshotRef::new(
                ClusterRole::Destination,
                dest_namespace,
                dest_snapshot_name,
            ),
            snapshot_class: non_empty(self.snapshot_class.as_deref()).map(str::to_string),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[must_use]
pub fn default_snapshot_name(claim_name: &str, unix_timestamp: i64) -> String {
    format!("{claim_name}-snapshot-{unix_timestamp}")
}

/// A request with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub source_claim: ObjectRef,
    pub origin_snapshot: SnapshotRef,
    pub dest_snapshot: SnapshotRef,
    pub snapshot_class: Option<String>,
    /// Destination claim to create; lives in the destination snapshot's namespace.
    pub dest_claim: Option<ObjectRef>,
}
