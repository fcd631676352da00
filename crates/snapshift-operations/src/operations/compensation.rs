use std::fmt;

use async_trait::async_trait;
use snapshift_core::{ClusterError, ClusterRole, ObjectRef, ResourceKind, SnapshotRef};
use snapshift_saga::Compensator;
use tracing::{info, warn};

use crate::OperationError;
use crate::traits::ClusterResourceClient;

/// A resource the migration saga created and may have to delete again.
///
/// The origin snapshot's content object is deliberately absent: it is
/// created by the snapshot controller, not by the saga.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagaResource {
    OriginSnapshot(SnapshotRef),
    DestinationContent(String),
    DestinationSnapshot(SnapshotRef),
    DestinationClaim(ObjectRef),
}

impl SagaResource {
    #[must_use]
    pub fn role(&self) -> ClusterRole {
        match self {
            Self::OriginSnapshot(_) => ClusterRole::Origin,
            Self::DestinationContent(_) | Self::DestinationSnapshot(_) | Self::DestinationClaim(_) => {
                ClusterRole::Destination
            }
        }
    }

    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::OriginSnapshot(_) | Self::DestinationSnapshot(_) => ResourceKind::Snapshot,
            Self::DestinationContent(_) => ResourceKind::SnapshotContent,
            Self::DestinationClaim(_) => ResourceKind::VolumeClaim,
        }
    }

    /// `namespace/name`, or the bare name for cluster-scoped contents.
    #[must_use]
    pub fn identity(&self) -> String {
        match self {
            Self::OriginSnapshot(r) | Self::DestinationSnapshot(r) => r.to_string(),
            Self::DestinationContent(name) => name.clone(),
            Self::DestinationClaim(r) => r.to_string(),
        }
    }
}

impl fmt::Display for SagaResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.role(), self.kind(), self.identity())
    }
}

/// Deletes saga resources from the cluster they were created in.
pub struct SnapshotCompensator<'a, O, D> {
    origin: &'a O,
    destination: &'a D,
}

impl<'a, O, D> SnapshotCompensator<'a, O, D>
where
    O: ClusterResourceClient,
    D: ClusterResourceClient,
{
    pub fn new(origin: &'a O, destination: &'a D) -> Self {
        Self {
            origin,
            destination,
        }
    }

    async fn delete(&self, resource: &SagaResource) -> Result<(), ClusterError> {
        match resource {
            SagaResource::OriginSnapshot(r) => {
                self.origin.delete_snapshot(&r.namespace, &r.name).await
            }
            SagaResource::DestinationContent(name) => {
                self.destination.delete_snapshot_content(name).await
            }
            SagaResource::DestinationSnapshot(r) => {
                self.destination.delete_snapshot(&r.namespace, &r.name).await
            }
            SagaResource::DestinationClaim(r) => {
                self.destination.delete_claim(&r.namespace, &r.name).await
            }
        }
    }
}

#[async_trait]
impl<O, D> Compensator<SagaResource> for SnapshotCompensator<'_, O, D>
where
    O: ClusterResourceClient,
    D: ClusterResourceClient,
{
    type Error = OperationError;

    async fn compensate(&self, resource: &SagaResource) -> Result<(), Self::Error> {
        match self.delete(resource).await {
            Ok(()) => {
                info!(resource = %resource, "compensation: deleted");
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                info!(resource = %resource, "compensation: already gone");
                Ok(())
            }
            Err(err) => {
                warn!(resource = %resource, error = %err, "compensation: delete failed");
                Err(err.into())
            }
        }
    }

    fn describe(&self, resource: &SagaResource) -> String {
        format!("delete {resource}")
    }
}
