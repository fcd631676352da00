use async_trait::async_trait;
use snapshift_core::{
    ClusterError, ClusterRole, PreProvisionedContent, Snapshot, SnapshotContent, SnapshotSpec,
    VolumeClaim,
};

/// Get/create/delete access to the resources of one cluster.
///
/// Creates are single attempts: an existing name is reported as
/// [`ClusterError::Conflict`], never overwritten. Deletes are best-effort.
#[async_trait]
pub trait ClusterResourceClient: Send + Sync {
    /// Which side of the migration this connection serves.
    fn role(&self) -> ClusterRole;

    /// # Errors
    ///
    /// Returns [`ClusterError::NotFound`] if the claim does not exist.
    async fn get_claim(&self, namespace: &str, name: &str) -> Result<VolumeClaim, ClusterError>;

    /// # Errors
    ///
    /// Returns [`ClusterError::Conflict`] if a claim with that name exists.
    async fn create_claim(&self, claim: &VolumeClaim) -> Result<VolumeClaim, ClusterError>;

    /// # Errors
    ///
    /// Returns an error if the claim could not be deleted.
    async fn delete_claim(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;

    /// # Errors
    ///
    /// Returns [`ClusterError::Conflict`] if a snapshot with that name exists.
    async fn create_snapshot(&self, spec: &SnapshotSpec) -> Result<Snapshot, ClusterError>;

    /// # Errors
    ///
    /// Returns [`ClusterError::NotFound`] if the snapshot does not exist.
    async fn get_snapshot(&self, namespace: &str, name: &str) -> Result<Snapshot, ClusterError>;

    /// # Errors
    ///
    /// Returns an error if the snapshot could not be deleted.
    async fn delete_snapshot(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;

    /// # Errors
    ///
    /// Returns [`ClusterError::Conflict`] if a content with that name exists.
    async fn create_snapshot_content(
        &self,
        content: &PreProvisionedContent,
    ) -> Result<SnapshotContent, ClusterError>;

    /// # Errors
    ///
    /// Returns [`ClusterError::NotFound`] if the content does not exist.
    async fn get_snapshot_content(&self, name: &str) -> Result<SnapshotContent, ClusterError>;

    /// # Errors
    ///
    /// Returns an error if the content could not be deleted.
    async fn delete_snapshot_content(&self, name: &str) -> Result<(), ClusterError>;
}
