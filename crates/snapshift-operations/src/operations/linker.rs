use snapshift_core::{ClusterRole, Handle, ObjectRef, PreProvisionedContent, SnapshotContent};

use crate::{OperationError, Result};

/// Builds the destination content that points at an existing backend snapshot.
///
/// Pure construction: nothing here talks to a cluster.
pub struct HandleLinker;

impl HandleLinker {
    /// Name of the destination content pre-bound to `dest_snapshot_name`.
    #[must_use]
    pub fn content_name(dest_snapshot_name: &str) -> String {
        format!("snapcontent-{dest_snapshot_name}")
    }

    /// # Errors
    ///
    /// Returns [`OperationError::MissingHandle`] if the content carries no
    /// non-empty handle in its status or spec.
    pub fn extract_handle(content: &SnapshotContent, role: ClusterRole) -> Result<Handle> {
        content
            .handle()
            .filter(|handle| !handle.as_str().is_empty())
            .cloned()
            .ok_or_else(|| OperationError::MissingHandle {
                role,
                content: content.name.clone(),
            })
    }

    /// Link the origin content's backend snapshot to a destination snapshot.
    ///
    /// The result copies the driver and snapshot class from `origin`, carries
    /// its handle unchanged and references `dest_namespace/dest_snapshot_name`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::MissingHandle`] if `origin` has no handle.
    pub fn bind(
        origin: &SnapshotContent,
        dest_namespace: &str,
        dest_snapshot_name: &str,
    ) -> Result<PreProvisionedContent> {
        let handle = Self::extract_handle(origin, ClusterRole::Origin)?;
        Ok(PreProvisionedContent::new(
            Self::content_name(dest_snapshot_name),
            &origin.driver,
            origin.snapshot_class.clone(),
            ObjectRef::new(dest_namespace, dest_snapshot_name),
            handle,
        ))
    }
}
