use std::fmt;
use std::str::FromStr;

use crate::error::UnknownDeletionPolicy;

/// API group of the CSI snapshot resources.
pub const SNAPSHOT_API_GROUP: &str = "snapshot.storage.k8s.io";

/// Kind name a claim data-source uses to point at a snapshot.
pub const SNAPSHOT_KIND: &str = "VolumeSnapshot";

/// Backend-opaque identifier of a stored snapshot.
///
/// Assigned by the storage backend and stable across every cluster attached
/// to it. Never generated here, only copied verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Handle(String);

impl Handle {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Handle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of the migration a cluster connection serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterRole {
    Origin,
    Destination,
}

impl fmt::Display for ClusterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Origin => "origin",
            Self::Destination => "destination",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    VolumeClaim,
    Snapshot,
    SnapshotContent,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::VolumeClaim => "PersistentVolumeClaim",
            Self::Snapshot => "VolumeSnapshot",
            Self::SnapshotContent => "VolumeSnapshotContent",
        };
        f.write_str(s)
    }
}

/// What happens to the backend snapshot when its content object is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletionPolicy {
    #[default]
    Retain,
    Delete,
}

impl DeletionPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Retain => "Retain",
            Self::Delete => "Delete",
        }
    }
}

impl fmt::Display for DeletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeletionPolicy {
    type Err = UnknownDeletionPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Retain" => Ok(Self::Retain),
            "Delete" => Ok(Self::Delete),
            other => Err(UnknownDeletionPolicy(other.to_string())),
        }
    }
}

/// Namespaced identity of an object inside one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub namespace: String,
    pub name: String,
}

impl ObjectRef {
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A snapshot identity together with the cluster it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotRef {
    pub name: String,
    pub namespace: String,
    pub role: ClusterRole,
}

impl SnapshotRef {
    #[must_use]
    pub fn new(role: ClusterRole, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            role,
        }
    }

    #[must_use]
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(&self.namespace, &self.name)
    }
}

impl fmt::Display for SnapshotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Where a snapshot takes its data from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Dynamic snapshot of a claim in the same namespace.
    PersistentVolumeClaim(String),
    /// Pre-bound to an existing content object.
    SnapshotContent(String),
}

/// Desired state of a snapshot to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSpec {
    pub name: String,
    pub namespace: String,
    pub source: SnapshotSource,
    pub snapshot_class: Option<String>,
}

impl SnapshotSpec {
    #[must_use]
    pub fn of_claim(
        namespace: impl Into<String>,
        name: impl Into<String>,
        claim_name: impl Into<String>,
        snapshot_class: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            source: SnapshotSource::PersistentVolumeClaim(claim_name.into()),
            snapshot_class,
        }
    }

    #[must_use]
    pub fn pre_bound(
        namespace: impl Into<String>,
        name: impl Into<String>,
        content_name: impl Into<String>,
        snapshot_class: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            source: SnapshotSource::SnapshotContent(content_name.into()),
            snapshot_class,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotStatus {
    pub ready_to_use: bool,
    pub bound_content_name: Option<String>,
    pub restore_size: Option<String>,
    /// Message of the error the backend attached to the snapshot, if any.
    pub error_message: Option<String>,
}

/// Observed state of a snapshot as returned by a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub name: String,
    pub namespace: String,
    pub source: Option<SnapshotSource>,
    pub snapshot_class: Option<String>,
    pub status: SnapshotStatus,
}

impl Snapshot {
    #[must_use]
    pub fn reference(&self, role: ClusterRole) -> SnapshotRef {
        SnapshotRef::new(role, &self.namespace, &self.name)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status.ready_to_use
    }
}

/// Where a content object's data lives on the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// Pre-provisioned: the backend snapshot already exists.
    SnapshotHandle(Handle),
    /// Dynamic: the backend snapshots this volume.
    VolumeHandle(String),
}

/// Observed state of a cluster-scoped snapshot content object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotContent {
    pub name: String,
    pub driver: String,
    pub deletion_policy: DeletionPolicy,
    pub snapshot_class: Option<String>,
    pub snapshot_ref: ObjectRef,
    pub source: ContentSource,
    /// Handle reported by the snapshot controller once the backend snapshot exists.
    pub status_handle: Option<Handle>,
    pub ready_to_use: bool,
}

impl SnapshotContent {
    /// The backend handle of this content.
    ///
    /// Prefers the handle reported in status and falls back to the
    /// spec-level handle of a pre-provisioned content.
    #[must_use]
    pub fn handle(&self) -> Option<&Handle> {
        self.status_handle.as_ref().or(match &self.source {
            ContentSource::SnapshotHandle(handle) => Some(handle),
            ContentSource::VolumeHandle(_) => None,
        })
    }
}

/// A content object to be created in the destination cluster, pre-bound
/// to an existing backend snapshot.
///
/// The deletion policy is not configurable: deleting this object must never
/// delete the backend snapshot that the origin cluster still references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreProvisionedContent {
    name: String,
    driver: String,
    snapshot_class: Option<String>,
    snapshot_ref: ObjectRef,
    handle: Handle,
}

impl PreProvisionedContent {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        driver: impl Into<String>,
        snapshot_class: Option<String>,
        snapshot_ref: ObjectRef,
        handle: Handle,
    ) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            snapshot_class,
            snapshot_ref,
            handle,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn driver(&self) -> &str {
        &self.driver
    }

    #[must_use]
    pub fn snapshot_class(&self) -> Option<&str> {
        self.snapshot_class.as_deref()
    }

    #[must_use]
    pub fn snapshot_ref(&self) -> &ObjectRef {
        &self.snapshot_ref
    }

    #[must_use]
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    #[must_use]
    pub fn deletion_policy(&self) -> DeletionPolicy {
        DeletionPolicy::Retain
    }

    /// The content object as it will look once created.
    #[must_use]
    pub fn to_content(&self) -> SnapshotContent {
        SnapshotContent {
            name: self.name.clone(),
            driver: self.driver.clone(),
            deletion_policy: self.deletion_policy(),
            snapshot_class: self.snapshot_class.clone(),
            snapshot_ref: self.snapshot_ref.clone(),
            source: ContentSource::SnapshotHandle(self.handle.clone()),
            status_handle: None,
            ready_to_use: false,
        }
    }
}

/// Typed reference a claim uses to populate itself from another object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimDataSource {
    pub api_group: Option<String>,
    pub kind: String,
    pub name: String,
}

impl ClaimDataSource {
    #[must_use]
    pub fn snapshot(name: impl Into<String>) -> Self {
        Self {
            api_group: Some(SNAPSHOT_API_GROUP.to_string()),
            kind: SNAPSHOT_KIND.to_string(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn is_snapshot(&self, name: &str) -> bool {
        self.api_group.as_deref() == Some(SNAPSHOT_API_GROUP)
            && self.kind == SNAPSHOT_KIND
            && self.name == name
    }
}

/// A persistent volume claim, either observed or to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeClaim {
    pub name: String,
    pub namespace: String,
    /// Requested storage quantity, e.g. `10Gi`.
    pub storage: Option<String>,
    pub access_modes: Vec<String>,
    pub storage_class: Option<String>,
    pub data_source: Option<ClaimDataSource>,
}

impl VolumeClaim {
    #[must_use]
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(&self.namespace, &self.name)
    }

    /// A claim in `namespace` restored from the snapshot `snapshot_name`,
    /// sized and shaped like `self`.
    #[must_use]
    pub fn restored_from_snapshot(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        snapshot_name: &str,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            storage: self.storage.clone(),
            access_modes: self.access_modes.clone(),
            storage_class: self.storage_class.clone(),
            data_source: Some(ClaimDataSource::snapshot(snapshot_name)),
        }
    }
}
