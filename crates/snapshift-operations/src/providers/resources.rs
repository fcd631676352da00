//! CSI snapshot custom resources (`snapshot.storage.k8s.io/v1`) and their
//! mapping to domain types.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, TypedLocalObjectReference,
    VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::ObjectMeta;
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use snapshift_core::{
    ClaimDataSource, ContentSource, DeletionPolicy, Handle, ObjectRef, PreProvisionedContent,
    Snapshot, SnapshotContent, SnapshotSource, SnapshotSpec, SnapshotStatus, VolumeClaim,
};

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "snapshot.storage.k8s.io",
    version = "v1",
    kind = "VolumeSnapshot",
    plural = "volumesnapshots",
    namespaced,
    status = "VolumeSnapshotStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotSpec {
    pub source: VolumeSnapshotSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_snapshot_class_name: Option<String>,
}

/// Exactly one field is set.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_snapshot_content_name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound_volume_snapshot_content_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_to_use: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<VolumeSnapshotError>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "snapshot.storage.k8s.io",
    version = "v1",
    kind = "VolumeSnapshotContent",
    plural = "volumesnapshotcontents",
    status = "VolumeSnapshotContentStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotContentSpec {
    pub deletion_policy: String,
    pub driver: String,
    pub source: VolumeSnapshotContentSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_snapshot_class_name: Option<String>,
    pub volume_snapshot_ref: SnapshotObjectRef,
}

/// Exactly one field is set.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotContentSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_handle: Option<String>,
}

/// The subset of `ObjectReference` a content uses to name its snapshot.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotObjectRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotContentStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_to_use: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<VolumeSnapshotError>,
}

impl VolumeSnapshot {
    #[must_use]
    pub fn from_spec(spec: &SnapshotSpec) -> Self {
        let source = match &spec.source {
            SnapshotSource::PersistentVolumeClaim(claim) => VolumeSnapshotSource {
                persistent_volume_claim_name: Some(claim.clone()),
                volume_snapshot_content_name: None,
            },
            SnapshotSource::SnapshotContent(content) => VolumeSnapshotSource {
                persistent_volume_claim_name: None,
                volume_snapshot_content_name: Some(content.clone()),
            },
        };
        let mut snapshot = Self::new(
            &spec.name,
            VolumeSnapshotSpec {
                source,
                volume_snapshot_class_name: spec.snapshot_class.clone(),
            },
        );
        snapshot.metadata.namespace = Some(spec.namespace.clone());
        snapshot
    }

    #[must_use]
    pub fn to_snapshot(&self) -> Snapshot {
        let source = &self.spec.source;
        let source = source
            .persistent_volume_claim_name
            .clone()
            .map(SnapshotSource::PersistentVolumeClaim)
            .or_else(|| {
                source
                    .volume_snapshot_content_name
                    .clone()
                    .map(SnapshotSource::SnapshotContent)
            });
        let status = self.status.as_ref().map_or_else(SnapshotStatus::default, |s| {
            SnapshotStatus {
                ready_to_use: s.ready_to_use.unwrap_or(false),
                bound_content_name: s.bound_volume_snapshot_content_name.clone(),
                restore_size: s.restore_size.clone(),
                error_message: s
                    .error
                    .as_ref()
                    .and_then(|e| e.message.clone())
                    .filter(|m| !m.is_empty()),
            }
        });

        Snapshot {
            name: self.name_any(),
            namespace: self.namespace().unwrap_or_default(),
            source,
            snapshot_class: self.spec.volume_snapshot_class_name.clone(),
            status,
        }
    }
}

impl VolumeSnapshotContent {
    /// Pre-provisioned content with the `Retain` deletion policy.
    #[must_use]
    pub fn from_pre_provisioned(content: &PreProvisionedContent) -> Self {
        Self::new(
            content.name(),
            VolumeSnapshotContentSpec {
                deletion_policy: content.deletion_policy().as_str().to_string(),
                driver: content.driver().to_string(),
                source: VolumeSnapshotContentSource {
                    snapshot_handle: Some(content.handle().as_str().to_string()),
                    volume_handle: None,
                },
                volume_snapshot_class_name: content.snapshot_class().map(str::to_string),
                volume_snapshot_ref: SnapshotObjectRef {
                    name: Some(content.snapshot_ref().name.clone()),
                    namespace: Some(content.snapshot_ref().namespace.clone()),
                },
            },
        )
    }

    /// # Errors
    ///
    /// Returns a description of the problem if the deletion policy is not
    /// a known value or neither source field is set.
    pub fn to_content(&self) -> Result<SnapshotContent, String> {
        let spec = &self.spec;
        let deletion_policy: DeletionPolicy = spec
            .deletion_policy
            .parse()
            .map_err(|e: snapshift_core::UnknownDeletionPolicy| e.to_string())?;
        let source = match (&spec.source.snapshot_handle, &spec.source.volume_handle) {
            (Some(handle), _) => ContentSource::SnapshotHandle(Handle::new(handle)),
            (None, Some(volume)) => ContentSource::VolumeHandle(volume.clone()),
            (None, None) => {
                return Err("source has neither snapshotHandle nor volumeHandle".to_string());
            }
        };
        let status = self.status.as_ref();

        Ok(SnapshotContent {
            name: self.name_any(),
            driver: spec.driver.clone(),
            deletion_policy,
            snapshot_class: spec.volume_snapshot_class_name.clone(),
            snapshot_ref: ObjectRef::new(
                spec.volume_snapshot_ref.namespace.clone().unwrap_or_default(),
                spec.volume_snapshot_ref.name.clone().unwrap_or_default(),
            ),
            source,
            status_handle: status
                .and_then(|s| s.snapshot_handle.clone())
                .filter(|h| !h.is_empty())
                .map(Handle::from),
            ready_to_use: status.and_then(|s| s.ready_to_use).unwrap_or(false),
        })
    }
}

const STORAGE: &str = "storage";

#[must_use]
pub fn claim_from_resource(pvc: &PersistentVolumeClaim) -> VolumeClaim {
    let spec = pvc.spec.as_ref();
    VolumeClaim {
        name: pvc.name_any(),
        namespace: pvc.namespace().unwrap_or_default(),
        storage: spec
            .and_then(|s| s.resources.as_ref())
            .and_then(|r| r.requests.as_ref())
            .and_then(|requests| requests.get(STORAGE))
            .map(|q| q.0.clone()),
        access_modes: spec
            .and_then(|s| s.access_modes.clone())
            .unwrap_or_default(),
        storage_class: spec.and_then(|s| s.storage_class_name.clone()),
        data_source: spec.and_then(|s| s.data_source.as_ref()).map(|ds| ClaimDataSource {
            api_group: ds.api_group.clone(),
            kind: ds.kind.clone(),
            name: ds.name.clone(),
        }),
    }
}

#[must_use]
pub fn claim_to_resource(claim: &VolumeClaim) -> PersistentVolumeClaim {
    let requests = claim
        .storage
        .as_ref()
        .map(|size| BTreeMap::from([(STORAGE.to_string(), Quantity(size.clone()))]));

    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(claim.name.clone()),
            namespace: Some(claim.namespace.clone()),
            ..ObjectMeta::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(claim.access_modes.clone()).filter(|m| !m.is_empty()),
            storage_class_name: claim.storage_class.clone(),
            resources: Some(VolumeResourceRequirements {
                requests,
                ..VolumeResourceRequirements::default()
            }),
            data_source: claim
                .data_source
                .as_ref()
                .map(|ds| TypedLocalObjectReference {
                    api_group: ds.api_group.clone(),
                    kind: ds.kind.clone(),
                    name: ds.name.clone(),
                }),
            ..PersistentVolumeClaimSpec::default()
        }),
        ..PersistentVolumeClaim::default()
    }
}
