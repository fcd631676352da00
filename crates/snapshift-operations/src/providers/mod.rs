mod clock;
mod kubernetes;
mod resources;

pub use clock::SystemClock;
pub use kubernetes::KubeClusterClient;
pub use resources::{
    SnapshotObjectRef, VolumeSnapshot, VolumeSnapshotContent, VolumeSnapshotContentSource,
    VolumeSnapshotContentSpec, VolumeSnapshotContentStatus, VolumeSnapshotError,
    VolumeSnapshotSource, VolumeSnapshotSpec, VolumeSnapshotStatus, claim_from_resource,
    claim_to_resource,
};
