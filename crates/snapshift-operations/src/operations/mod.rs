mod compensation;
mod linker;
mod migrate;
mod poller;
mod request;

pub use compensation::{SagaResource, SnapshotCompensator};
pub use linker::HandleLinker;
pub use migrate::{MigrateOperation, MigrationFailure, MigrationOutput, MigrationStep};
pub use poller::{
    AwaitTarget, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL, Readiness, ReadinessPoller,
    snapshot_readiness,
};
pub use request::{
    DEFAULT_TIMEOUT, DestinationClaimRequest, MigrationPlan, MigrationRequest,
    default_snapshot_name,
};
