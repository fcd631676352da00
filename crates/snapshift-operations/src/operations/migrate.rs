use std::future::Future;
use std::time::{Duration, Instant};

use snapshift_core::{
    ClusterError, ClusterRole, Handle, ObjectRef, ResourceKind, SnapshotRef, SnapshotSpec,
    VolumeClaim,
};
use snapshift_saga::{CompensationReport, SagaFailure, SagaState, rollback};
use tracing::{info, warn};

use super::compensation::{SagaResource, SnapshotCompensator};
use super::linker::HandleLinker;
use super::poller::{AwaitTarget, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL, ReadinessPoller};
use super::request::{MigrationPlan, MigrationRequest};
use crate::OperationError;
use crate::traits::{Clock, ClusterResourceClient};

/// A migration that stopped at some step, with the root error and the
/// outcome of the compensation pass.
pub type MigrationFailure = SagaFailure<SagaResource, OperationError>;

/// The ordered steps of a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    ValidateRequest,
    FetchSourceClaim,
    CreateOriginSnapshot,
    AwaitOriginSnapshot,
    FetchOriginContent,
    ExtractHandle,
    CreateDestinationContent,
    CreateDestinationSnapshot,
    AwaitDestinationSnapshot,
    CreateDestinationClaim,
}

impl MigrationStep {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ValidateRequest => "validate_request",
            Self::FetchSourceClaim => "fetch_source_claim",
            Self::CreateOriginSnapshot => "create_origin_snapshot",
            Self::AwaitOriginSnapshot => "await_origin_snapshot",
            Self::FetchOriginContent => "fetch_origin_content",
            Self::ExtractHandle => "extract_handle",
            Self::CreateDestinationContent => "create_destination_content",
            Self::CreateDestinationSnapshot => "create_destination_snapshot",
            Self::AwaitDestinationSnapshot => "await_destination_snapshot",
            Self::CreateDestinationClaim => "create_destination_claim",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutput {
    pub origin_snapshot: SnapshotRef,
    pub destination_snapshot: SnapshotRef,
    pub destination_content: String,
    pub handle: Handle,
    pub restore_size: Option<String>,
    pub destination_claim: Option<ObjectRef>,
}

struct StepFailure {
    step: MigrationStep,
    error: OperationError,
}

trait AtStep<T> {
    fn at(self, step: MigrationStep) -> Result<T, StepFailure>;
}

impl<T, E> AtStep<T> for Result<T, E>
where
    E: Into<OperationError>,
{
    fn at(self, step: MigrationStep) -> Result<T, StepFailure> {
        self.map_err(|error| StepFailure {
            step,
            error: error.into(),
        })
    }
}

/// Replicates a snapshot from the origin cluster into the destination
/// cluster, compensating on the first failure.
pub struct MigrateOperation<O, D, K> {
    origin: O,
    destination: D,
    clock: K,
    poll_interval: Duration,
}

#[cfg(test)]
impl<O, D, K> MigrateOperation<O, D, K> {
    pub(crate) fn origin(&self) -> &O {
        &self.origin
    }

    pub(crate) fn destination(&self) -> &D {
        &self.destination
    }

    pub(crate) fn clock(&self) -> &K {
        &self.clock
    }
}

impl<O, D, K> MigrateOperation<O, D, K>
where
    O: ClusterResourceClient,
    D: ClusterResourceClient,
    K: Clock,
{
    pub fn new(origin: O, destination: D, clock: K) -> Self {
        Self {
            origin,
            destination,
            clock,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the readiness poll interval, no shorter than [`MIN_POLL_INTERVAL`].
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Run the migration saga with a deadline of `request.timeout` from now.
    ///
    /// # Errors
    ///
    /// See [`MigrateOperation::execute_until`].
    pub async fn execute(
        &self,
        request: &MigrationRequest,
    ) -> Result<MigrationOutput, MigrationFailure> {
        let deadline = self.clock.now() + request.timeout;
        self.execute_until(request, deadline).await
    }

    /// Run the migration saga under an absolute deadline.
    ///
    /// Every cluster call still in flight at `deadline` is abandoned and the
    /// saga compensates.
    ///
    /// # Errors
    ///
    /// Returns a [`MigrationFailure`] naming the step that failed, carrying
    /// its error unchanged and the report of the compensating deletes that
    /// were run for every resource created before it.
    pub async fn execute_until(
        &self,
        request: &MigrationRequest,
        deadline: Instant,
    ) -> Result<MigrationOutput, MigrationFailure> {
        if let Err(err) = request.validate() {
            return Err(SagaFailure::new(
                MigrationStep::ValidateRequest.name(),
                err,
                CompensationReport::new(),
            ));
        }

        let plan = request.resolve(self.clock.unix_timestamp());
        let mut state = SagaState::new();

        match self.run(&plan, deadline, &mut state).await {
            Ok(output) => {
                info!(
                    origin = %output.origin_snapshot,
                    destination = %output.destination_snapshot,
                    handle = %output.handle,
                    "migration complete"
                );
                Ok(output)
            }
            Err(StepFailure { step, error }) => {
                warn!(step = step.name(), error = %error, "migration failed, compensating");
                let compensator = SnapshotCompensator::new(&self.origin, &self.destination);
                let report = rollback(state, &compensator).await;
                Err(SagaFailure::new(step.name(), error, report))
            }
        }
    }

    async fn run(
        &self,
        plan: &MigrationPlan,
        deadline: Instant,
        state: &mut SagaState<SagaResource>,
    ) -> Result<MigrationOutput, StepFailure> {
        let poller = ReadinessPoller::new(&self.clock).with_interval(self.poll_interval);
        let source = &plan.source_claim;
        let origin_ref = &plan.origin_snapshot;
        let dest_ref = &plan.dest_snapshot;

        info!(
            step = MigrationStep::FetchSourceClaim.name(),
            namespace = %source.namespace,
            name = %source.name,
            "fetching source claim"
        );
        let claim = self
            .fetch_within(
                deadline,
                AwaitTarget {
                    role: ClusterRole::Origin,
                    kind: ResourceKind::VolumeClaim,
                    identity: source.to_string(),
                },
                self.origin.get_claim(&source.namespace, &source.name),
            )
            .await
            .at(MigrationStep::FetchSourceClaim)?;

        info!(
            step = MigrationStep::CreateOriginSnapshot.name(),
            snapshot = %origin_ref,
            "creating origin snapshot"
        );
        let origin_spec = SnapshotSpec::of_claim(
            &origin_ref.namespace,
            &origin_ref.name,
            &claim.name,
            plan.snapshot_class.clone(),
        );
        self.create_recorded(
            state,
            deadline,
            MigrationStep::CreateOriginSnapshot,
            SagaResource::OriginSnapshot(origin_ref.clone()),
            self.origin.create_snapshot(&origin_spec),
        )
        .await?;

        info!(
            step = MigrationStep::AwaitOriginSnapshot.name(),
            snapshot = %origin_ref,
            "waiting for origin snapshot"
        );
        let origin_ready = poller
            .await_snapshot(&self.origin, &origin_ref.namespace, &origin_ref.name, deadline)
            .await
            .at(MigrationStep::AwaitOriginSnapshot)?;

        let content_name = origin_ready
            .status
            .bound_content_name
            .clone()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| OperationError::MissingBinding {
                role: ClusterRole::Origin,
                snapshot: origin_ref.to_string(),
            })
            .at(MigrationStep::FetchOriginContent)?;
        info!(
            step = MigrationStep::FetchOriginContent.name(),
            content = %content_name,
            "fetching origin snapshot content"
        );
        let origin_content = self
            .fetch_within(
                deadline,
                AwaitTarget {
                    role: ClusterRole::Origin,
                    kind: ResourceKind::SnapshotContent,
                    identity: content_name.clone(),
                },
                self.origin.get_snapshot_content(&content_name),
            )
            .await
            .at(MigrationStep::FetchOriginContent)?;

        let handle = HandleLinker::extract_handle(&origin_content, ClusterRole::Origin)
            .at(MigrationStep::ExtractHandle)?;
        info!(
            step = MigrationStep::ExtractHandle.name(),
            handle = %handle,
            driver = %origin_content.driver,
            "extracted snapshot handle"
        );

        let dest_content = HandleLinker::bind(&origin_content, &dest_ref.namespace, &dest_ref.name)
            .at(MigrationStep::CreateDestinationContent)?;
        info!(
            step = MigrationStep::CreateDestinationContent.name(),
            content = dest_content.name(),
            "creating destination snapshot content"
        );
        self.create_recorded(
            state,
            deadline,
            MigrationStep::CreateDestinationContent,
            SagaResource::DestinationContent(dest_content.name().to_string()),
            self.destination.create_snapshot_content(&dest_content),
        )
        .await?;

        info!(
            step = MigrationStep::CreateDestinationSnapshot.name(),
            snapshot = %dest_ref,
            "creating destination snapshot"
        );
        let dest_spec = SnapshotSpec::pre_bound(
            &dest_ref.namespace,
            &dest_ref.name,
            dest_content.name(),
            plan.snapshot_class.clone(),
        );
        self.create_recorded(
            state,
            deadline,
            MigrationStep::CreateDestinationSnapshot,
            SagaResource::DestinationSnapshot(dest_ref.clone()),
            self.destination.create_snapshot(&dest_spec),
        )
        .await?;

        info!(
            step = MigrationStep::AwaitDestinationSnapshot.name(),
            snapshot = %dest_ref,
            "waiting for destination snapshot"
        );
        poller
            .await_snapshot(&self.destination, &dest_ref.namespace, &dest_ref.name, deadline)
            .await
            .at(MigrationStep::AwaitDestinationSnapshot)?;

        let destination_claim = match &plan.dest_claim {
            Some(claim_ref) => {
                Some(
                    self.create_destination_claim(state, deadline, &claim, claim_ref, dest_ref)
                        .await?,
                )
            }
            None => None,
        };

        Ok(MigrationOutput {
            origin_snapshot: origin_ref.clone(),
            destination_snapshot: dest_ref.clone(),
            destination_content: dest_content.name().to_string(),
            handle,
            restore_size: origin_ready.status.restore_size,
            destination_claim,
        })
    }

    /// Run one read, abandoning it at `deadline`.
    async fn fetch_within<T, Fut>(
        &self,
        deadline: Instant,
        target: AwaitTarget,
        call: Fut,
    ) -> Result<T, OperationError>
    where
        T: Send,
        Fut: Future<Output = Result<T, ClusterError>> + Send,
    {
        match self.clock.timeout_at(deadline, call).await {
            Some(result) => Ok(result?),
            None => Err(target.deadline_exceeded("get")),
        }
    }

    /// Run one creating call and record its resource in the saga ledger.
    ///
    /// A failed create is recorded as failed and never compensated, so a name
    /// conflict cannot delete an object this saga did not create. A create
    /// abandoned at the deadline may still land, so it is compensated.
    async fn create_recorded<T, Fut>(
        &self,
        state: &mut SagaState<SagaResource>,
        deadline: Instant,
        step: MigrationStep,
        resource: SagaResource,
        create: Fut,
    ) -> Result<T, StepFailure>
    where
        T: Send,
        Fut: Future<Output = Result<T, ClusterError>> + Send,
    {
        let target = AwaitTarget {
            role: resource.role(),
            kind: resource.kind(),
            identity: resource.identity(),
        };
        state.begin(step.name(), resource);
        match self.clock.timeout_at(deadline, create).await {
            Some(Ok(created)) => {
                state.succeed();
                Ok(created)
            }
            Some(Err(err)) => {
                state.fail();
                Err(StepFailure {
                    step,
                    error: err.into(),
                })
            }
            None => {
                state.abandon();
                Err(StepFailure {
                    step,
                    error: target.deadline_exceeded("create"),
                })
            }
        }
    }

    async fn create_destination_claim(
        &self,
        state: &mut SagaState<SagaResource>,
        deadline: Instant,
        source: &VolumeClaim,
        claim_ref: &ObjectRef,
        dest_ref: &SnapshotRef,
    ) -> Result<ObjectRef, StepFailure> {
        info!(
            step = MigrationStep::CreateDestinationClaim.name(),
            claim = %claim_ref,
            snapshot = %dest_ref,
            "creating destination claim"
        );
        let claim =
            source.restored_from_snapshot(&claim_ref.namespace, &claim_ref.name, &dest_ref.name);
        let created = self
            .create_recorded(
                state,
                deadline,
                MigrationStep::CreateDestinationClaim,
                SagaResource::DestinationClaim(claim_ref.clone()),
                self.destination.create_claim(&claim),
            )
            .await?;
        Ok(created.object_ref())
    }
}
