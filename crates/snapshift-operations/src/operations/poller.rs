use std::future::Future;
use std::time::{Duration, Instant};

use snapshift_core::{ClusterError, ClusterRole, ResourceKind, Snapshot};
use tracing::debug;

use crate::traits::{Clock, ClusterResourceClient};
use crate::{OperationError, Result};

/// Interval between readiness polls.
///
/// Constant on purpose: snapshot completion time is backend-dependent and
/// unbounded, so backing off only delays noticing readiness.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Shorter intervals are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What one poll observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// The backend reported a failure; polling stops.
    Failed(String),
    Pending,
}

/// Resource a call or poll targets, for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwaitTarget {
    pub role: ClusterRole,
    pub kind: ResourceKind,
    pub identity: String,
}

impl AwaitTarget {
    pub(crate) fn deadline_exceeded(&self, action: &'static str) -> OperationError {
        OperationError::DeadlineExceeded {
            action,
            role: self.role,
            kind: self.kind,
            identity: self.identity.clone(),
        }
    }

    fn timed_out(&self) -> OperationError {
        OperationError::ReadinessTimeout {
            role: self.role,
            kind: self.kind,
            identity: self.identity.clone(),
        }
    }
}

/// Ready when the ready flag is set; failed as soon as the backend attached
/// an error message.
#[must_use]
pub fn snapshot_readiness(snapshot: &Snapshot) -> Readiness {
    if snapshot.status.ready_to_use {
        return Readiness::Ready;
    }
    match &snapshot.status.error_message {
        Some(message) => Readiness::Failed(message.clone()),
        None => Readiness::Pending,
    }
}

/// Fixed-interval readiness poller bounded by an absolute deadline.
pub struct ReadinessPoller<'a, K> {
    clock: &'a K,
    interval: Duration,
}

impl<'a, K> ReadinessPoller<'a, K>
where
    K: Clock,
{
    pub fn new(clock: &'a K) -> Self {
        Self {
            clock,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the poll interval, no shorter than [`MIN_POLL_INTERVAL`].
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Poll `fetch` once per interval until `check` reports ready.
    ///
    /// The first poll happens one interval after the call. A tick that
    /// would land after `deadline` is not taken, and a fetch still in
    /// flight at `deadline` is abandoned.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::BackendReported`] on the first poll that
    /// observes a backend error, [`OperationError::ReadinessTimeout`] once
    /// the deadline elapses, and any error `fetch` returns.
    pub async fn poll_until<T, F, Fut, P>(
        &self,
        target: &AwaitTarget,
        deadline: Instant,
        mut fetch: F,
        check: P,
    ) -> Result<T>
    where
        T: Send,
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ClusterError>> + Send,
        P: Fn(&T) -> Readiness,
    {
        loop {
            let remaining = deadline.saturating_duration_since(self.clock.now());
            if remaining < self.interval {
                self.clock.sleep(remaining).await;
                return Err(target.timed_out());
            }

            self.clock.sleep(self.interval).await;
            let Some(fetched) = self.clock.timeout_at(deadline, fetch()).await else {
                return Err(target.timed_out());
            };
            let resource = fetched?;

            match check(&resource) {
                Readiness::Ready => return Ok(resource),
                Readiness::Failed(message) => {
                    return Err(OperationError::BackendReported {
                        role: target.role,
                        kind: target.kind,
                        identity: target.identity.clone(),
                        message,
                    });
                }
                Readiness::Pending => {
                    debug!(
                        role = %target.role,
                        kind = %target.kind,
                        identity = %target.identity,
                        ready = false,
                        "resource not ready yet"
                    );
                }
            }
        }
    }

    /// Wait until the snapshot `namespace/name` in `client`'s cluster is ready.
    ///
    /// # Errors
    ///
    /// See [`ReadinessPoller::poll_until`].
    pub async fn await_snapshot<C>(
        &self,
        client: &C,
        namespace: &str,
        name: &str,
        deadline: Instant,
    ) -> Result<Snapshot>
    where
        C: ClusterResourceClient,
    {
        let target = AwaitTarget {
            role: client.role(),
            kind: ResourceKind::Snapshot,
            identity: format!("{namespace}/{name}"),
        };
        self.poll_until(
            &target,
            deadline,
            || client.get_snapshot(namespace, name),
            snapshot_readiness,
        )
        .await
    }
}
