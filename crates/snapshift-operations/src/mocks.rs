use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use snapshift_core::{
    ClusterError, ClusterRole, ContentSource, DeletionPolicy, Handle, ObjectRef,
    PreProvisionedContent, ResourceKind, Snapshot, SnapshotContent, SnapshotSource, SnapshotSpec,
    SnapshotStatus, VolumeClaim,
};

use crate::traits::{Clock, ClusterResourceClient};

pub const FAKE_DRIVER: &str = "hostpath.csi.k8s.io";
pub const FAKE_HANDLE: &str = "snap-0f3a9c2e71d4b8a61";
pub const FAKE_RESTORE_SIZE: &str = "10Gi";
pub const FAKE_EPOCH: i64 = 1_700_000_000;

/// One call made against a [`FakeCluster`], identity included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetClaim(String),
    CreateClaim(String),
    DeleteClaim(String),
    CreateSnapshot(String),
    GetSnapshot(String),
    DeleteSnapshot(String),
    CreateContent(String),
    GetContent(String),
    DeleteContent(String),
}

impl Call {
    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(
            self,
            Self::DeleteClaim(_) | Self::DeleteSnapshot(_) | Self::DeleteContent(_)
        )
    }
}

#[derive(Default)]
struct FakeState {
    claims: HashMap<String, VolumeClaim>,
    snapshots: HashMap<String, Snapshot>,
    contents: HashMap<String, SnapshotContent>,
    polls: HashMap<String, u32>,
    calls: Vec<Call>,
}

/// In-memory cluster with a scripted snapshot controller.
///
/// A snapshot becomes ready on its `ready_after`-th get. A ready snapshot
/// created from a claim gets a dynamically provisioned content carrying
/// [`FAKE_HANDLE`]; a pre-bound snapshot binds to the content it names.
pub struct FakeCluster {
    role: ClusterRole,
    ready_after: u32,
    never_ready: bool,
    backend_error: Option<String>,
    without_binding: bool,
    without_handle: bool,
    handle: String,
    failing_creates: HashSet<String>,
    failing_deletes: HashSet<String>,
    hanging: HashSet<String>,
    state: Mutex<FakeState>,
}

impl FakeCluster {
    #[must_use]
    pub fn new(role: ClusterRole) -> Self {
        Self {
            role,
            ready_after: 1,
            never_ready: false,
            backend_error: None,
            without_binding: false,
            without_handle: false,
            handle: FAKE_HANDLE.to_string(),
            failing_creates: HashSet::new(),
            failing_deletes: HashSet::new(),
            hanging: HashSet::new(),
            state: Mutex::new(FakeState::default()),
        }
    }

    #[must_use]
    pub fn origin() -> Self {
        Self::new(ClusterRole::Origin)
    }

    #[must_use]
    pub fn destination() -> Self {
        Self::new(ClusterRole::Destination)
    }

    #[must_use]
    pub fn with_claim(self, claim: VolumeClaim) -> Self {
        self.lock()
            .claims
            .insert(claim.object_ref().to_string(), claim);
        self
    }

    /// A `10Gi`, `ReadWriteOnce` claim on storage class `standard`.
    #[must_use]
    pub fn with_standard_claim(self, namespace: &str, name: &str) -> Self {
        self.with_claim(VolumeClaim {
            name: name.to_string(),
            namespace: namespace.to_string(),
            storage: Some(FAKE_RESTORE_SIZE.to_string()),
            access_modes: vec!["ReadWriteOnce".to_string()],
            storage_class: Some("standard".to_string()),
            data_source: None,
        })
    }

    #[must_use]
    pub fn with_existing_snapshot(self, namespace: &str, name: &str) -> Self {
        let snapshot = Snapshot {
            name: name.to_string(),
            namespace: namespace.to_string(),
            source: None,
            snapshot_class: None,
            status: SnapshotStatus::default(),
        };
        self.lock()
            .snapshots
            .insert(format!("{namespace}/{name}"), snapshot);
        self
    }

    #[must_use]
    pub fn with_existing_content(self, name: &str) -> Self {
        let content = SnapshotContent {
            name: name.to_string(),
            driver: FAKE_DRIVER.to_string(),
            deletion_policy: DeletionPolicy::Delete,
            snapshot_class: None,
            snapshot_ref: ObjectRef::new("other", "other"),
            source: ContentSource::SnapshotHandle(Handle::new("snap-foreign")),
            status_handle: None,
            ready_to_use: true,
        };
        self.lock().contents.insert(name.to_string(), content);
        self
    }

    #[must_use]
    pub fn ready_after_polls(mut self, polls: u32) -> Self {
        self.ready_after = polls;
        self
    }

    #[must_use]
    pub fn never_ready(mut self) -> Self {
        self.never_ready = true;
        self
    }

    #[must_use]
    pub fn with_backend_error(mut self, message: &str) -> Self {
        self.backend_error = Some(message.to_string());
        self
    }

    /// Ready snapshots report no bound content.
    #[must_use]
    pub fn without_binding(mut self) -> Self {
        self.without_binding = true;
        self
    }

    /// Dynamically provisioned contents never report a handle.
    #[must_use]
    pub fn without_handle(mut self) -> Self {
        self.without_handle = true;
        self
    }

    #[must_use]
    pub fn with_handle(mut self, handle: &str) -> Self {
        self.handle = handle.to_string();
        self
    }

    /// Creating the resource with this identity fails with an API error.
    #[must_use]
    pub fn failing_create(mut self, identity: &str) -> Self {
        self.failing_creates.insert(identity.to_string());
        self
    }

    /// Deleting the resource with this identity fails with an API error.
    #[must_use]
    pub fn failing_delete(mut self, identity: &str) -> Self {
        self.failing_deletes.insert(identity.to_string());
        self
    }

    /// Gets and creates of this identity take effect but never return.
    #[must_use]
    pub fn hanging(mut self, identity: &str) -> Self {
        self.hanging.insert(identity.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn deletes(&self) -> Vec<Call> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.is_delete())
            .cloned()
            .collect()
    }

    pub fn polls(&self, namespace: &str, name: &str) -> u32 {
        self.lock()
            .polls
            .get(&format!("{namespace}/{name}"))
            .copied()
            .unwrap_or_default()
    }

    pub fn snapshot(&self, namespace: &str, name: &str) -> Option<Snapshot> {
        self.lock()
            .snapshots
            .get(&format!("{namespace}/{name}"))
            .cloned()
    }

    pub fn content(&self, name: &str) -> Option<SnapshotContent> {
        self.lock().contents.get(name).cloned()
    }

    pub fn claim(&self, namespace: &str, name: &str) -> Option<VolumeClaim> {
        self.lock()
            .claims
            .get(&format!("{namespace}/{name}"))
            .cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake cluster state poisoned")
    }

    async fn hang_if_scripted(&self, identity: &str) {
        if self.hanging.contains(identity) {
            std::future::pending::<()>().await;
        }
    }

    fn not_found(&self, kind: ResourceKind, identity: &str) -> ClusterError {
        ClusterError::NotFound {
            role: self.role,
            kind,
            identity: identity.to_string(),
        }
    }

    fn check_create(
        &self,
        existing: bool,
        kind: ResourceKind,
        identity: &str,
    ) -> Result<(), ClusterError> {
        if self.failing_creates.contains(identity) {
            return Err(ClusterError::Api {
                role: self.role,
                kind,
                identity: identity.to_string(),
                code: 500,
                message: "injected create failure".to_string(),
            });
        }
        if existing {
            return Err(ClusterError::Conflict {
                role: self.role,
                kind,
                identity: identity.to_string(),
            });
        }
        Ok(())
    }

    fn check_delete(&self, kind: ResourceKind, identity: &str) -> Result<(), ClusterError> {
        if self.failing_deletes.contains(identity) {
            return Err(ClusterError::Api {
                role: self.role,
                kind,
                identity: identity.to_string(),
                code: 403,
                message: "injected delete failure".to_string(),
            });
        }
        Ok(())
    }

    /// Advance the scripted controller for one get of `key`.
    fn reconcile(&self, state: &mut FakeState, key: &str) {
        let polls = {
            let count = state.polls.entry(key.to_string()).or_default();
            *count += 1;
            *count
        };
        let Some(snapshot) = state.snapshots.get_mut(key) else {
            return;
        };

        if let Some(message) = &self.backend_error {
            snapshot.status.error_message = Some(message.clone());
            return;
        }
        if self.never_ready || polls < self.ready_after || snapshot.status.ready_to_use {
            return;
        }

        snapshot.status.ready_to_use = true;
        snapshot.status.restore_size = Some(FAKE_RESTORE_SIZE.to_string());
        if self.without_binding {
            return;
        }

        match snapshot.source.clone() {
            Some(SnapshotSource::PersistentVolumeClaim(claim)) => {
                let content_name = format!("snapcontent-{}-{}", snapshot.namespace, snapshot.name);
                let content = SnapshotContent {
                    name: content_name.clone(),
                    driver: FAKE_DRIVER.to_string(),
                    deletion_policy: DeletionPolicy::Delete,
                    snapshot_class: snapshot.snapshot_class.clone(),
                    snapshot_ref: ObjectRef::new(&snapshot.namespace, &snapshot.name),
                    source: ContentSource::VolumeHandle(format!("pvc-{claim}")),
                    status_handle: if self.without_handle {
                        None
                    } else {
                        Some(Handle::new(&self.handle))
                    },
                    ready_to_use: true,
                };
                snapshot.status.bound_content_name = Some(content_name.clone());
                state.contents.insert(content_name, content);
            }
            Some(SnapshotSource::SnapshotContent(content_name)) => {
                snapshot.status.bound_content_name = Some(content_name.clone());
                if let Some(content) = state.contents.get_mut(&content_name) {
                    content.ready_to_use = true;
                }
            }
            None => {}
        }
    }
}

#[async_trait]
impl ClusterResourceClient for FakeCluster {
    fn role(&self) -> ClusterRole {
        self.role
    }

    async fn get_claim(&self, namespace: &str, name: &str) -> Result<VolumeClaim, ClusterError> {
        let key = format!("{namespace}/{name}");
        let result = {
            let mut state = self.lock();
            state.calls.push(Call::GetClaim(key.clone()));
            state
                .claims
                .get(&key)
                .cloned()
                .ok_or_else(|| self.not_found(ResourceKind::VolumeClaim, &key))
        };
        self.hang_if_scripted(&key).await;
        result
    }

    async fn create_claim(&self, claim: &VolumeClaim) -> Result<VolumeClaim, ClusterError> {
        let key = claim.object_ref().to_string();
        let result = {
            let mut state = self.lock();
            state.calls.push(Call::CreateClaim(key.clone()));
            self.check_create(
                state.claims.contains_key(&key),
                ResourceKind::VolumeClaim,
                &key,
            )
            .map(|()| {
                state.claims.insert(key.clone(), claim.clone());
                claim.clone()
            })
        };
        self.hang_if_scripted(&key).await;
        result
    }

    async fn delete_claim(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        let key = format!("{namespace}/{name}");
        let mut state = self.lock();
        state.calls.push(Call::DeleteClaim(key.clone()));
        self.check_delete(ResourceKind::VolumeClaim, &key)?;
        state
            .claims
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| self.not_found(ResourceKind::VolumeClaim, &key))
    }

    async fn create_snapshot(&self, spec: &SnapshotSpec) -> Result<Snapshot, ClusterError> {
        let key = format!("{}/{}", spec.namespace, spec.name);
        let result = {
            let mut state = self.lock();
            state.calls.push(Call::CreateSnapshot(key.clone()));
            self.check_create(
                state.snapshots.contains_key(&key),
                ResourceKind::Snapshot,
                &key,
            )
            .map(|()| {
                let snapshot = Snapshot {
                    name: spec.name.clone(),
                    namespace: spec.namespace.clone(),
                    source: Some(spec.source.clone()),
                    snapshot_class: spec.snapshot_class.clone(),
                    status: SnapshotStatus::default(),
                };
                state.snapshots.insert(key.clone(), snapshot.clone());
                snapshot
            })
        };
        self.hang_if_scripted(&key).await;
        result
    }

    async fn get_snapshot(&self, namespace: &str, name: &str) -> Result<Snapshot, ClusterError> {
        let key = format!("{namespace}/{name}");
        let result = {
            let mut state = self.lock();
            state.calls.push(Call::GetSnapshot(key.clone()));
            self.reconcile(&mut state, &key);
            state
                .snapshots
                .get(&key)
                .cloned()
                .ok_or_else(|| self.not_found(ResourceKind::Snapshot, &key))
        };
        self.hang_if_scripted(&key).await;
        result
    }

    async fn delete_snapshot(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        let key = format!("{namespace}/{name}");
        let mut state = self.lock();
        state.calls.push(Call::DeleteSnapshot(key.clone()));
        self.check_delete(ResourceKind::Snapshot, &key)?;
        state
            .snapshots
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| self.not_found(ResourceKind::Snapshot, &key))
    }

    async fn create_snapshot_content(
        &self,
        content: &PreProvisionedContent,
    ) -> Result<SnapshotContent, ClusterError> {
        let name = content.name().to_string();
        let result = {
            let mut state = self.lock();
            state.calls.push(Call::CreateContent(name.clone()));
            self.check_create(
                state.contents.contains_key(&name),
                ResourceKind::SnapshotContent,
                &name,
            )
            .map(|()| {
                let created = content.to_content();
                state.contents.insert(name.clone(), created.clone());
                created
            })
        };
        self.hang_if_scripted(&name).await;
        result
    }

    async fn get_snapshot_content(&self, name: &str) -> Result<SnapshotContent, ClusterError> {
        let result = {
            let mut state = self.lock();
            state.calls.push(Call::GetContent(name.to_string()));
            state
                .contents
                .get(name)
                .cloned()
                .ok_or_else(|| self.not_found(ResourceKind::SnapshotContent, name))
        };
        self.hang_if_scripted(name).await;
        result
    }

    async fn delete_snapshot_content(&self, name: &str) -> Result<(), ClusterError> {
        let mut state = self.lock();
        state.calls.push(Call::DeleteContent(name.to_string()));
        self.check_delete(ResourceKind::SnapshotContent, name)?;
        state
            .contents
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| self.not_found(ResourceKind::SnapshotContent, name))
    }
}

/// Virtual clock: `sleep` advances time instantly.
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Virtual time passed since construction.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().expect("clock poisoned")
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn unix_timestamp(&self) -> i64 {
        FAKE_EPOCH + i64::try_from(self.elapsed().as_secs()).unwrap_or(i64::MAX)
    }

    async fn sleep(&self, duration: Duration) {
        *self.offset.lock().expect("clock poisoned") += duration;
    }

    /// Fake calls take no virtual time, so a call that is not complete on
    /// its first poll never completes: time jumps to the deadline.
    async fn timeout_at<F>(&self, deadline: Instant, future: F) -> Option<F::Output>
    where
        F: Future + Send,
        F::Output: Send,
    {
        tokio::select! {
            biased;
            output = future => Some(output),
            () = std::future::ready(()) => {
                let remaining = deadline.saturating_duration_since(self.now());
                *self.offset.lock().expect("clock poisoned") += remaining;
                None
            }
        }
    }
}
