use async_trait::async_trait;
use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use kube::api::{Api, DeleteParams, PostParams};
use kube::{Client, Resource};
use snapshift_core::{
    ClusterError, ClusterRole, PreProvisionedContent, ResourceKind, Snapshot, SnapshotContent,
    SnapshotSpec, VolumeClaim,
};
use tracing::debug;

use super::resources::{
    VolumeSnapshot, VolumeSnapshotContent, claim_from_resource, claim_to_resource,
};
use crate::traits::ClusterResourceClient;

/// [`ClusterResourceClient`] backed by a Kubernetes API server.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
    role: ClusterRole,
}

impl KubeClusterClient {
    #[must_use]
    pub fn new(client: Client, role: ClusterRole) -> Self {
        Self { client, role }
    }

    /// Ask the API server for its version, returning it on success.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::Connection`] if the server is unreachable or
    /// rejects the credentials.
    pub async fn check_connection(&self) -> Result<String, ClusterError> {
        let info = self
            .client
            .apiserver_version()
            .await
            .map_err(|e| ClusterError::Connection {
                role: self.role,
                message: e.to_string(),
            })?;
        debug!(role = %self.role, version = %info.git_version, "connected");
        Ok(info.git_version)
    }

    fn claims(&self, namespace: &str) -> Api<PersistentVolumeClaim> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn snapshots(&self, namespace: &str) -> Api<VolumeSnapshot> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn contents(&self) -> Api<VolumeSnapshotContent> {
        Api::all(self.client.clone())
    }

    fn map_error(&self, err: kube::Error, kind: ResourceKind, identity: &str) -> ClusterError {
        map_kube_error(self.role, err, kind, identity)
    }

    fn malformed(&self, kind: ResourceKind, identity: &str, reason: String) -> ClusterError {
        ClusterError::Malformed {
            role: self.role,
            kind,
            identity: identity.to_string(),
            reason,
        }
    }
}

/// 404 and 409 become not-found and conflict, 401 and transport failures
/// become connection errors.
fn map_kube_error(
    role: ClusterRole,
    err: kube::Error,
    kind: ResourceKind,
    identity: &str,
) -> ClusterError {
    let identity = identity.to_string();
    match err {
        kube::Error::Api(ae) if ae.code == 404 => ClusterError::NotFound {
            role,
            kind,
            identity,
        },
        kube::Error::Api(ae) if ae.code == 409 => ClusterError::Conflict {
            role,
            kind,
            identity,
        },
        kube::Error::Api(ae) if ae.code == 401 => ClusterError::Connection {
            role,
            message: ae.message,
        },
        kube::Error::Api(ae) => ClusterError::Api {
            role,
            kind,
            identity,
            code: ae.code,
            message: ae.message,
        },
        kube::Error::SerdeError(e) => ClusterError::Malformed {
            role,
            kind,
            identity,
            reason: e.to_string(),
        },
        other => ClusterError::Connection {
            role,
            message: other.to_string(),
        },
    }
}

fn namespaced(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

#[async_trait]
impl ClusterResourceClient for KubeClusterClient {
    fn role(&self) -> ClusterRole {
        self.role
    }

    async fn get_claim(&self, namespace: &str, name: &str) -> Result<VolumeClaim, ClusterError> {
        let pvc = self
            .claims(namespace)
            .get(name)
            .await
            .map_err(|e| self.map_error(e, ResourceKind::VolumeClaim, &namespaced(namespace, name)))?;
        Ok(claim_from_resource(&pvc))
    }

    async fn create_claim(&self, claim: &VolumeClaim) -> Result<VolumeClaim, ClusterError> {
        let identity = claim.object_ref().to_string();
        let created = self
            .claims(&claim.namespace)
            .create(&PostParams::default(), &claim_to_resource(claim))
            .await
            .map_err(|e| self.map_error(e, ResourceKind::VolumeClaim, &identity))?;
        debug!(role = %self.role, claim = %identity, "created claim");
        Ok(claim_from_resource(&created))
    }

    async fn delete_claim(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.claims(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| self.map_error(e, ResourceKind::VolumeClaim, &namespaced(namespace, name)))
    }

    async fn create_snapshot(&self, spec: &SnapshotSpec) -> Result<Snapshot, ClusterError> {
        let identity = namespaced(&spec.namespace, &spec.name);
        let created = self
            .snapshots(&spec.namespace)
            .create(&PostParams::default(), &VolumeSnapshot::from_spec(spec))
            .await
            .map_err(|e| self.map_error(e, ResourceKind::Snapshot, &identity))?;
        debug!(
            role = %self.role,
            snapshot = %identity,
            uid = created.meta().uid.as_deref().unwrap_or_default(),
            "created snapshot"
        );
        Ok(created.to_snapshot())
    }

    async fn get_snapshot(&self, namespace: &str, name: &str) -> Result<Snapshot, ClusterError> {
        let snapshot = self
            .snapshots(namespace)
            .get(name)
            .await
            .map_err(|e| self.map_error(e, ResourceKind::Snapshot, &namespaced(namespace, name)))?;
        Ok(snapshot.to_snapshot())
    }

    async fn delete_snapshot(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.snapshots(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| self.map_error(e, ResourceKind::Snapshot, &namespaced(namespace, name)))
    }

    async fn create_snapshot_content(
        &self,
        content: &PreProvisionedContent,
    ) -> Result<SnapshotContent, ClusterError> {
        let name = content.name();
        let created = self
            .contents()
            .create(
                &PostParams::default(),
                &VolumeSnapshotContent::from_pre_provisioned(content),
            )
            .await
            .map_err(|e| self.map_error(e, ResourceKind::SnapshotContent, name))?;
        debug!(role = %self.role, content = name, handle = %content.handle(), "created snapshot content");
        created
            .to_content()
            .map_err(|reason| self.malformed(ResourceKind::SnapshotContent, name, reason))
    }

    async fn get_snapshot_content(&self, name: &str) -> Result<SnapshotContent, ClusterError> {
        let content = self
            .contents()
            .get(name)
            .await
            .map_err(|e| self.map_error(e, ResourceKind::SnapshotContent, name))?;
        content
            .to_content()
            .map_err(|reason| self.malformed(ResourceKind::SnapshotContent, name, reason))
    }

    async fn delete_snapshot_content(&self, name: &str) -> Result<(), ClusterError> {
        self.contents()
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| self.map_error(e, ResourceKind::SnapshotContent, name))
    }
}
