//! Actions: one pending mutation against one mirrored object.

use std::fmt;

use crate::cluster::{patch, ClusterClient, ClusterError};
use crate::model::{EndpointRecord, Mirrored, MirroredObject, ObjectKey, ServiceRecord};

/// The mutation to perform. Closed set; dispatch is purely on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Update,
    Delete,
}

impl Op {
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Update => "update",
            Op::Delete => "delete",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One desired mutation, consumed exactly once by the sync queue.
#[derive(Debug, Clone)]
pub struct Action {
    pub op: Op,
    pub object: MirroredObject,
    /// Pre-translation upstream name; used only for metrics attribution.
    pub upstream_name: Option<String>,
}

impl Action {
    pub fn new(op: Op, object: MirroredObject) -> Self {
        Self {
            op,
            object,
            upstream_name: None,
        }
    }

    pub fn with_upstream(mut self, upstream_name: impl Into<String>) -> Self {
        self.upstream_name = Some(upstream_name.into());
        self
    }

    pub fn key(&self) -> ObjectKey {
        self.object.key()
    }

    pub fn kind(&self) -> &'static str {
        self.object.kind()
    }

    /// Applies the mutation.
    ///
    /// Add and Update are an idempotent upsert pair: an Add that collides
    /// with an existing object becomes an Update, an Update whose target
    /// is gone becomes a create. Delete treats an already-absent object as
    /// success.
    pub async fn apply(&self, cluster: &dyn ClusterClient) -> Result<(), ClusterError> {
        match &self.object {
            MirroredObject::Service(service) => match self.op {
                Op::Add => add_service(cluster, service).await,
                Op::Update => update_service(cluster, service).await,
                Op::Delete => {
                    tolerate_not_found(cluster.delete_service(&service.key()).await)
                }
            },
            MirroredObject::Endpoints(endpoints) => match self.op {
                Op::Add => add_endpoints(cluster, endpoints).await,
                Op::Update => update_endpoints(cluster, endpoints).await,
                Op::Delete => {
                    tolerate_not_found(cluster.delete_endpoints(&endpoints.key()).await)
                }
            },
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} \"{}\"", self.op, self.kind(), self.key())
    }
}

fn tolerate_not_found(result: Result<(), ClusterError>) -> Result<(), ClusterError> {
    match result {
        Err(err) if err.is_not_found() => Ok(()),
        other => other,
    }
}

async fn add_service(
    cluster: &dyn ClusterClient,
    service: &ServiceRecord,
) -> Result<(), ClusterError> {
    match cluster.create_service(service).await {
        Err(err) if err.is_already_exists() => update_service(cluster, service).await,
        other => other,
    }
}

async fn update_service(
    cluster: &dyn ClusterClient,
    service: &ServiceRecord,
) -> Result<(), ClusterError> {
    let existing = match cluster.get_service(&service.key()).await {
        Ok(existing) => existing,
        // Gone between diff and apply: create it. A create/AlreadyExists
        // race from here is left to the queue's retry budget.
        Err(err) if err.is_not_found() => return cluster.create_service(service).await,
        Err(err) => return Err(err),
    };

    // Carry the server-assigned version so it never shows up in the patch.
    let mut desired = service.clone();
    desired.resource_version = existing.resource_version.clone();

    let patch = patch::diff_merge(
        &serde_json::to_value(&existing)?,
        &serde_json::to_value(&desired)?,
    );
    cluster.patch_service(&service.key(), patch).await
}

async fn add_endpoints(
    cluster: &dyn ClusterClient,
    endpoints: &EndpointRecord,
) -> Result<(), ClusterError> {
    match cluster.create_endpoints(endpoints).await {
        Err(err) if err.is_already_exists() => update_endpoints(cluster, endpoints).await,
        other => other,
    }
}

async fn update_endpoints(
    cluster: &dyn ClusterClient,
    endpoints: &EndpointRecord,
) -> Result<(), ClusterError> {
    let existing = match cluster.get_endpoints(&endpoints.key()).await {
        Ok(existing) => existing,
        Err(err) if err.is_not_found() => return cluster.create_endpoints(endpoints).await,
        Err(err) => return Err(err),
    };

    let mut desired = endpoints.clone();
    desired.resource_version = existing.resource_version.clone();

    let patch = patch::diff_merge(
        &serde_json::to_value(&existing)?,
        &serde_json::to_value(&desired)?,
    );
    cluster.patch_endpoints(&endpoints.key(), patch).await
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::cluster::memory::MemoryCluster;
    use crate::model::{LabelSelector, PortSpec, Protocol};

    fn svc(port: u16) -> ServiceRecord {
        let mut labels = BTreeMap::new();
        labels.insert("discovery-sync.io/backend".to_string(), "cluster1".to_string());
        ServiceRecord {
            namespace: "finance".into(),
            name: "prod".into(),
            labels,
            ports: vec![PortSpec {
                name: "http".into(),
                port,
                protocol: Protocol::Tcp,
            }],
            resource_version: None,
        }
    }

    fn action(op: Op, port: u16) -> Action {
        Action::new(op, MirroredObject::Service(svc(port)))
    }

    #[tokio::test]
    async fn test_add_creates() {
        let cluster = MemoryCluster::new();
        action(Op::Add, 80).apply(&cluster).await.unwrap();

        let stored = cluster.get_service(&svc(80).key()).await.unwrap();
        assert_eq!(stored.ports[0].port, 80);
    }

    #[tokio::test]
    async fn test_add_existing_falls_through_to_update() {
        let cluster = MemoryCluster::new();
        action(Op::Add, 80).apply(&cluster).await.unwrap();
        action(Op::Add, 8080).apply(&cluster).await.unwrap();

        let stored = cluster.get_service(&svc(80).key()).await.unwrap();
        assert_eq!(stored.ports[0].port, 8080);
    }

    #[tokio::test]
    async fn test_update_preserves_resource_version_lineage() {
        let cluster = MemoryCluster::new();
        action(Op::Add, 80).apply(&cluster).await.unwrap();
        let before = cluster.get_service(&svc(80).key()).await.unwrap();

        action(Op::Update, 9090).apply(&cluster).await.unwrap();
        let after = cluster.get_service(&svc(80).key()).await.unwrap();
        assert_eq!(after.ports[0].port, 9090);
        // The server kept assigning versions; the patch never cleared it.
        assert!(after.resource_version.is_some());
        assert_ne!(after.resource_version, before.resource_version);
    }

    #[tokio::test]
    async fn test_update_missing_falls_through_to_create() {
        let cluster = MemoryCluster::new();
        action(Op::Update, 80).apply(&cluster).await.unwrap();

        let listed = cluster
            .list_services(
                "finance",
                &LabelSelector::new("discovery-sync.io/backend", "cluster1"),
            )
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_is_success() {
        let cluster = MemoryCluster::new();
        action(Op::Delete, 80).apply(&cluster).await.unwrap();
    }

    #[test]
    fn test_display_names_the_object() {
        let a = action(Op::Add, 80);
        assert_eq!(a.to_string(), "add service \"finance/prod\"");
    }
}
