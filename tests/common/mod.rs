//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use discovery_sync::backends::StaticInventory;
use discovery_sync::cluster::memory::MemoryCluster;
use discovery_sync::config::{
    InventoryConfig, ListenerConfig, LoadBalancerConfig, MemberConfig, PartitionConfig,
    QueueConfig,
};
use discovery_sync::model::BackendIdentity;
use discovery_sync::{Reconciler, Shutdown, SyncQueue};

pub const BACKEND_NAME: &str = "cluster1";

pub fn listener(name: &str, port: u16, members: &[(&str, u16)]) -> ListenerConfig {
    ListenerConfig {
        name: name.to_string(),
        port,
        members: members
            .iter()
            .map(|(address, port)| MemberConfig {
                address: (*address).to_string(),
                port: *port,
            })
            .collect(),
    }
}

pub fn load_balancer(name: &str, listeners: Vec<ListenerConfig>) -> LoadBalancerConfig {
    LoadBalancerConfig {
        name: name.to_string(),
        labels: BTreeMap::new(),
        listeners,
    }
}

pub fn partition(name: &str, load_balancers: Vec<LoadBalancerConfig>) -> PartitionConfig {
    PartitionConfig {
        name: name.to_string(),
        load_balancers,
    }
}

pub fn inventory(partitions: Vec<PartitionConfig>) -> InventoryConfig {
    InventoryConfig { partitions }
}

pub struct Harness {
    pub cluster: Arc<MemoryCluster>,
    pub reconciler: Reconciler,
    pub shutdown: Shutdown,
}

impl Harness {
    /// Runs one reconciliation cycle and waits for the queue to drain.
    pub async fn run_cycle(&self) {
        self.reconciler.reconcile().await;
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.reconciler.queue().depth().await > 0 {
            assert!(Instant::now() < deadline, "queue did not drain in time");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

pub fn harness(inventory: InventoryConfig) -> Harness {
    harness_on(BACKEND_NAME, Arc::new(MemoryCluster::new()), inventory)
}

/// Builds a reconciler against an existing cluster, so tests can re-point
/// a second "cycle" at changed upstream state.
pub fn harness_on(
    backend_name: &str,
    cluster: Arc<MemoryCluster>,
    inventory: InventoryConfig,
) -> Harness {
    let backend = BackendIdentity::new(backend_name, "static");
    let queue = SyncQueue::new(
        backend.clone(),
        cluster.clone(),
        QueueConfig {
            workers: 2,
            max_retries: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
    );
    let reconciler = Reconciler::new(
        backend,
        Arc::new(StaticInventory::from_config(inventory)),
        cluster.clone(),
        queue.clone(),
        Duration::from_secs(3600),
    );
    let shutdown = Shutdown::new();
    queue.start(&shutdown);
    Harness {
        cluster,
        reconciler,
        shutdown,
    }
}
