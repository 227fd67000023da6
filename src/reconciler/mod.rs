//! The per-backend reconciliation loop.
//!
//! # Data Flow
//! ```text
//! Periodic timer (initial pass, then every sync period)
//!     → backend lister (desired upstream state, per partition)
//!     → invalid-name filter
//!     → translate.rs (upstream → mirrored records)
//!     → cluster client (current state, ownership-label scoped)
//!     → diff engine
//!     → sync queue (one Action per change)
//! ```
//!
//! Each backend runs its own loop on its own timer; a stalled backend
//! call delays only that backend's cycle. Loops of different backends
//! share nothing but the cluster client and the metrics registry.

pub mod translate;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;

use crate::backends::{BackendLister, UpstreamLoadBalancer};
use crate::cluster::ClusterClient;
use crate::diff::{diff, DiffResult};
use crate::lifecycle::Shutdown;
use crate::model::{BackendIdentity, EndpointRecord, Mirrored, MirroredObject, ServiceRecord};
use crate::observability::metrics;
use crate::sync::{Action, Op, SyncQueue};
use crate::translator;

pub struct Reconciler {
    backend: BackendIdentity,
    lister: Arc<dyn BackendLister>,
    cluster: Arc<dyn ClusterClient>,
    queue: SyncQueue,
    sync_period: Duration,
}

impl Reconciler {
    pub fn new(
        backend: BackendIdentity,
        lister: Arc<dyn BackendLister>,
        cluster: Arc<dyn ClusterClient>,
        queue: SyncQueue,
        sync_period: Duration,
    ) -> Self {
        Self {
            backend,
            lister,
            cluster,
            queue,
            sync_period,
        }
    }

    pub fn queue(&self) -> &SyncQueue {
        &self.queue
    }

    /// Runs until shutdown: starts the queue workers, performs an initial
    /// reconciliation, then one per tick.
    pub async fn run(self, shutdown: Shutdown) {
        self.queue.start(&shutdown);
        let mut shutdown_rx = shutdown.subscribe();

        tracing::info!(
            backend = %self.backend,
            period_secs = self.sync_period.as_secs(),
            "reconciler starting"
        );

        // The first tick fires immediately: that is the initial pass.
        let mut ticker = tokio::time::interval(self.sync_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!(backend = %self.backend.name, "stopping reconciler");
                    return;
                }
                _ = ticker.tick() => self.reconcile().await,
            }
        }
    }

    /// One full reconciliation pass over every partition.
    pub async fn reconcile(&self) {
        let cycle_start = Instant::now();
        tracing::debug!(backend = %self.backend.name, "reconciling load balancers");

        let started = Instant::now();
        let partitions = match self.lister.list_partitions().await {
            Ok(partitions) => {
                metrics::observe_api_latency(&self.backend, "list_partitions", started.elapsed());
                partitions
            }
            Err(err) => {
                metrics::record_backend_error(&self.backend, "ListPartitions");
                tracing::error!(
                    backend = %self.backend.name,
                    error = %err,
                    "error listing backend partitions"
                );
                return;
            }
        };

        for partition in &partitions {
            self.reconcile_partition(partition).await;
        }

        metrics::observe_cycle_duration(&self.backend, cycle_start.elapsed());
    }

    async fn reconcile_partition(&self, partition: &str) {
        let started = Instant::now();
        let load_balancers = match self.lister.list_load_balancers(partition).await {
            Ok(lbs) => {
                metrics::observe_api_latency(
                    &self.backend,
                    "list_load_balancers",
                    started.elapsed(),
                );
                lbs
            }
            Err(err) => {
                metrics::record_backend_error(&self.backend, "ListLoadBalancers");
                tracing::error!(
                    backend = %self.backend.name,
                    partition,
                    error = %err,
                    "error reconciling partition"
                );
                return;
            }
        };

        let total = load_balancers.len();
        let valid: Vec<UpstreamLoadBalancer> = load_balancers
            .into_iter()
            .filter(|lb| self.validate_upstream(partition, lb))
            .collect();
        let invalid = total - valid.len();
        metrics::set_invalid_objects(&self.backend, partition, invalid);

        let desired_services: Vec<ServiceRecord> = valid
            .iter()
            .map(|lb| translate::service_for(&self.backend, partition, lb))
            .collect();
        let desired_endpoints: Vec<EndpointRecord> = valid
            .iter()
            .map(|lb| translate::endpoints_for(&self.backend, partition, lb))
            .collect();
        metrics::set_replicated_objects(&self.backend, partition, "service", desired_services.len());
        metrics::set_replicated_objects(
            &self.backend,
            partition,
            "endpoints",
            desired_endpoints.len(),
        );

        let selector = translator::ownership_selector(&self.backend);

        let started = Instant::now();
        let current_services = match self.cluster.list_services(partition, &selector).await {
            Ok(services) => services,
            Err(err) => {
                metrics::record_backend_error(&self.backend, "ListServices");
                tracing::error!(
                    backend = %self.backend.name,
                    partition,
                    error = %err,
                    "error listing mirrored services"
                );
                return;
            }
        };
        let current_endpoints = match self.cluster.list_endpoints(partition, &selector).await {
            Ok(endpoints) => endpoints,
            Err(err) => {
                metrics::record_backend_error(&self.backend, "ListEndpoints");
                tracing::error!(
                    backend = %self.backend.name,
                    partition,
                    error = %err,
                    "error listing mirrored endpoints"
                );
                return;
            }
        };
        metrics::observe_api_latency(&self.backend, "list_mirrored", started.elapsed());

        // An incomplete desired snapshot must not tear objects down, so a
        // partition with invalid upstream names keeps its deletions parked
        // until a fully valid cycle.
        let suppress_deletes = invalid > 0;

        self.enqueue_changes(
            partition,
            diff(&desired_services, &current_services),
            MirroredObject::Service,
            suppress_deletes,
        )
        .await;
        self.enqueue_changes(
            partition,
            diff(&desired_endpoints, &current_endpoints),
            MirroredObject::Endpoints,
            suppress_deletes,
        )
        .await;
    }

    /// Rejects upstream resources whose names cannot become valid
    /// target-cluster identifiers. Anonymous listeners are allowed; named
    /// ones must be DNS labels.
    fn validate_upstream(&self, partition: &str, lb: &UpstreamLoadBalancer) -> bool {
        if !translator::is_valid_dns_label(&lb.name) {
            metrics::record_backend_error(&self.backend, "InvalidUpstreamName");
            tracing::warn!(
                backend = %self.backend.name,
                partition,
                upstream = %lb.name,
                "skipping load balancer with invalid name"
            );
            return false;
        }
        for listener in &lb.listeners {
            if !listener.name.is_empty() && !translator::is_valid_dns_label(&listener.name) {
                metrics::record_backend_error(&self.backend, "InvalidListenerName");
                tracing::warn!(
                    backend = %self.backend.name,
                    partition,
                    upstream = %lb.name,
                    listener = %listener.name,
                    "skipping load balancer with invalid listener name"
                );
                return false;
            }
        }
        true
    }

    async fn enqueue_changes<T, F>(
        &self,
        partition: &str,
        changes: DiffResult<T>,
        wrap: F,
        suppress_deletes: bool,
    ) where
        T: Mirrored,
        F: Fn(T) -> MirroredObject,
    {
        for obj in changes.add {
            self.enqueue(Op::Add, wrap(obj)).await;
        }
        for obj in changes.update {
            self.enqueue(Op::Update, wrap(obj)).await;
        }
        if suppress_deletes {
            if !changes.delete.is_empty() {
                tracing::warn!(
                    backend = %self.backend.name,
                    partition,
                    skipped = changes.delete.len(),
                    "partition has invalid upstream names, deferring deletions"
                );
            }
            return;
        }
        for obj in changes.delete {
            self.enqueue(Op::Delete, wrap(obj)).await;
        }
    }

    async fn enqueue(&self, op: Op, object: MirroredObject) {
        let upstream = object.labels().get(translator::SERVICE_LABEL).cloned();
        let mut action = Action::new(op, object);
        if let Some(upstream) = upstream {
            action = action.with_upstream(upstream);
        }
        tracing::debug!(backend = %self.backend.name, action = %action, "enqueueing");
        self.queue.enqueue(action).await;
    }
}
