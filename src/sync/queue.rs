//! The sync queue: a rate-limited, retrying worker pool.
//!
//! # Responsibilities
//! - Drain enqueued Actions through the cluster client
//! - Never process two items with the same identity concurrently
//! - Retry failed items with per-item exponential backoff, up to a budget
//! - Report queue depth, success timestamps and error counts
//!
//! Items behind a busy identity are skipped, not dropped: the first
//! eligible item wins, and equal identities drain in FIFO order, so a
//! fresher action for the same object always applies after the older one.
//! Workers wake through a watch channel whose version is marked seen
//! *before* each scan; state is always mutated before the version bump, so
//! a concurrent enqueue leaves either a visible item or a pending
//! `changed()` — never a lost wakeup.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, watch, Mutex};

use crate::cluster::ClusterClient;
use crate::config::QueueConfig;
use crate::lifecycle::Shutdown;
use crate::model::{BackendIdentity, ObjectKey};
use crate::observability::metrics;
use crate::sync::{backoff, Action};

struct QueueItem {
    action: Action,
    attempts: u32,
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<QueueItem>,
    in_flight: HashSet<ObjectKey>,
    /// Items sleeping out a backoff delay before re-entering `ready`.
    delayed: usize,
}

impl QueueState {
    fn depth(&self) -> usize {
        self.ready.len() + self.in_flight.len() + self.delayed
    }
}

struct QueueInner {
    backend: BackendIdentity,
    cluster: Arc<dyn ClusterClient>,
    config: QueueConfig,
    state: Mutex<QueueState>,
    wake_tx: watch::Sender<u64>,
}

impl QueueInner {
    fn wake(&self) {
        self.wake_tx.send_modify(|version| *version = version.wrapping_add(1));
    }
}

/// Handle to one backend's sync queue. Cheap to clone.
#[derive(Clone)]
pub struct SyncQueue {
    inner: Arc<QueueInner>,
}

impl SyncQueue {
    pub fn new(
        backend: BackendIdentity,
        cluster: Arc<dyn ClusterClient>,
        config: QueueConfig,
    ) -> Self {
        let (wake_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(QueueInner {
                backend,
                cluster,
                config,
                state: Mutex::new(QueueState::default()),
                wake_tx,
            }),
        }
    }

    /// Spawns the worker pool. Workers finish their current item and exit
    /// when the shutdown signal fires; items still queued are abandoned
    /// (the queue is rebuilt from the next reconciliation pass).
    pub fn start(&self, shutdown: &Shutdown) {
        let workers = self.inner.config.workers.max(1);
        for worker_id in 0..workers {
            let inner = self.inner.clone();
            let shutdown_rx = shutdown.subscribe();
            tokio::spawn(worker(inner, shutdown_rx, worker_id));
        }
        tracing::info!(
            backend = %self.inner.backend.name,
            workers,
            "sync queue workers started"
        );
    }

    pub async fn enqueue(&self, action: Action) {
        let depth = {
            let mut state = self.inner.state.lock().await;
            state.ready.push_back(QueueItem {
                action,
                attempts: 0,
            });
            state.depth()
        };
        metrics::set_queue_depth(&self.inner.backend, depth);
        self.inner.wake();
    }

    /// Items not yet fully processed: queued, in flight, or backing off.
    pub async fn depth(&self) -> usize {
        self.inner.state.lock().await.depth()
    }
}

async fn worker(
    inner: Arc<QueueInner>,
    mut shutdown_rx: broadcast::Receiver<()>,
    worker_id: usize,
) {
    let mut wake_rx = inner.wake_tx.subscribe();
    loop {
        let item = tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            item = next_item(&inner, &mut wake_rx) => item,
        };
        process(&inner, item).await;
    }
    tracing::debug!(backend = %inner.backend.name, worker = worker_id, "sync worker exiting");
}

/// Takes the first ready item whose identity is not in flight, marking it
/// in flight. Waits for a wake when nothing is eligible.
async fn next_item(inner: &Arc<QueueInner>, wake_rx: &mut watch::Receiver<u64>) -> QueueItem {
    loop {
        wake_rx.borrow_and_update();
        {
            let mut state = inner.state.lock().await;
            let eligible = {
                let QueueState {
                    ready, in_flight, ..
                } = &*state;
                ready
                    .iter()
                    .position(|item| !in_flight.contains(&item.action.key()))
            };
            if let Some(index) = eligible {
                if let Some(item) = state.ready.remove(index) {
                    state.in_flight.insert(item.action.key());
                    return item;
                }
            }
        }
        if wake_rx.changed().await.is_err() {
            // Sender outlives the workers; pend forever if it is ever gone
            // and let the shutdown branch win.
            std::future::pending::<()>().await;
        }
    }
}

async fn process(inner: &Arc<QueueInner>, mut item: QueueItem) {
    let key = item.action.key();
    item.attempts += 1;

    let started = Instant::now();
    let result = item.action.apply(inner.cluster.as_ref()).await;
    metrics::observe_apply_latency(&inner.backend, item.action.kind(), started.elapsed());

    match result {
        Ok(()) => {
            tracing::info!(
                backend = %inner.backend.name,
                action = %item.action,
                attempts = item.attempts,
                "synced"
            );
            metrics::record_sync_success(&inner.backend, &item.action);
            release(inner, &key, None).await;
        }
        Err(err) => {
            metrics::record_sync_error(&inner.backend, &item.action);
            if item.attempts < inner.config.max_retries {
                let delay = backoff::retry_delay(
                    item.attempts,
                    inner.config.base_delay_ms,
                    inner.config.max_delay_ms,
                );
                tracing::warn!(
                    backend = %inner.backend.name,
                    action = %item.action,
                    error = %err,
                    attempts = item.attempts,
                    delay_ms = delay.as_millis() as u64,
                    "sync failed, requeueing"
                );
                release(inner, &key, Some((item, delay))).await;
            } else {
                tracing::error!(
                    backend = %inner.backend.name,
                    action = %item.action,
                    error = %err,
                    attempts = item.attempts,
                    "sync failed, retry budget exhausted, dropping"
                );
                release(inner, &key, None).await;
            }
        }
    }
}

/// Clears the in-flight mark and, for a retry, schedules the item's
/// re-entry after its backoff delay. Delays are per item: one object's
/// failures never pause the rest of the queue.
async fn release(
    inner: &Arc<QueueInner>,
    key: &ObjectKey,
    requeue: Option<(QueueItem, Duration)>,
) {
    let depth = {
        let mut state = inner.state.lock().await;
        state.in_flight.remove(key);
        if requeue.is_some() {
            state.delayed += 1;
        }
        state.depth()
    };
    metrics::set_queue_depth(&inner.backend, depth);
    inner.wake();

    if let Some((item, delay)) = requeue {
        let inner = inner.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let depth = {
                let mut state = inner.state.lock().await;
                state.delayed -= 1;
                state.ready.push_back(item);
                state.depth()
            };
            metrics::set_queue_depth(&inner.backend, depth);
            inner.wake();
        });
    }
}
