//! Status server: liveness plus a snapshot of the mirrored state.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::cluster::memory::MemoryCluster;
use crate::lifecycle::Shutdown;
use crate::model::{BackendIdentity, MirroredObject};
use crate::sync::SyncQueue;

/// State injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: BackendIdentity,
    pub cluster: Arc<MemoryCluster>,
    pub queue: SyncQueue,
}

#[derive(Serialize)]
struct SystemStatus {
    version: &'static str,
    backend: String,
    backend_type: String,
    queue_depth: usize,
    services: usize,
    endpoints: usize,
}

async fn healthz() -> &'static str {
    "ok"
}

async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        backend: state.backend.name.clone(),
        backend_type: state.backend.backend_type.clone(),
        queue_depth: state.queue.depth().await,
        services: state.cluster.service_count(),
        endpoints: state.cluster.endpoints_count(),
    })
}

async fn get_objects(State(state): State<AppState>) -> Json<Vec<MirroredObject>> {
    Json(state.cluster.snapshot())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/status", get(get_status))
        .route("/objects", get(get_objects))
        .with_state(state)
}

/// Serves the status endpoint until shutdown.
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: &Shutdown,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "status endpoint listening");

    let mut shutdown_rx = shutdown.subscribe();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
}
