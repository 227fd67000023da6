//! Discovery daemon entry point.
//!
//! Startup order: logging → config → metrics → subsystems → loops.
//! Shutdown is signal-driven: the reconciler stops scheduling cycles and
//! queue workers finish their current item, then the process exits.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use discovery_sync::backends::StaticInventory;
use discovery_sync::cluster::memory::MemoryCluster;
use discovery_sync::config;
use discovery_sync::http::{self, AppState};
use discovery_sync::lifecycle::{self, Shutdown};
use discovery_sync::model::BackendIdentity;
use discovery_sync::observability::{logging, metrics};
use discovery_sync::{Reconciler, SyncQueue};

#[derive(Parser, Debug)]
#[command(name = "discovery-sync", version, about = "Mirrors backend load balancers into a target cluster")]
struct Args {
    /// Path to the configuration file.
    #[arg(long, default_value = "discovery.toml")]
    config: PathBuf,

    /// Override the backend name from the config file.
    #[arg(long)]
    backend_name: Option<String>,

    /// Override the reconciliation period in seconds.
    #[arg(long)]
    sync_period_secs: Option<u64>,

    /// Override the number of queue workers.
    #[arg(long)]
    workers: Option<usize>,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = config::load_config(&args.config)?;
    if let Some(name) = args.backend_name {
        config.backend.name = name;
    }
    if let Some(period) = args.sync_period_secs {
        config.reconciler.sync_period_secs = period;
    }
    if let Some(workers) = args.workers {
        config.queue.workers = workers;
    }
    // Re-check: overrides may have changed validated fields.
    config::validate_config(&config).map_err(config::ConfigError::Validation)?;

    let log_level = if args.debug {
        "debug"
    } else {
        config.observability.log_level.as_str()
    };
    logging::init(log_level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "discovery-sync starting");
    tracing::info!(
        backend = %config.backend.name,
        backend_type = %config.backend.backend_type,
        sync_period_secs = config.reconciler.sync_period_secs,
        workers = config.queue.workers,
        "configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(err) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %err,
                "failed to parse metrics address"
            ),
        }
    }

    let backend = BackendIdentity::new(
        config.backend.name.clone(),
        config.backend.backend_type.clone(),
    );
    let cluster = Arc::new(MemoryCluster::new());
    let lister = Arc::new(StaticInventory::from_config(config.inventory.clone()));
    let queue = SyncQueue::new(backend.clone(), cluster.clone(), config.queue.clone());

    let shutdown = Shutdown::new();

    let reconciler = Reconciler::new(
        backend.clone(),
        lister,
        cluster.clone(),
        queue.clone(),
        config.reconciler.sync_period(),
    );
    let reconciler_task = tokio::spawn(reconciler.run(shutdown.clone()));

    let status_task = if config.status.enabled {
        let addr = config.status.bind_address.parse()?;
        let state = AppState {
            backend,
            cluster,
            queue,
        };
        let shutdown = shutdown.clone();
        Some(tokio::spawn(async move {
            if let Err(err) = http::serve(addr, state, &shutdown).await {
                tracing::error!(error = %err, "status endpoint failed");
            }
        }))
    } else {
        None
    };

    lifecycle::wait_for_signal().await;
    tracing::info!("shutting down");
    shutdown.trigger();

    let _ = reconciler_task.await;
    if let Some(task) = status_task {
        let _ = task.await;
    }

    tracing::info!("shutdown complete");
    Ok(())
}
