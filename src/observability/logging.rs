//! Structured logging initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes the tracing subscriber. `RUST_LOG` overrides the
/// config-supplied level.
pub fn init(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("discovery_sync={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
