//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the TOML config
//! file; every section has defaults so a minimal config works.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the discoverer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Identity of the backend being mirrored.
    pub backend: BackendConfig,

    /// Reconciliation loop settings.
    pub reconciler: ReconcilerConfig,

    /// Sync queue settings.
    pub queue: QueueConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Status/health endpoint settings.
    pub status: StatusConfig,

    /// Static inventory served by the built-in backend adapter.
    pub inventory: InventoryConfig,
}

/// Backend identity. The name is mandatory and must be a DNS label; it is
/// stamped onto every mirrored object.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Unique backend instance name.
    pub name: String,

    /// Backend type tag, recorded in logs and metrics.
    pub backend_type: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            backend_type: "static".to_string(),
        }
    }
}

/// Reconciliation loop settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Seconds between full reconciliation passes.
    pub sync_period_secs: u64,
}

impl ReconcilerConfig {
    pub fn sync_period(&self) -> Duration {
        Duration::from_secs(self.sync_period_secs)
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            sync_period_secs: 30,
        }
    }
}

/// Sync queue settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Number of worker tasks draining the queue.
    pub workers: usize,

    /// Attempts per item before it is dropped.
    pub max_retries: u32,

    /// Base delay for retry backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for retry backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 5000,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Status/health endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Enable the status endpoint.
    pub enabled: bool,

    /// Status endpoint bind address.
    pub bind_address: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8089".to_string(),
        }
    }
}

/// Inventory for the static backend adapter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct InventoryConfig {
    pub partitions: Vec<PartitionConfig>,
}

/// One partition (tenant/namespace boundary) of the static backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PartitionConfig {
    pub name: String,

    #[serde(default)]
    pub load_balancers: Vec<LoadBalancerConfig>,
}

/// One load balancer in the static inventory.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoadBalancerConfig {
    pub name: String,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub listeners: Vec<ListenerConfig>,
}

/// A listening port and its members.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenerConfig {
    /// Listener name; empty means unnamed.
    #[serde(default)]
    pub name: String,

    pub port: u16,

    #[serde(default)]
    pub members: Vec<MemberConfig>,
}

/// One member address behind a listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MemberConfig {
    pub address: String,
    pub port: u16,
}
