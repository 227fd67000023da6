//! Backend lister seam.
//!
//! A backend exposes load-balancing resources grouped by partition (a
//! tenant, project or namespace boundary). Adapters translate whatever the
//! remote API speaks into this neutral upstream model; the reconciler owns
//! everything downstream of it.

pub mod static_inventory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

pub use static_inventory::StaticInventory;

/// Error from a backend listing call. Recovered locally by the
/// reconciler: log, meter, skip the cycle for the affected partition.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("backend api error: {0}")]
    Api(String),

    #[error("backend unreachable: {0}")]
    Unreachable(String),
}

/// One upstream load balancer, pre-translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamLoadBalancer {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub listeners: Vec<UpstreamListener>,
}

/// A listening port on an upstream load balancer. The name may be empty;
/// translation substitutes `unnamed-<port>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamListener {
    pub name: String,
    pub port: u16,
    pub members: Vec<UpstreamMember>,
}

/// One member address behind a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamMember {
    pub address: String,
    pub port: u16,
}

/// Lists a backend's desired state.
#[async_trait]
pub trait BackendLister: Send + Sync {
    async fn list_partitions(&self) -> Result<Vec<String>, ListError>;

    async fn list_load_balancers(
        &self,
        partition: &str,
    ) -> Result<Vec<UpstreamLoadBalancer>, ListError>;
}
