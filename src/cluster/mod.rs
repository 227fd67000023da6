//! Target-cluster client seam.
//!
//! # Data Flow
//! ```text
//! sync::Action::apply
//!     → ClusterClient (list / get / create / patch / delete per kind)
//!     → target cluster (MemoryCluster in-process, or a real API client)
//! ```
//!
//! The client connection is shared across all queue workers and loops;
//! implementations must be safe for concurrent use.

pub mod memory;
pub mod patch;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{EndpointRecord, LabelSelector, ObjectKey, ServiceRecord};

/// Error taxonomy for target-cluster operations.
///
/// `AlreadyExists` and `NotFound` drive the upsert fallthrough in
/// `sync::Action::apply`; everything else is treated as transient and
/// retried by the queue up to its budget.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("object {0} already exists")]
    AlreadyExists(ObjectKey),

    #[error("object {0} not found")]
    NotFound(ObjectKey),

    #[error("cluster api error: {0}")]
    Api(String),

    #[error("object encoding failed: {0}")]
    Codec(#[from] serde_json::Error),
}

impl ClusterError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ClusterError::AlreadyExists(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound(_))
    }
}

/// Operations the sync layer needs against the target cluster, four per
/// mirrored kind plus a get used to compute patches.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn list_services(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<ServiceRecord>, ClusterError>;

    async fn get_service(&self, key: &ObjectKey) -> Result<ServiceRecord, ClusterError>;

    async fn create_service(&self, service: &ServiceRecord) -> Result<(), ClusterError>;

    /// Merge-semantics patch; server-assigned metadata survives.
    async fn patch_service(
        &self,
        key: &ObjectKey,
        patch: serde_json::Value,
    ) -> Result<(), ClusterError>;

    async fn delete_service(&self, key: &ObjectKey) -> Result<(), ClusterError>;

    async fn list_endpoints(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<EndpointRecord>, ClusterError>;

    async fn get_endpoints(&self, key: &ObjectKey) -> Result<EndpointRecord, ClusterError>;

    async fn create_endpoints(&self, endpoints: &EndpointRecord) -> Result<(), ClusterError>;

    async fn patch_endpoints(
        &self,
        key: &ObjectKey,
        patch: serde_json::Value,
    ) -> Result<(), ClusterError>;

    async fn delete_endpoints(&self, key: &ObjectKey) -> Result<(), ClusterError>;
}
