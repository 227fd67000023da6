//! Semantic configuration validation.
//!
//! Serde handles the syntactic layer; this pass checks value ranges and
//! naming rules, and returns every violation rather than the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::DiscoveryConfig;
use crate::translator;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("backend.name is required")]
    MissingBackendName,

    #[error("backend.name {0:?} is not a valid DNS label")]
    InvalidBackendName(String),

    #[error("reconciler.sync_period_secs must be greater than zero")]
    ZeroSyncPeriod,

    #[error("queue.workers must be greater than zero")]
    ZeroWorkers,

    #[error("queue.max_retries must be greater than zero")]
    ZeroRetries,

    #[error("{field} {value:?} is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("inventory partition {0:?} is not a valid DNS label")]
    InvalidPartitionName(String),
}

/// Checks the whole config, collecting every violation.
pub fn validate_config(config: &DiscoveryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backend.name.is_empty() {
        errors.push(ValidationError::MissingBackendName);
    } else if !translator::is_valid_dns_label(&config.backend.name) {
        errors.push(ValidationError::InvalidBackendName(
            config.backend.name.clone(),
        ));
    }

    if config.reconciler.sync_period_secs == 0 {
        errors.push(ValidationError::ZeroSyncPeriod);
    }
    if config.queue.workers == 0 {
        errors.push(ValidationError::ZeroWorkers);
    }
    if config.queue.max_retries == 0 {
        errors.push(ValidationError::ZeroRetries);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }
    if config.status.enabled && config.status.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "status.bind_address",
            value: config.status.bind_address.clone(),
        });
    }

    // Partition names become target-cluster namespaces.
    for partition in &config.inventory.partitions {
        if !translator::is_valid_dns_label(&partition.name) {
            errors.push(ValidationError::InvalidPartitionName(partition.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
