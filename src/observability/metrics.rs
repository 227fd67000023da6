//! Metrics collection and exposition.
//!
//! # Metrics
//! - `discovery_queue_depth` (gauge): items queued, in flight or backing off
//! - `discovery_sync_timestamp_seconds` (gauge): last successful sync per object
//! - `discovery_object_errors_total` (counter): apply failures per object
//! - `discovery_backend_errors_total` (counter): listing/cycle errors per backend
//! - `discovery_replicated_objects` (gauge): mirrored objects per partition and kind
//! - `discovery_invalid_objects` (gauge): upstream resources rejected per partition
//! - `discovery_cycle_duration_seconds` (histogram): full reconciliation pass
//! - `discovery_apply_duration_seconds` (histogram): one queue apply call
//! - `discovery_api_duration_seconds` (histogram): one remote list call

use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::model::BackendIdentity;
use crate::sync::Action;

pub const QUEUE_DEPTH: &str = "discovery_queue_depth";
pub const SYNC_TIMESTAMP: &str = "discovery_sync_timestamp_seconds";
pub const OBJECT_ERRORS: &str = "discovery_object_errors_total";
pub const BACKEND_ERRORS: &str = "discovery_backend_errors_total";
pub const REPLICATED_OBJECTS: &str = "discovery_replicated_objects";
pub const INVALID_OBJECTS: &str = "discovery_invalid_objects";
pub const CYCLE_DURATION: &str = "discovery_cycle_duration_seconds";
pub const APPLY_DURATION: &str = "discovery_apply_duration_seconds";
pub const API_DURATION: &str = "discovery_api_duration_seconds";

/// Installs the Prometheus exporter and registers metric descriptions.
/// Failure is logged, not fatal: the service runs without metrics.
pub fn init_metrics(addr: SocketAddr) {
    if let Err(err) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::error!(error = %err, address = %addr, "failed to install metrics exporter");
        return;
    }
    describe();
    tracing::info!(address = %addr, "metrics endpoint listening");
}

fn describe() {
    describe_gauge!(QUEUE_DEPTH, "Items queued, in flight or backing off");
    describe_gauge!(SYNC_TIMESTAMP, "Timestamp of the last successful sync per object");
    describe_counter!(OBJECT_ERRORS, "Apply failures per object and operation");
    describe_counter!(BACKEND_ERRORS, "Listing and cycle errors per backend");
    describe_gauge!(REPLICATED_OBJECTS, "Mirrored objects per partition and kind");
    describe_gauge!(INVALID_OBJECTS, "Upstream resources rejected per partition");
    describe_histogram!(CYCLE_DURATION, "Duration of one full reconciliation pass");
    describe_histogram!(APPLY_DURATION, "Duration of one queue apply call");
    describe_histogram!(API_DURATION, "Duration of one remote list call");
}

pub fn set_queue_depth(backend: &BackendIdentity, depth: usize) {
    let labels = [
        ("backend", backend.name.clone()),
        ("backend_type", backend.backend_type.clone()),
    ];
    gauge!(QUEUE_DEPTH, &labels).set(depth as f64);
}

pub fn record_sync_success(backend: &BackendIdentity, action: &Action) {
    let key = action.key();
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    let labels = [
        ("backend", backend.name.clone()),
        ("kind", action.kind().to_string()),
        ("namespace", key.namespace),
        ("name", key.name),
        ("upstream", action.upstream_name.clone().unwrap_or_default()),
    ];
    gauge!(SYNC_TIMESTAMP, &labels).set(now);
}

pub fn record_sync_error(backend: &BackendIdentity, action: &Action) {
    let key = action.key();
    let labels = [
        ("backend", backend.name.clone()),
        ("kind", action.kind().to_string()),
        ("namespace", key.namespace),
        ("name", key.name),
        ("op", action.op.as_str().to_string()),
    ];
    counter!(OBJECT_ERRORS, &labels).increment(1);
}

pub fn record_backend_error(backend: &BackendIdentity, error_type: &'static str) {
    let labels = [
        ("backend", backend.name.clone()),
        ("error_type", error_type.to_string()),
    ];
    counter!(BACKEND_ERRORS, &labels).increment(1);
}

pub fn set_replicated_objects(
    backend: &BackendIdentity,
    partition: &str,
    kind: &'static str,
    count: usize,
) {
    let labels = [
        ("backend", backend.name.clone()),
        ("partition", partition.to_string()),
        ("kind", kind.to_string()),
    ];
    gauge!(REPLICATED_OBJECTS, &labels).set(count as f64);
}

pub fn set_invalid_objects(backend: &BackendIdentity, partition: &str, count: usize) {
    let labels = [
        ("backend", backend.name.clone()),
        ("partition", partition.to_string()),
    ];
    gauge!(INVALID_OBJECTS, &labels).set(count as f64);
}

pub fn observe_cycle_duration(backend: &BackendIdentity, elapsed: Duration) {
    let labels = [
        ("backend", backend.name.clone()),
        ("backend_type", backend.backend_type.clone()),
    ];
    histogram!(CYCLE_DURATION, &labels).record(elapsed.as_secs_f64());
}

pub fn observe_apply_latency(backend: &BackendIdentity, kind: &'static str, elapsed: Duration) {
    let labels = [
        ("backend", backend.name.clone()),
        ("kind", kind.to_string()),
    ];
    histogram!(APPLY_DURATION, &labels).record(elapsed.as_secs_f64());
}

pub fn observe_api_latency(
    backend: &BackendIdentity,
    operation: &'static str,
    elapsed: Duration,
) {
    let labels = [
        ("backend", backend.name.clone()),
        ("operation", operation.to_string()),
    ];
    histogram!(API_DURATION, &labels).record(elapsed.as_secs_f64());
}
