//! Observability subsystem.
//!
//! No error in this service is user-visible in the interactive sense;
//! visibility is through structured logs and the metrics endpoint, and
//! the process keeps running.

pub mod logging;
pub mod metrics;
