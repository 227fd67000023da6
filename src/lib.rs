//! Backend load-balancer discovery and mirroring.
//!
//! Discovers load-balancing resources in external backends and
//! continuously mirrors them as service/endpoint records into a single
//! target cluster, so a downstream load balancer can fan traffic out
//! across heterogeneous backends uniformly.

// Core engine
pub mod diff;
pub mod model;
pub mod sync;
pub mod translator;

// Seams to the outside world
pub mod backends;
pub mod cluster;
pub mod reconciler;

// Cross-cutting concerns
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::DiscoveryConfig;
pub use lifecycle::Shutdown;
pub use reconciler::Reconciler;
pub use sync::SyncQueue;
