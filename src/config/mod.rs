//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all errors collected)
//!     → DiscoveryConfig (validated, immutable)
//!     → handed to subsystems at startup
//! ```
//!
//! Config is loaded once at startup; there is no hot reload. The process
//! tolerates being constructed fresh on every start — no state persists
//! across restarts.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BackendConfig, DiscoveryConfig, InventoryConfig, ListenerConfig, LoadBalancerConfig,
    MemberConfig, ObservabilityConfig, PartitionConfig, QueueConfig, ReconcilerConfig,
    StatusConfig,
};
pub use validation::{validate_config, ValidationError};
