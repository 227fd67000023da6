//! Synchronization of mirrored objects into the target cluster.
//!
//! # Data Flow
//! ```text
//! diff engine / reconciler
//!     → action.rs (Action: one pending mutation)
//!     → queue.rs (rate-limited, retrying worker pool)
//!     → cluster client (create / patch / delete)
//! ```

pub mod action;
pub mod backoff;
pub mod queue;

pub use action::{Action, Op};
pub use queue::SyncQueue;
