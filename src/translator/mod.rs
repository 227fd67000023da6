//! Name and label translation.
//!
//! # Data Flow
//! ```text
//! (backend name, upstream resource name)
//!     → name.rs (length-bounded, collision-resistant join)
//!     → labels.rs (reserved ownership labels overlaid on upstream labels)
//!     → model::ServiceRecord / EndpointRecord metadata
//! ```
//!
//! Translation is pure and deterministic: the same inputs produce the same
//! name on every reconciliation cycle, otherwise the diff engine would see
//! spurious adds and deletes.

pub mod labels;
pub mod name;

pub use labels::{build_labels, ownership_selector, BACKEND_LABEL, SERVICE_LABEL};
pub use name::{build_name, is_valid_dns_label, shorten_label_value, MAX_NAME_LEN};
