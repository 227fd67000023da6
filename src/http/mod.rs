//! Status and health endpoint.

pub mod server;

pub use server::{serve, AppState};
