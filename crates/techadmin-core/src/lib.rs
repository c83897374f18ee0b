//! Domain layer for techadmin.
//!
//! Models, collaborator traits and the pure payload builders. Nothing in
//! this crate performs I/O.

pub mod auth;
pub mod config;
pub mod error;
pub mod technique;

// Re-export common error type
pub use error::{AdminError, Result};
