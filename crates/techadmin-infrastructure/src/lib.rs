//! Infrastructure for the techadmin console: REST collaborators,
//! configuration loading and local session storage.

pub mod config_service;
pub mod paths;
pub mod rest;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::paths::AdminPaths;
pub use crate::rest::{RestBackend, RestSettings};
pub use crate::storage::SessionFile;
