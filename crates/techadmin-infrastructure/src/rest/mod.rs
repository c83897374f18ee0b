//! REST-backed collaborators.
//!
//! # Module Structure
//!
//! - `client`: Settings, the shared backend handle and response handling
//! - `auth`: `IdentityProvider` (password grant, refresh, logout)
//! - `roles`: `RoleRepository` over the roles table
//! - `catalogue`: `CatalogueService` (search RPC + admin function)

mod auth;
mod catalogue;
mod client;
mod roles;

pub use client::{RestBackend, RestSettings};
