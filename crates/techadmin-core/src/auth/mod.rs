//! Authentication and authorization domain module.
//!
//! # Module Structure
//!
//! - `model`: Session and user identity types, session-change events
//! - `provider`: Identity provider trait (sign-in, sign-out, change stream)
//! - `role`: Role set and role repository trait
//!
//! # Usage
//!
//! ```ignore
//! use techadmin_core::auth::{Session, IdentityProvider, RoleRepository, RoleSet};
//! ```

mod model;
mod provider;
mod role;

// Re-export public API
pub use model::{AuthEvent, AuthUser, Session, SessionChange};
pub use provider::{IdentityProvider, SessionChangeReceiver};
pub use role::{ADMIN_ROLE, RoleRecord, RoleRepository, RoleSet};
