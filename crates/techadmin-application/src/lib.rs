//! Application layer for the techadmin console.
//!
//! Stateful services built on the core collaborator traits: the session
//! store, the role resolver, the access gate and the technique list/form
//! services. State is published through `tokio::sync::watch` channels.

pub mod access;
pub mod console;
pub mod role_resolver;
pub mod session_store;
pub mod technique;

#[cfg(test)]
mod testing;

pub use access::{AccessState, access_state};
pub use console::AdminConsole;
pub use role_resolver::{RoleResolver, RoleState};
pub use session_store::{AuthSnapshot, SessionStore};
pub use technique::{
    EditorMode, ListFooter, SearchPhase, SearchState, TechniqueEditor, TechniquePanel,
    TechniqueSearchController,
};
