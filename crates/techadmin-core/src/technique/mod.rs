//! Technique catalogue domain module.
//!
//! # Module Structure
//!
//! - `model`: The technique record and the category catalogue
//! - `draft`: Editable working copy of a technique
//! - `diff`: Generic change-set computation over two records
//! - `payload`: Mutation request payloads
//! - `builder`: Builds create/update/remove payloads from drafts
//! - `service`: Catalogue service trait (search + admin mutation)

mod builder;
pub mod diff;
mod draft;
mod model;
mod payload;
mod service;

// Re-export public API
pub use builder::{blank_to_none, build_insert, build_remove, build_update, normalize_aliases};
pub use diff::{ChangeSet, Field, change_set};
pub use draft::{TechniqueDraft, draft_fields};
pub use model::{CATEGORY_OPTIONS, CategoryOption, Technique, category_label};
pub use payload::{InsertPayload, MutationKind, MutationRequest, RemovePayload, UpdatePayload};
pub use service::{CatalogueService, DEFAULT_PAGE_SIZE, SearchQuery};
