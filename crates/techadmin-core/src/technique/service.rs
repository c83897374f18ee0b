//! Catalogue service trait definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::model::Technique;
use super::payload::MutationRequest;
use crate::error::Result;

/// Number of records requested per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Parameters of one page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text search; empty matches everything
    pub text: String,
    /// Category code to restrict to
    pub category: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl SearchQuery {
    pub fn page(text: impl Into<String>, category: Option<String>, limit: usize, offset: usize) -> Self {
        Self {
            text: text.into(),
            category,
            limit,
            offset,
        }
    }
}

/// Remote catalogue: search plus the single admin mutation endpoint.
#[async_trait]
pub trait CatalogueService: Send + Sync {
    /// Returns at most `query.limit` records starting at `query.offset`.
    ///
    /// # Errors
    ///
    /// Transport or service failures; the message is shown to the user.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Technique>>;

    /// Submits an insert, update or remove.
    ///
    /// The remote side enforces its own permissions; a rejection comes back
    /// as an error carrying the service's message.
    async fn invoke_admin_mutation(&self, request: &MutationRequest) -> Result<()>;
}
