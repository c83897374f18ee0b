//! Catalogue search RPC and the admin mutation function.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use techadmin_core::error::Result;
use techadmin_core::technique::{CatalogueService, MutationRequest, SearchQuery, Technique};

use super::client::{RestBackend, send_empty, send_json};

/// Arguments of the search procedure.
#[derive(Debug, Serialize, PartialEq)]
struct SearchParams<'a> {
    p_search: &'a str,
    p_category: Option<&'a str>,
    p_limit: usize,
    p_offset: usize,
}

impl<'a> From<&'a SearchQuery> for SearchParams<'a> {
    fn from(query: &'a SearchQuery) -> Self {
        Self {
            p_search: &query.text,
            p_category: query.category.as_deref(),
            p_limit: query.limit,
            p_offset: query.offset,
        }
    }
}

#[async_trait]
impl CatalogueService for RestBackend {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Technique>> {
        let bearer = self.bearer().await?;
        let path = format!("rest/v1/rpc/{}", self.settings.catalogue.search_function);
        let request = self
            .request(Method::POST, &path, bearer.as_deref())
            .json(&SearchParams::from(query));

        let page: Option<Vec<Technique>> = send_json(request).await?;
        Ok(page.unwrap_or_default())
    }

    async fn invoke_admin_mutation(&self, request: &MutationRequest) -> Result<()> {
        let bearer = self.bearer().await?;
        let path = format!("functions/v1/{}", self.settings.catalogue.admin_function);
        let http = self
            .request(Method::POST, &path, bearer.as_deref())
            .json(request);

        send_empty(http).await?;
        tracing::info!("[RestBackend] {} accepted", request.kind());
        Ok(())
    }
}
