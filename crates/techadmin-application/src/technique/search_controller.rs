//! Incremental search-and-paginate controller for the technique list.
//!
//! Every first-page load opens a new query generation. Page results are
//! applied only if their generation is still current, so responses for an
//! abandoned query or a superseded refresh are dropped on arrival.

use std::collections::HashSet;
use std::sync::Arc;

use techadmin_core::error::Result;
use techadmin_core::technique::{CatalogueService, SearchQuery, Technique};
use tokio::sync::watch;

const LOAD_FALLBACK: &str = "Failed to load techniques";

/// Where the controller is in its fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    LoadingFirstPage,
    LoadingNextPage,
    Error,
    Exhausted,
}

/// What to render below the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFooter {
    /// First page pending with nothing to show yet
    Loading,
    /// First page failed and nothing is loaded
    Error(String),
    /// Loaded successfully, no matches
    Empty,
    /// More pages exist; becoming visible requests the next one
    Sentinel { loading_more: bool },
    /// Everything for this query is loaded
    NoMore,
}

/// Published list state.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub category: Option<String>,
    pub items: Vec<Technique>,
    /// Offset of the next page to request
    pub next_offset: usize,
    pub has_more: bool,
    pub phase: SearchPhase,
    pub error: Option<String>,
    pub(crate) generation: u64,
}

impl SearchState {
    fn initial() -> Self {
        Self {
            query: String::new(),
            category: None,
            items: Vec::new(),
            next_offset: 0,
            has_more: true,
            phase: SearchPhase::Idle,
            error: None,
            generation: 0,
        }
    }

    /// Whether the current query has a first page on screen or in flight.
    ///
    /// A failed first page does not count, so repeating the query retries.
    fn has_loaded(&self) -> bool {
        self.generation > 0 && !(self.phase == SearchPhase::Error && self.items.is_empty())
    }

    pub fn is_loading(&self) -> bool {
        self.phase == SearchPhase::LoadingFirstPage
    }

    pub fn is_loading_more(&self) -> bool {
        self.phase == SearchPhase::LoadingNextPage
    }

    /// Whether a near-end signal would start a next-page fetch.
    pub fn can_load_more(&self) -> bool {
        self.has_more && !self.is_loading() && !self.is_loading_more() && !self.items.is_empty()
    }

    pub fn footer(&self) -> ListFooter {
        if self.items.is_empty() {
            if self.is_loading() {
                return ListFooter::Loading;
            }
            if let Some(error) = &self.error {
                return ListFooter::Error(error.clone());
            }
            return ListFooter::Empty;
        }

        if self.has_more {
            ListFooter::Sentinel {
                loading_more: self.is_loading_more(),
            }
        } else {
            ListFooter::NoMore
        }
    }
}

/// Owns the accumulated result list for the current query.
pub struct TechniqueSearchController {
    catalogue: Arc<dyn CatalogueService>,
    page_size: usize,
    state: watch::Sender<SearchState>,
}

impl TechniqueSearchController {
    pub fn new(catalogue: Arc<dyn CatalogueService>, page_size: usize) -> Self {
        let (state, _) = watch::channel(SearchState::initial());
        Self {
            catalogue,
            page_size: page_size.max(1),
            state,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn snapshot(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    /// Loads the first page unless a load has already happened.
    pub async fn start(&self) -> Result<()> {
        if self.state.borrow().generation > 0 {
            return Ok(());
        }
        self.refresh().await
    }

    /// Changes the search text and restarts from the first page.
    ///
    /// Setting the text it already has is a no-op once something was loaded.
    pub async fn set_query(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        {
            let state = self.state.borrow();
            if state.has_loaded() && state.query == text {
                return Ok(());
            }
        }

        tracing::debug!("[SearchController] query changed to {:?}", text);
        self.load_first_page(true, move |state| state.query = text)
            .await
    }

    /// Changes the category filter and restarts from the first page.
    pub async fn set_category(&self, category: Option<String>) -> Result<()> {
        {
            let state = self.state.borrow();
            if state.has_loaded() && state.category == category {
                return Ok(());
            }
        }

        tracing::debug!("[SearchController] category filter changed to {:?}", category);
        self.load_first_page(true, move |state| state.category = category)
            .await
    }

    /// Reloads the first page of the current query.
    ///
    /// The current list stays visible until the new page replaces it.
    pub async fn refresh(&self) -> Result<()> {
        tracing::debug!("[SearchController] refresh");
        self.load_first_page(false, |_| {}).await
    }

    /// Near-end signal from the list sentinel.
    ///
    /// Starts a next-page fetch only if more pages exist, nothing is in
    /// flight and at least one item is loaded. Returns whether a fetch ran.
    pub async fn on_near_end(&self) -> Result<bool> {
        self.load_next_page().await
    }

    /// Shows an error from an action taken on the list (e.g. delete).
    pub fn report_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.send_modify(|state| state.error = Some(message));
    }

    async fn load_first_page<F>(&self, reset: bool, configure: F) -> Result<()>
    where
        F: FnOnce(&mut SearchState),
    {
        let mut generation = 0;
        let mut request = SearchQuery::page(String::new(), None, self.page_size, 0);

        self.state.send_modify(|state| {
            configure(state);
            if reset {
                state.items.clear();
                state.next_offset = 0;
                state.has_more = true;
            }
            state.generation += 1;
            state.phase = SearchPhase::LoadingFirstPage;
            state.error = None;

            generation = state.generation;
            request = SearchQuery::page(state.query.clone(), state.category.clone(), self.page_size, 0);
        });

        let result = self.catalogue.search(&request).await;
        let page_size = self.page_size;

        match result {
            Ok(page) => {
                let received = page.len();
                let applied = self.state.send_if_modified(|state| {
                    if state.generation != generation {
                        return false;
                    }
                    state.has_more = page.len() == page_size;
                    state.items = page;
                    state.next_offset = page_size;
                    state.phase = if state.has_more {
                        SearchPhase::Idle
                    } else {
                        SearchPhase::Exhausted
                    };
                    true
                });

                if applied {
                    tracing::debug!(
                        "[SearchController] first page: {} items for {:?}",
                        received,
                        request.text
                    );
                } else {
                    tracing::debug!("[SearchController] discarding stale first page");
                }
                Ok(())
            }
            Err(err) => {
                let message = err.user_message(LOAD_FALLBACK);
                let applied = self.state.send_if_modified(|state| {
                    if state.generation != generation {
                        return false;
                    }
                    state.items.clear();
                    state.has_more = false;
                    state.phase = SearchPhase::Error;
                    state.error = Some(message);
                    true
                });

                if applied {
                    tracing::warn!("[SearchController] first page failed: {}", err);
                    Err(err)
                } else {
                    tracing::debug!("[SearchController] discarding stale first page failure");
                    Ok(())
                }
            }
        }
    }

    async fn load_next_page(&self) -> Result<bool> {
        let mut started = None;

        self.state.send_if_modified(|state| {
            if !state.can_load_more() {
                return false;
            }
            state.phase = SearchPhase::LoadingNextPage;
            state.error = None;
            started = Some((
                state.generation,
                SearchQuery::page(
                    state.query.clone(),
                    state.category.clone(),
                    self.page_size,
                    state.next_offset,
                ),
            ));
            true
        });

        let Some((generation, request)) = started else {
            return Ok(false);
        };

        let result = self.catalogue.search(&request).await;
        let page_size = self.page_size;

        match result {
            Ok(page) => {
                let received = page.len();
                let applied = self.state.send_if_modified(|state| {
                    if state.generation != generation {
                        return false;
                    }
                    state.has_more = page.len() == page_size;

                    let mut seen: HashSet<String> =
                        state.items.iter().map(|item| item.id.clone()).collect();
                    for item in page {
                        if seen.insert(item.id.clone()) {
                            state.items.push(item);
                        } else {
                            tracing::debug!("[SearchController] skipping duplicate {}", item.id);
                        }
                    }

                    state.next_offset += page_size;
                    state.phase = if state.has_more {
                        SearchPhase::Idle
                    } else {
                        SearchPhase::Exhausted
                    };
                    true
                });

                if applied {
                    tracing::debug!(
                        "[SearchController] page at offset {}: {} items",
                        request.offset,
                        received
                    );
                } else {
                    tracing::debug!("[SearchController] discarding stale page");
                }
                Ok(true)
            }
            Err(err) => {
                let message = err.user_message(LOAD_FALLBACK);
                let applied = self.state.send_if_modified(|state| {
                    if state.generation != generation {
                        return false;
                    }
                    state.has_more = false;
                    state.phase = SearchPhase::Error;
                    state.error = Some(message);
                    true
                });

                if applied {
                    tracing::warn!(
                        "[SearchController] page at offset {} failed: {}",
                        request.offset,
                        err
                    );
                    Err(err)
                } else {
                    Ok(true)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCatalogue, techniques};

    fn controller(catalogue: &Arc<MockCatalogue>) -> TechniqueSearchController {
        TechniqueSearchController::new(catalogue.clone(), 20)
    }

    #[tokio::test]
    async fn test_full_page_then_short_page() {
        let catalogue = Arc::new(MockCatalogue::new());
        catalogue.push_page(techniques("a", 0..20));
        catalogue.push_page(techniques("a", 20..27));
        let controller = controller(&catalogue);

        controller.set_query("").await.unwrap();
        let state = controller.snapshot();
        assert!(state.has_more);
        assert_eq!(state.next_offset, 20);
        assert_eq!(state.phase, SearchPhase::Idle);

        assert!(controller.on_near_end().await.unwrap());
        let state = controller.snapshot();
        assert_eq!(state.items.len(), 27);
        assert!(!state.has_more);
        assert_eq!(state.phase, SearchPhase::Exhausted);
        assert_eq!(state.footer(), ListFooter::NoMore);

        assert!(!controller.on_near_end().await.unwrap());
        assert_eq!(catalogue.queries().len(), 2);
        assert_eq!(catalogue.queries()[1].offset, 20);
    }

    #[tokio::test]
    async fn test_full_page_then_empty_page_ends() {
        let catalogue = Arc::new(MockCatalogue::new());
        catalogue.push_page(techniques("a", 0..20));
        catalogue.push_page(Vec::new());
        let controller = controller(&catalogue);

        controller.refresh().await.unwrap();
        controller.on_near_end().await.unwrap();

        let state = controller.snapshot();
        assert_eq!(state.items.len(), 20);
        assert!(!state.has_more);
        assert_eq!(state.next_offset, 40);
    }

    #[tokio::test]
    async fn test_query_change_resets_before_fetch_resolves() {
        let catalogue = Arc::new(MockCatalogue::new());
        catalogue.push_page(techniques("a", 0..20));
        let controller = controller(&catalogue);
        controller.set_query("arm").await.unwrap();

        let gate = catalogue.push_gated();
        let observe = async {
            tokio::task::yield_now().await;
            let state = controller.snapshot();
            assert!(state.items.is_empty());
            assert_eq!(state.next_offset, 0);
            assert!(state.has_more);
            assert!(state.is_loading());
            assert_eq!(state.footer(), ListFooter::Loading);
            gate.send(Ok(techniques("k", 0..3))).unwrap();
        };
        let (result, _) = tokio::join!(controller.set_query("kimura"), observe);
        result.unwrap();

        let state = controller.snapshot();
        assert_eq!(state.query, "kimura");
        assert_eq!(state.items.len(), 3);
        assert_eq!(catalogue.queries()[1].text, "kimura");
        assert_eq!(catalogue.queries()[1].offset, 0);
    }

    #[tokio::test]
    async fn test_same_query_is_noop() {
        let catalogue = Arc::new(MockCatalogue::new());
        catalogue.push_page(techniques("a", 0..5));
        let controller = controller(&catalogue);

        controller.set_query("arm").await.unwrap();
        controller.set_query("arm").await.unwrap();

        assert_eq!(catalogue.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_same_query_after_failed_first_page_retries() {
        let catalogue = Arc::new(MockCatalogue::new());
        catalogue.push_error("service unavailable");
        catalogue.push_page(techniques("a", 0..5));
        let controller = controller(&catalogue);

        assert!(controller.set_query("arm").await.is_err());
        controller.set_query("arm").await.unwrap();

        let state = controller.snapshot();
        assert_eq!(catalogue.queries().len(), 2);
        assert_eq!(catalogue.queries()[1].offset, 0);
        assert_eq!(state.items.len(), 5);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_same_category_after_failed_first_page_retries() {
        let catalogue = Arc::new(MockCatalogue::new());
        catalogue.push_error("service unavailable");
        catalogue.push_page(techniques("a", 0..5));
        let controller = controller(&catalogue);
        let sweep = Some("sweep".to_string());

        assert!(controller.set_category(sweep.clone()).await.is_err());
        controller.set_category(sweep).await.unwrap();

        assert_eq!(catalogue.queries().len(), 2);
        assert_eq!(controller.snapshot().items.len(), 5);
    }

    #[tokio::test]
    async fn test_repeated_refresh_never_duplicates() {
        let catalogue = Arc::new(MockCatalogue::new());
        catalogue.push_page(techniques("a", 0..20));
        catalogue.push_page(techniques("a", 0..20));
        let controller = controller(&catalogue);

        controller.refresh().await.unwrap();
        controller.refresh().await.unwrap();

        let state = controller.snapshot();
        assert_eq!(state.items.len(), 20);
        assert_eq!(state.next_offset, 20);
    }

    #[tokio::test]
    async fn test_overlapping_refreshes_apply_only_latest() {
        let catalogue = Arc::new(MockCatalogue::new());
        let gate = catalogue.push_gated();
        catalogue.push_page(techniques("new", 0..4));
        let controller = controller(&catalogue);

        let second = async {
            controller.refresh().await.unwrap();
            gate.send(Ok(techniques("old", 0..20))).unwrap();
        };
        let (first, _) = tokio::join!(controller.refresh(), second);
        first.unwrap();

        let state = controller.snapshot();
        assert_eq!(state.items.len(), 4);
        assert!(state.items.iter().all(|item| item.id.starts_with("new")));
        assert!(!state.has_more);
    }

    #[tokio::test]
    async fn test_stale_next_page_dropped_after_query_change() {
        let catalogue = Arc::new(MockCatalogue::new());
        catalogue.push_page(techniques("a", 0..20));
        let controller = controller(&catalogue);
        controller.set_query("a").await.unwrap();

        let gate = catalogue.push_gated();
        catalogue.push_page(techniques("b", 0..2));
        let change = async {
            controller.set_query("b").await.unwrap();
            gate.send(Ok(techniques("a", 20..40))).unwrap();
        };
        let (fetched, _) = tokio::join!(controller.on_near_end(), change);
        assert!(fetched.unwrap());

        let state = controller.snapshot();
        assert_eq!(state.query, "b");
        assert_eq!(state.items.len(), 2);
        assert_eq!(state.next_offset, 20);
    }

    #[tokio::test]
    async fn test_next_page_blocked_while_loading() {
        let catalogue = Arc::new(MockCatalogue::new());
        catalogue.push_page(techniques("a", 0..20));
        let controller = controller(&catalogue);
        controller.refresh().await.unwrap();

        let gate = catalogue.push_gated();
        let second = async {
            assert!(controller.snapshot().is_loading_more());
            assert!(!controller.on_near_end().await.unwrap());
            gate.send(Ok(techniques("a", 20..40))).unwrap();
        };
        let (first, _) = tokio::join!(controller.on_near_end(), second);
        assert!(first.unwrap());

        assert_eq!(controller.snapshot().items.len(), 40);
        assert_eq!(catalogue.queries().len(), 2);
    }

    #[tokio::test]
    async fn test_near_end_ignored_on_empty_list() {
        let catalogue = Arc::new(MockCatalogue::new());
        let controller = controller(&catalogue);

        assert!(!controller.on_near_end().await.unwrap());
        assert!(catalogue.queries().is_empty());
    }

    #[tokio::test]
    async fn test_first_page_failure_empties_list() {
        let catalogue = Arc::new(MockCatalogue::new());
        catalogue.push_page(techniques("a", 0..20));
        catalogue.push_error("service unavailable");
        let controller = controller(&catalogue);
        controller.refresh().await.unwrap();

        assert!(controller.refresh().await.is_err());

        let state = controller.snapshot();
        assert!(state.items.is_empty());
        assert!(!state.has_more);
        assert_eq!(state.phase, SearchPhase::Error);
        assert_eq!(
            state.footer(),
            ListFooter::Error("service unavailable".to_string())
        );
    }

    #[tokio::test]
    async fn test_next_page_failure_keeps_list_and_stops() {
        let catalogue = Arc::new(MockCatalogue::new());
        catalogue.push_page(techniques("a", 0..20));
        catalogue.push_error("timeout");
        let controller = controller(&catalogue);
        controller.refresh().await.unwrap();

        assert!(controller.on_near_end().await.is_err());

        let state = controller.snapshot();
        assert_eq!(state.items.len(), 20);
        assert!(!state.has_more);
        assert_eq!(state.error.as_deref(), Some("timeout"));
        assert_eq!(state.next_offset, 20);

        assert!(!controller.on_near_end().await.unwrap());
        assert_eq!(catalogue.queries().len(), 2);
    }

    #[tokio::test]
    async fn test_short_page_mid_sequence_is_last() {
        let catalogue = Arc::new(MockCatalogue::new());
        catalogue.push_page(techniques("a", 0..20));
        catalogue.push_page(techniques("a", 20..35));
        let controller = controller(&catalogue);
        controller.refresh().await.unwrap();
        controller.on_near_end().await.unwrap();

        assert!(!controller.snapshot().has_more);
        assert!(!controller.on_near_end().await.unwrap());
    }

    #[tokio::test]
    async fn test_overlapping_page_skips_duplicates() {
        let catalogue = Arc::new(MockCatalogue::new());
        catalogue.push_page(techniques("a", 0..20));
        catalogue.push_page(techniques("a", 19..39));
        let controller = controller(&catalogue);
        controller.refresh().await.unwrap();
        controller.on_near_end().await.unwrap();

        let state = controller.snapshot();
        assert_eq!(state.items.len(), 39);
        assert!(state.has_more);
        assert_eq!(state.next_offset, 40);
    }

    #[tokio::test]
    async fn test_category_filter_passed_and_resets() {
        let catalogue = Arc::new(MockCatalogue::new());
        catalogue.push_page(techniques("a", 0..20));
        catalogue.push_page(techniques("s", 0..2));
        let controller = controller(&catalogue);
        controller.refresh().await.unwrap();

        controller
            .set_category(Some("sweep".to_string()))
            .await
            .unwrap();

        let queries = catalogue.queries();
        assert_eq!(queries[1].category.as_deref(), Some("sweep"));
        assert_eq!(controller.snapshot().items.len(), 2);
    }

    #[tokio::test]
    async fn test_start_loads_once() {
        let catalogue = Arc::new(MockCatalogue::new());
        catalogue.push_page(techniques("a", 0..3));
        let controller = controller(&catalogue);

        controller.start().await.unwrap();
        controller.start().await.unwrap();

        assert_eq!(catalogue.queries().len(), 1);
    }
}
