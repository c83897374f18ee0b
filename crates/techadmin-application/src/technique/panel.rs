//! The technique management panel reachable by admins.

use std::sync::Arc;

use techadmin_core::error::{AdminError, Result};
use techadmin_core::technique::{CatalogueService, MutationRequest, build_remove};

use super::editor::TechniqueEditor;
use super::search_controller::TechniqueSearchController;

const DELETE_FALLBACK: &str = "Failed to delete technique";

/// List plus create/edit/delete actions over one catalogue.
///
/// Every successful mutation reloads the list from its first page.
pub struct TechniquePanel {
    catalogue: Arc<dyn CatalogueService>,
    search: TechniqueSearchController,
}

impl TechniquePanel {
    pub fn new(catalogue: Arc<dyn CatalogueService>, page_size: usize) -> Self {
        Self {
            search: TechniqueSearchController::new(Arc::clone(&catalogue), page_size),
            catalogue,
        }
    }

    pub fn search(&self) -> &TechniqueSearchController {
        &self.search
    }

    pub fn open_create(&self) -> TechniqueEditor {
        TechniqueEditor::create()
    }

    /// Opens an editor on a copy of a loaded technique.
    pub fn open_edit(&self, id: &str) -> Result<TechniqueEditor> {
        let state = self.search.snapshot();
        state
            .items
            .iter()
            .find(|technique| technique.id == id)
            .map(TechniqueEditor::edit)
            .ok_or_else(|| AdminError::not_found("Technique", id))
    }

    /// Submits the editor and reloads the list on success.
    pub async fn save(&self, editor: &mut TechniqueEditor) -> Result<()> {
        editor.submit(self.catalogue.as_ref()).await?;
        self.reload().await;
        Ok(())
    }

    /// Removes a technique and reloads the list on success.
    ///
    /// A failure is reported on the list and returned.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let request = MutationRequest::Remove(build_remove(id));
        if let Err(err) = self.catalogue.invoke_admin_mutation(&request).await {
            tracing::warn!("[TechniquePanel] failed to delete {}: {}", id, err);
            self.search.report_error(err.user_message(DELETE_FALLBACK));
            return Err(err);
        }

        tracing::info!("[TechniquePanel] deleted {}", id);
        self.reload().await;
        Ok(())
    }

    async fn reload(&self) {
        // Load failures are already published on the list state.
        if let Err(err) = self.search.refresh().await {
            tracing::debug!("[TechniquePanel] reload after mutation failed: {}", err);
        }
    }
}
