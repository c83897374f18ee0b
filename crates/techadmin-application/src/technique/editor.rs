//! Create/edit form state for a single technique.

use techadmin_core::error::{AdminError, Result};
use techadmin_core::technique::{
    CatalogueService, MutationRequest, Technique, TechniqueDraft, build_insert, build_update,
};

const SAVE_FALLBACK: &str = "Failed to save technique";

/// Whether the form creates a new record or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit { id: String },
}

/// A working copy paired with the original it is diffed against.
///
/// The working copy is public so a front end can bind fields to it
/// directly. The original is fixed when the editor opens.
#[derive(Debug, Clone)]
pub struct TechniqueEditor {
    mode: EditorMode,
    original: TechniqueDraft,
    pub draft: TechniqueDraft,
    saving: bool,
    error: Option<String>,
}

impl TechniqueEditor {
    pub fn create() -> Self {
        Self {
            mode: EditorMode::Create,
            original: TechniqueDraft::empty(),
            draft: TechniqueDraft::empty(),
            saving: false,
            error: None,
        }
    }

    pub fn edit(technique: &Technique) -> Self {
        let original = TechniqueDraft::from(technique);
        Self {
            mode: EditorMode::Edit {
                id: technique.id.clone(),
            },
            draft: original.clone(),
            original,
            saving: false,
            error: None,
        }
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn original(&self) -> &TechniqueDraft {
        &self.original
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Message from the last failed submission.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Builds the request the current working copy would submit.
    pub fn build_request(&self) -> Result<MutationRequest> {
        match &self.mode {
            EditorMode::Create => Ok(MutationRequest::Insert(build_insert(&self.draft)?)),
            EditorMode::Edit { id } => Ok(MutationRequest::Update(build_update(
                id,
                &self.original,
                &self.draft,
            )?)),
        }
    }

    /// Submits the working copy.
    ///
    /// On failure the error message is kept on the editor and the working
    /// copy is left untouched for another attempt.
    pub async fn submit(&mut self, catalogue: &dyn CatalogueService) -> Result<()> {
        if self.saving {
            return Err(AdminError::validation("A save is already in progress"));
        }

        let request = match self.build_request() {
            Ok(request) => request,
            Err(err) => {
                self.error = Some(err.user_message(SAVE_FALLBACK));
                return Err(err);
            }
        };

        self.saving = true;
        self.error = None;
        let result = catalogue.invoke_admin_mutation(&request).await;
        self.saving = false;

        match result {
            Ok(()) => {
                tracing::info!("[TechniqueEditor] {} submitted", request.kind());
                Ok(())
            }
            Err(err) => {
                tracing::warn!("[TechniqueEditor] {} rejected: {}", request.kind(), err);
                self.error = Some(err.user_message(SAVE_FALLBACK));
                Err(err)
            }
        }
    }
}
