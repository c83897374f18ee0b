//! Technique list and form services.

mod editor;
mod panel;
mod search_controller;

pub use editor::{EditorMode, TechniqueEditor};
pub use panel::TechniquePanel;
pub use search_controller::{ListFooter, SearchPhase, SearchState, TechniqueSearchController};
