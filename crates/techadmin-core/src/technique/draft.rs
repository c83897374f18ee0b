//! Editable working copy of a technique.

use serde::{Deserialize, Serialize};

use super::builder::normalize_aliases;
use super::diff::Field;
use super::model::{Technique, category_label};

/// Form-shaped copy of a technique's editable fields.
///
/// Absent optional values are represented as empty strings, the way a form
/// holds them. A draft is always an owned copy: editing it never touches
/// the technique it was opened from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TechniqueDraft {
    pub name: String,
    pub aliases: Vec<String>,
    pub category: String,
    pub category_name: String,
    pub description: String,
    pub history: String,
    pub modern_usage: String,
}

impl TechniqueDraft {
    /// An empty draft for the create form.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends a blank alias slot.
    pub fn add_alias(&mut self) {
        self.aliases.push(String::new());
    }

    /// Replaces the alias at `index`. Out-of-range indices are ignored.
    pub fn set_alias(&mut self, index: usize, value: impl Into<String>) {
        if let Some(alias) = self.aliases.get_mut(index) {
            *alias = value.into();
        }
    }

    /// Removes the alias at `index`. Out-of-range indices are ignored.
    pub fn remove_alias(&mut self, index: usize) {
        if index < self.aliases.len() {
            self.aliases.remove(index);
        }
    }

    /// Selects a category code and sets the matching display label.
    ///
    /// A code outside the catalogue clears the label.
    pub fn set_category(&mut self, code: impl Into<String>) {
        let code = code.into();
        self.category_name = category_label(&code).unwrap_or_default().to_string();
        self.category = code;
    }
}

impl From<&Technique> for TechniqueDraft {
    fn from(technique: &Technique) -> Self {
        Self {
            name: technique.name.clone(),
            aliases: technique.aliases.clone(),
            category: technique.category.clone().unwrap_or_default(),
            category_name: technique.category_name.clone().unwrap_or_default(),
            description: technique.description.clone().unwrap_or_default(),
            history: technique.history.clone().unwrap_or_default(),
            modern_usage: technique.modern_usage.clone().unwrap_or_default(),
        }
    }
}

fn name(draft: &TechniqueDraft) -> &str {
    &draft.name
}

fn aliases(draft: &TechniqueDraft) -> Vec<String> {
    normalize_aliases(&draft.aliases)
}

fn category(draft: &TechniqueDraft) -> &str {
    &draft.category
}

fn category_name(draft: &TechniqueDraft) -> &str {
    &draft.category_name
}

fn description(draft: &TechniqueDraft) -> &str {
    &draft.description
}

fn history(draft: &TechniqueDraft) -> &str {
    &draft.history
}

fn modern_usage(draft: &TechniqueDraft) -> &str {
    &draft.modern_usage
}

/// The diffable fields of a draft, in payload order.
///
/// Aliases are compared after dropping blank entries on both sides, in
/// order, so a reordered alias list counts as changed.
pub fn draft_fields() -> Vec<Field<TechniqueDraft>> {
    vec![
        Field::scalar("name", name),
        Field::sequence("aliases", aliases),
        Field::scalar("category", category),
        Field::scalar("category_name", category_name),
        Field::scalar("description", description),
        Field::scalar("history", history),
        Field::scalar("modern_usage", modern_usage),
    ]
}
