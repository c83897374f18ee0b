//! Mutation payload builders.
//!
//! All functions here are pure: they read a draft and return a payload.
//! Keeping or discarding the draft after submission is the caller's call.

use super::diff::change_set;
use super::draft::{TechniqueDraft, draft_fields};
use super::payload::{InsertPayload, RemovePayload, UpdatePayload};
use crate::error::{AdminError, Result};

/// Drops blank and whitespace-only aliases, keeping order.
pub fn normalize_aliases(aliases: &[String]) -> Vec<String> {
    aliases
        .iter()
        .filter(|alias| !alias.trim().is_empty())
        .cloned()
        .collect()
}

/// Maps a blank form value to an explicit absence.
pub fn blank_to_none(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AdminError::validation("Name is required"));
    }
    Ok(())
}

/// Builds the full payload for a new technique.
///
/// # Errors
///
/// Returns `AdminError::Validation` when the name is blank.
pub fn build_insert(draft: &TechniqueDraft) -> Result<InsertPayload> {
    require_name(&draft.name)?;

    Ok(InsertPayload {
        name: draft.name.clone(),
        aliases: normalize_aliases(&draft.aliases),
        category: blank_to_none(&draft.category),
        category_name: blank_to_none(&draft.category_name),
        description: blank_to_none(&draft.description),
        history: blank_to_none(&draft.history),
        modern_usage: blank_to_none(&draft.modern_usage),
    })
}

/// Builds a payload holding `id` plus every field that differs from
/// `original`.
///
/// # Errors
///
/// Returns `AdminError::Validation` when the name was changed to blank.
pub fn build_update(
    id: &str,
    original: &TechniqueDraft,
    working: &TechniqueDraft,
) -> Result<UpdatePayload> {
    let changes = change_set(original, working, &draft_fields());
    let mut payload = UpdatePayload::for_id(id);

    if changes.contains("name") {
        require_name(&working.name)?;
        payload.name = Some(working.name.clone());
    }
    if changes.contains("aliases") {
        payload.aliases = Some(normalize_aliases(&working.aliases));
    }
    if changes.contains("category") {
        payload.category = Some(blank_to_none(&working.category));
    }
    if changes.contains("category_name") {
        payload.category_name = Some(blank_to_none(&working.category_name));
    }
    if changes.contains("description") {
        payload.description = Some(blank_to_none(&working.description));
    }
    if changes.contains("history") {
        payload.history = Some(blank_to_none(&working.history));
    }
    if changes.contains("modern_usage") {
        payload.modern_usage = Some(blank_to_none(&working.modern_usage));
    }

    Ok(payload)
}

/// Builds the identifier-only payload for a removal.
pub fn build_remove(id: &str) -> RemovePayload {
    RemovePayload { id: id.to_string() }
}
