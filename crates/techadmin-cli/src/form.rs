//! Line-by-line technique form.

use rustyline::error::ReadlineError;
use techadmin_core::technique::{TechniqueDraft, change_set, draft_fields};

use crate::LineEditor;

/// One answer per form field, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Answers {
    name: String,
    aliases: String,
    category: String,
    description: String,
    history: String,
    modern_usage: String,
}

impl Answers {
    /// The answers an untouched form would give for `draft`.
    fn prefilled(draft: &TechniqueDraft) -> Self {
        Self {
            name: draft.name.clone(),
            aliases: draft.aliases.join(", "),
            category: draft.category.clone(),
            description: draft.description.clone(),
            history: draft.history.clone(),
            modern_usage: draft.modern_usage.clone(),
        }
    }
}

/// Walks the user through every editable field, pre-filled with the draft.
///
/// Returns `Ok(false)` if the user aborted with Ctrl-C. The draft is only
/// touched once every field has been answered.
pub fn fill(rl: &mut LineEditor, draft: &mut TechniqueDraft) -> rustyline::Result<bool> {
    let mut answers = Answers::prefilled(draft);

    for (label, value) in [
        ("name", &mut answers.name),
        ("aliases (comma separated)", &mut answers.aliases),
        ("category code ('categories' lists them)", &mut answers.category),
        ("description", &mut answers.description),
        ("history", &mut answers.history),
        ("modern usage", &mut answers.modern_usage),
    ] {
        let Some(answer) = ask(rl, label, value.as_str())? else {
            return Ok(false);
        };
        *value = answer;
    }

    apply(draft, &answers);
    Ok(true)
}

/// Copies the answers into the draft.
///
/// The category label is only recomputed when the code itself changed, so
/// a stored label survives an edit that leaves the category alone.
fn apply(draft: &mut TechniqueDraft, answers: &Answers) {
    draft.name = answers.name.clone();
    set_aliases(draft, &answers.aliases);

    let category = answers.category.trim();
    if category != draft.category {
        draft.set_category(category);
    }

    draft.description = answers.description.clone();
    draft.history = answers.history.clone();
    draft.modern_usage = answers.modern_usage.clone();
}

fn ask(rl: &mut LineEditor, label: &str, initial: &str) -> rustyline::Result<Option<String>> {
    match rl.readline_with_initial(&format!("  {}: ", label), (initial, "")) {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Interrupted) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Rewrites the alias slots from a comma separated answer.
///
/// Slots are edited in place so unchanged positions keep their order.
fn set_aliases(draft: &mut TechniqueDraft, answer: &str) {
    let values: Vec<&str> = answer
        .split(',')
        .map(str::trim)
        .filter(|alias| !alias.is_empty())
        .collect();

    while draft.aliases.len() > values.len() {
        draft.remove_alias(draft.aliases.len() - 1);
    }
    for (index, value) in values.into_iter().enumerate() {
        if index >= draft.aliases.len() {
            draft.add_alias();
        }
        draft.set_alias(index, value);
    }
}

/// Names of the fields the draft changes relative to the original.
pub fn changed_fields(original: &TechniqueDraft, draft: &TechniqueDraft) -> Vec<&'static str> {
    change_set(original, draft, &draft_fields()).iter().collect()
}
