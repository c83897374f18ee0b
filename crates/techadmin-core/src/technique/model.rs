//! Technique domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A catalogued technique as returned by the data service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Technique {
    /// Server-assigned identifier, never changes
    pub id: String,

    pub name: String,

    /// Alternative names, in display order
    #[serde(default, deserialize_with = "null_as_default")]
    pub aliases: Vec<String>,

    /// Category code (e.g. `guardPass`)
    #[serde(default)]
    pub category: Option<String>,

    /// Human-readable category label (e.g. `Passes`)
    #[serde(default)]
    pub category_name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub history: Option<String>,

    #[serde(default)]
    pub modern_usage: Option<String>,

    /// Server-assigned creation time, read-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One entry of the fixed category catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryOption {
    pub code: &'static str,
    pub label: &'static str,
}

/// Categories the editor offers, in display order.
pub const CATEGORY_OPTIONS: &[CategoryOption] = &[
    CategoryOption { code: "guard", label: "Guards" },
    CategoryOption { code: "position", label: "Positions" },
    CategoryOption { code: "guardPass", label: "Passes" },
    CategoryOption { code: "guardRetention", label: "Guard Retention" },
    CategoryOption { code: "sweep", label: "Sweeps" },
    CategoryOption { code: "takedown", label: "Takedowns" },
    CategoryOption { code: "submission", label: "Submissions" },
    CategoryOption { code: "transition", label: "Transitions" },
    CategoryOption { code: "guardPull", label: "Guard Pull" },
    CategoryOption { code: "escape", label: "Escapes" },
];

/// Looks up the display label for a category code.
pub fn category_label(code: &str) -> Option<&'static str> {
    CATEGORY_OPTIONS
        .iter()
        .find(|option| option.code == code)
        .map(|option| option.label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_technique_with_null_aliases() {
        let json = r#"{
            "id": "t-1",
            "name": "Armbar",
            "aliases": null,
            "category": "submission",
            "category_name": "Submissions",
            "description": null,
            "created_at": "2024-03-01T10:00:00Z"
        }"#;

        let technique: Technique = serde_json::from_str(json).unwrap();
        assert_eq!(technique.name, "Armbar");
        assert!(technique.aliases.is_empty());
        assert_eq!(technique.category.as_deref(), Some("submission"));
        assert_eq!(technique.history, None);
        assert!(technique.created_at.is_some());
    }

    #[test]
    fn test_deserialize_technique_minimal() {
        let technique: Technique =
            serde_json::from_str(r#"{"id": "t-2", "name": "Kimura"}"#).unwrap();
        assert!(technique.aliases.is_empty());
        assert_eq!(technique.created_at, None);
    }

    #[test]
    fn test_category_label() {
        assert_eq!(category_label("guardPass"), Some("Passes"));
        assert_eq!(category_label("unknown"), None);
    }
}
