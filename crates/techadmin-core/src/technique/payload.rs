//! Mutation request payloads sent to the admin endpoint.

use serde::Serialize;

/// Kind of admin mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Insert,
    Update,
    Remove,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// Full payload for creating a technique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertPayload {
    pub name: String,
    pub aliases: Vec<String>,
    pub category: Option<String>,
    pub category_name: Option<String>,
    pub description: Option<String>,
    pub history: Option<String>,
    pub modern_usage: Option<String>,
}

/// Partial payload for updating a technique.
///
/// Outer `None` means "unchanged, not sent". For optional text fields
/// `Some(None)` is sent as an explicit `null`, clearing the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdatePayload {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modern_usage: Option<Option<String>>,
}

impl UpdatePayload {
    /// A payload that carries only the identifier.
    pub fn for_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Whether anything besides the identifier would be sent.
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.aliases.is_some()
            || self.category.is_some()
            || self.category_name.is_some()
            || self.description.is_some()
            || self.history.is_some()
            || self.modern_usage.is_some()
    }
}

/// Payload for removing a technique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovePayload {
    pub id: String,
}

/// A complete admin mutation request, serialized as `{"type", "payload"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum MutationRequest {
    Insert(InsertPayload),
    Update(UpdatePayload),
    Remove(RemovePayload),
}

impl MutationRequest {
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Insert(_) => MutationKind::Insert,
            Self::Update(_) => MutationKind::Update,
            Self::Remove(_) => MutationKind::Remove,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_payload_serializes_only_present_fields() {
        let payload = UpdatePayload {
            description: Some(None),
            history: Some(Some("Since 1920".to_string())),
            ..UpdatePayload::for_id("t-1")
        };

        let value = serde_json::to_value(MutationRequest::Update(payload)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "update",
                "payload": {"id": "t-1", "description": null, "history": "Since 1920"}
            })
        );
    }

    #[test]
    fn test_remove_request_shape() {
        let request = MutationRequest::Remove(RemovePayload {
            id: "t-9".to_string(),
        });
        assert_eq!(request.kind(), MutationKind::Remove);
        assert_eq!(
            serde_json::to_value(request).unwrap(),
            json!({"type": "remove", "payload": {"id": "t-9"}})
        );
    }
}
