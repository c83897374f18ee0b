//! Error types for the techadmin console.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire console.
///
/// Every collaborator failure is funnelled into one of these variants so the
/// front end can render a message without knowing which layer failed.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AdminError {
    /// Bad credentials or a rejected sign-in attempt
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Network-level failure talking to a remote collaborator
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The remote service answered but reported a failure
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// Input rejected before it was sent anywhere
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdminError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an Authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a Service error
    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self::Service {
            status,
            message: message.into(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an authentication failure
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// Check if this is a transport failure
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Check if this is a validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the message a user should see for this error.
    ///
    /// Collaborator-reported messages are passed through as-is. Errors that
    /// carry no usable message fall back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        let message = match self {
            Self::Authentication(message)
            | Self::Validation(message)
            | Self::Config(message) => message.as_str(),
            Self::Transport { message } | Self::Service { message, .. } => message.as_str(),
            Self::NotFound { .. } | Self::Io { .. } | Self::Serialization { .. } => "",
            Self::Internal(message) => message.as_str(),
        };

        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message.to_string()
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for AdminError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for AdminError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for AdminError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (used by collaborators built on anyhow)
impl From<anyhow::Error> for AdminError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Conversion from String (for error messages)
impl From<String> for AdminError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, AdminError>`.
pub type Result<T> = std::result::Result<T, AdminError>;
