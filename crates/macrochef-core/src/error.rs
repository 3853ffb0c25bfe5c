//! Error types for MacroChef.

use thiserror::Error;

/// Main error type for MacroChef operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecipeError {
    /// A request field is missing or malformed.
    #[error("Invalid field '{field}': {message}")]
    Validation { field: String, message: String },

    /// No dietary profile is stored for the user.
    #[error("Profile not found for user {user_id}")]
    ProfileNotFound { user_id: String },

    /// The profile or result store could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The generation service answered with a non-success status.
    #[error("Upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Operation timed out.
    #[error("Operation timed out after {duration_ms}ms: {message}")]
    Timeout { duration_ms: u64, message: String },

    /// The generated text carried no structured payload.
    #[error("Malformed payload: no structural delimiters found")]
    MalformedPayload { raw: String },

    /// The job queue is saturated.
    #[error("Job queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// Resource not found.
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecipeError {
    /// Shorthand for a field-level validation failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        RecipeError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable snake_case code, persisted in failed job markers.
    pub fn kind(&self) -> &'static str {
        match self {
            RecipeError::Validation { .. } => "validation_error",
            RecipeError::ProfileNotFound { .. } => "profile_not_found",
            RecipeError::StoreUnavailable(_) => "store_unavailable",
            RecipeError::Upstream { .. } => "upstream_error",
            RecipeError::Timeout { .. } => "timeout",
            RecipeError::MalformedPayload { .. } => "malformed_payload",
            RecipeError::QueueFull { .. } => "queue_full",
            RecipeError::NotFound { .. } => "not_found",
            RecipeError::Serialization(_) => "serialization_error",
            RecipeError::Connection(_) => "connection_error",
            RecipeError::Internal(_) => "internal",
        }
    }

    /// Returns true if retrying the same request later could succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RecipeError::Upstream { status, .. } => *status == 429 || *status >= 500,
            RecipeError::Timeout { .. } => true,
            RecipeError::StoreUnavailable(_) => true,
            RecipeError::Connection(_) => true,
            RecipeError::QueueFull { .. } => true,
            _ => false,
        }
    }
}

/// Convenience Result type for MacroChef operations.
pub type Result<T> = std::result::Result<T, RecipeError>;

impl From<serde_json::Error> for RecipeError {
    fn from(err: serde_json::Error) -> Self {
        RecipeError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        assert_eq!(RecipeError::validation("calories", "bad").kind(), "validation_error");
        assert_eq!(
            RecipeError::MalformedPayload { raw: String::new() }.kind(),
            "malformed_payload"
        );
    }

    #[test]
    fn test_recoverable() {
        let rate_limited = RecipeError::Upstream {
            status: 429,
            message: "slow down".to_string(),
        };
        let bad_request = RecipeError::Upstream {
            status: 400,
            message: "nope".to_string(),
        };
        assert!(rate_limited.is_recoverable());
        assert!(!bad_request.is_recoverable());
        assert!(!RecipeError::ProfileNotFound { user_id: "u1".into() }.is_recoverable());
    }

    #[test]
    fn test_validation_message_names_field() {
        let err = RecipeError::validation("protein", "expected a non-negative integer");
        assert_eq!(
            err.to_string(),
            "Invalid field 'protein': expected a non-negative integer"
        );
    }
}
