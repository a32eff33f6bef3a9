//! Authentication error types.

use serde::Serialize;
use std::{collections::BTreeMap, fmt};
use thiserror::Error;

/// Per-field validation failures.
///
/// Serializes as `{"<field>": ["<message>", ...]}`, which is also the shape
/// the HTTP layer returns for rejected payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationError {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    /// Key used for errors that do not belong to a single field.
    pub const NON_FIELD_ERRORS: &'static str = "non_field_errors";

    pub fn new() -> Self {
        Self::default()
    }

    /// Build an error carrying a single message for `field`.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut error = Self::new();
        error.add(field, message);
        error
    }

    /// Append a message to `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Messages recorded for `field`, if any.
    pub fn messages(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    /// Names of all fields that failed, in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed")?;
        for (field, messages) in &self.errors {
            write!(f, "; {}: {}", field, messages.join(" "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Input payload rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Unknown user, wrong password or inactive account
    #[error("No active account found with the given credentials")]
    InvalidCredentials,

    /// Token failed signature, expiry or type checks
    #[error("Token is invalid or expired")]
    InvalidToken,

    /// JWT encoding error
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Email already exists
    #[error("Email already exists")]
    EmailTaken,
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database, hashing and JWT errors are sanitized to prevent information
    /// disclosure about the internal system structure.
    pub fn client_message(&self) -> String {
        if self.is_internal() {
            "A server error occurred.".to_string()
        } else {
            self.to_string()
        }
    }

    /// Whether the error is caused by the server rather than the caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::Database(_) | AuthError::HashingFailed | AuthError::JwtError(_)
        )
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_collects_messages_per_field() {
        let mut error = ValidationError::new();
        error.add("email", "This field is required.");
        error.add("password", "This field may not be blank.");
        error.add("email", "Enter a valid email address.");

        assert_eq!(
            error.messages("email").unwrap(),
            ["This field is required.", "Enter a valid email address."]
        );
        assert_eq!(error.fields().collect::<Vec<_>>(), ["email", "password"]);
    }

    #[test]
    fn test_validation_error_serializes_as_field_map() {
        let error = ValidationError::field("email", "This field must be unique.");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "email": ["This field must be unique."] })
        );
    }

    #[test]
    fn test_client_message_hides_internals() {
        let err = AuthError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.client_message(), "A server error occurred.");
        assert!(err.is_internal());

        let err = AuthError::InvalidCredentials;
        assert_eq!(
            err.client_message(),
            "No active account found with the given credentials"
        );
        assert!(!err.is_internal());
    }
}
