//! Domain-level errors.
//!
//! These errors represent schema rule violations. They are independent of
//! infrastructure concerns (database, transport).

use thiserror::Error;

/// Domain-specific errors for schema rule violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed for one or more fields
    #[error("{0}")]
    Validation(String),

    /// A value could not be cast to the declared field type
    #[error("Cast to string failed for path `{0}`")]
    Cast(String),
}

impl DomainError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    /// Create a cast error for a path
    pub fn cast(path: impl Into<String>) -> Self {
        DomainError::Cast(path.into())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
