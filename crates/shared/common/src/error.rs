//! Unified error handling for the data-access layer.
//!
//! Not-found is never an error here: lookups return `Option`. Driver errors
//! are carried unchanged as the source of the variant they map to.

use domain::DomainError;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Validation
    #[error("{0}")]
    Validation(String),

    // Store errors
    #[cfg(feature = "database")]
    #[error("Document store unavailable: {0}")]
    StoreUnavailable(#[source] sea_orm::DbErr),

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[source] sea_orm::DbErr),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get a stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            #[cfg(feature = "database")]
            AppError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            #[cfg(feature = "database")]
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// True for connection and transport failures
    pub fn is_unavailable(&self) -> bool {
        match self {
            #[cfg(feature = "database")]
            AppError::StoreUnavailable(_) => true,
            _ => false,
        }
    }
}

// =============================================================================
// Driver Error Conversion
// =============================================================================

#[cfg(feature = "database")]
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        if is_transport_failure(&err) {
            AppError::StoreUnavailable(err)
        } else {
            AppError::Database(err)
        }
    }
}

#[cfg(feature = "database")]
fn is_transport_failure(err: &sea_orm::DbErr) -> bool {
    use sea_orm::{sqlx, DbErr, RuntimeErr};

    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => true,
        DbErr::Query(RuntimeErr::SqlxError(e)) | DbErr::Exec(RuntimeErr::SqlxError(e)) => matches!(
            e,
            sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed
        ),
        _ => false,
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::Validation(msg),
            DomainError::Cast(_) => AppError::Validation(err.to_string()),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;
