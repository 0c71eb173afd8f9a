use crate::database::DatabaseError;
use sqlx::Error as SqlxError;
use thiserror::Error;
use uuid::Uuid;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Referenced event, wager, group or member is absent
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Operation is not allowed in the current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Malformed request (picks, results, missing references)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Member cannot cover the requested risk
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// Store read/write failure
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// The event transition was persisted but the settlement pass failed
    #[error("Event {event_id} settled but settlement pass failed: {reason}")]
    PartialFailure { event_id: Uuid, reason: String },

    /// Database pool/migration errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Errors that a later settlement trigger or a client retry can recover from.
    /// Not found, invalid state and validation failures are terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::DependencyUnavailable(_) | AppError::PartialFailure { .. }
        )
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) => 404,
            AppError::Validation(_) | AppError::InsufficientBalance(_) => 400,
            AppError::InvalidState(_) => 409,
            AppError::DependencyUnavailable(_) => 503,
            AppError::PartialFailure { .. } => 207,
            AppError::Database(_) => 500,
        }
    }
}

/// Repository-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database query error
    #[error("Query error: {0}")]
    Query(SqlxError),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Duplicate record
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Stored data could not be decoded into a domain model
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
            RepositoryError::Duplicate(msg) => AppError::Validation(format!("Duplicate: {}", msg)),
            RepositoryError::ConstraintViolation(msg) => AppError::Validation(msg),
            RepositoryError::Query(e) => AppError::DependencyUnavailable(e.to_string()),
            RepositoryError::Corrupt(msg) => AppError::DependencyUnavailable(msg),
        }
    }
}

impl From<SqlxError> for RepositoryError {
    fn from(err: SqlxError) -> Self {
        match &err {
            SqlxError::RowNotFound => RepositoryError::NotFound("Record not found".to_string()),
            SqlxError::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                match code.as_deref() {
                    // unique_violation
                    Some("23505") => RepositoryError::Duplicate(db_err.message().to_string()),
                    // foreign_key_violation, check_violation
                    Some("23503") | Some("23514") => {
                        RepositoryError::ConstraintViolation(db_err.message().to_string())
                    }
                    _ => RepositoryError::Query(err),
                }
            }
            _ => RepositoryError::Query(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_mapping() {
        let err: AppError = RepositoryError::NotFound("wager".into()).into();
        assert!(err.is_not_found());

        let err: AppError = RepositoryError::Corrupt("bad status".into()).into();
        assert!(matches!(err, AppError::DependencyUnavailable(_)));
        assert!(err.is_retryable());

        let err: AppError = RepositoryError::ConstraintViolation("balance >= 0".into()).into();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), 404);
        assert_eq!(AppError::InvalidState("x".into()).status_code(), 409);
        assert_eq!(AppError::DependencyUnavailable("x".into()).status_code(), 503);
        let partial = AppError::PartialFailure {
            event_id: Uuid::nil(),
            reason: "store offline".into(),
        };
        assert_eq!(partial.status_code(), 207);
        assert!(partial.to_string().contains("store offline"));
    }

    #[test]
    fn test_sqlx_row_not_found_maps_to_not_found() {
        let err = RepositoryError::from(SqlxError::RowNotFound);
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }
}
