//! Query execution errors
//!
//! The executor never decides what an empty result means; it only reports
//! what went wrong while running a statement and which statement it was.

use thiserror::Error;

use crate::query::{NamedQuery, QueryKind};

/// What went wrong while running a named query
#[derive(Error, Debug)]
pub enum QueryErrorKind {
    /// Driver-level failure (connectivity, constraint, syntax)
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failure reported by a store that is not backed by sqlx
    #[error("store error: {0}")]
    Backend(String),

    /// Constraint violation reported by a store that is not backed by sqlx
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// A row could not be materialized into the requested destination
    #[error("failed to materialize result: {0}")]
    Decode(#[from] serde_json::Error),

    /// Caller bound the wrong number of positional parameters
    #[error("expected {expected} parameters, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// A write statement was sent through a select helper, or the reverse
    #[error("expected a {expected:?} statement, got {actual:?}")]
    KindMismatch { expected: QueryKind, actual: QueryKind },

    /// The request context was cancelled before the store answered
    #[error("operation cancelled")]
    Cancelled,

    /// The request context deadline passed before the store answered
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Query failure tagged with the operation that produced it
#[derive(Error, Debug)]
#[error("query {operation} failed: {kind}")]
pub struct QueryError {
    pub operation: NamedQuery,
    #[source]
    pub kind: QueryErrorKind,
}

impl QueryError {
    pub fn new(operation: NamedQuery, kind: QueryErrorKind) -> Self {
        Self { operation, kind }
    }

    /// True when the store rejected the statement on a unique constraint
    pub fn is_unique_violation(&self) -> bool {
        match &self.kind {
            QueryErrorKind::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            QueryErrorKind::Constraint(_) => true,
            _ => false,
        }
    }

    /// True when the caller's context stopped the operation
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self.kind,
            QueryErrorKind::Cancelled | QueryErrorKind::DeadlineExceeded
        )
    }
}

/// Result type alias for executor operations
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_operation() {
        let err = QueryError::new(
            NamedQuery::GetDeviceById,
            QueryErrorKind::Backend("connection reset".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "query GetDeviceByID failed: store error: connection reset"
        );
    }

    #[test]
    fn test_unique_violation_detection() {
        let constraint = QueryError::new(
            NamedQuery::InsertDevice,
            QueryErrorKind::Constraint("device_name_key".to_string()),
        );
        assert!(constraint.is_unique_violation());

        let backend = QueryError::new(
            NamedQuery::InsertDevice,
            QueryErrorKind::Backend("timeout".to_string()),
        );
        assert!(!backend.is_unique_violation());
    }

    #[test]
    fn test_cancellation_kinds() {
        assert!(QueryError::new(NamedQuery::GetAllDevices, QueryErrorKind::Cancelled).is_cancelled());
        assert!(
            QueryError::new(NamedQuery::GetAllDevices, QueryErrorKind::DeadlineExceeded)
                .is_cancelled()
        );
        assert!(!QueryError::new(
            NamedQuery::GetAllDevices,
            QueryErrorKind::Database(sqlx::Error::RowNotFound)
        )
        .is_cancelled());
    }
}
