//! Error types for the repository and service layers
//!
//! Repositories report store failures and the single "object not found"
//! classification. Services translate those into the outcomes a caller acts
//! on: not found, conflict, invalid request, or a persistence failure.

use std::fmt;

use sensorapi_store::QueryError;
use thiserror::Error;

use crate::models::DeviceValidationError;

/// Repository-level failure
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A keyed lookup matched nothing
    #[error("object not found")]
    ObjectNotFound,

    /// A named query failed
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A lookup by name failed in the store
    #[error("failed getting device with name: {name:?}: {source}")]
    Lookup {
        name: String,
        #[source]
        source: QueryError,
    },
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound)
    }

    /// Underlying query failure, if any
    pub fn query_error(&self) -> Option<&QueryError> {
        match self {
            Self::ObjectNotFound => None,
            Self::Query(err) | Self::Lookup { source: err, .. } => Some(err),
        }
    }

    /// True when the store rejected a write on a unique constraint
    pub fn is_unique_violation(&self) -> bool {
        self.query_error()
            .is_some_and(QueryError::is_unique_violation)
    }

    /// True when the request context stopped the operation
    pub fn is_cancelled(&self) -> bool {
        self.query_error().is_some_and(QueryError::is_cancelled)
    }
}

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// How a resource was addressed, rendered into error messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKey {
    Id(i32),
    Name(String),
    Link { device_id: i32, sensor_id: i32 },
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id: {}", id),
            Self::Name(name) => write!(f, "name: {:?}", name),
            Self::Link {
                device_id,
                sensor_id,
            } => write!(f, "device id: {} and sensor id: {}", device_id, sensor_id),
        }
    }
}

impl From<i32> for ResourceKey {
    fn from(id: i32) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for ResourceKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ResourceKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Service-level error returned to callers
#[derive(Error, Debug)]
pub enum ServiceError {
    // ========== Resource Errors ==========
    /// Requested resource does not exist
    #[error("{resource} with {key} does not exist")]
    NotFound {
        resource: &'static str,
        key: ResourceKey,
    },

    /// Resource already exists
    #[error("{resource} with {key} already exists")]
    Conflict {
        resource: &'static str,
        key: ResourceKey,
    },

    // ========== Request Errors ==========
    /// Request fields failed validation
    #[error("validation error: {0}")]
    Validation(#[from] DeviceValidationError),

    /// Untyped request body did not match the request shape
    #[error("invalid request body: {0}")]
    Decode(#[from] serde_json::Error),

    // ========== Store Errors ==========
    /// Existence check by name failed for a reason other than absence
    #[error("could not resolve device name {name:?}: {source}")]
    NameResolution {
        name: String,
        #[source]
        source: RepositoryError,
    },

    /// Store operation failed
    #[error("persistence error: {0}")]
    Persistence(#[from] RepositoryError),
}

impl ServiceError {
    /// Create a not found error for a specific resource
    pub fn not_found(resource: &'static str, key: impl Into<ResourceKey>) -> Self {
        Self::NotFound {
            resource,
            key: key.into(),
        }
    }

    /// Create a conflict error for a specific resource
    pub fn conflict(resource: &'static str, key: impl Into<ResourceKey>) -> Self {
        Self::Conflict {
            resource,
            key: key.into(),
        }
    }

    /// Get the error code string for client-side handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::NameResolution { .. } => "NAME_RESOLUTION_ERROR",
            Self::Persistence(err) if err.is_cancelled() => "CANCELLED",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    /// True when the caller can fix the request and retry
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Conflict { .. } | Self::Validation(_) | Self::Decode(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Log the error with appropriate severity
    pub fn log(&self) {
        if self.is_client_error() {
            tracing::debug!(error = %self, code = self.error_code(), "Client error");
        } else if matches!(self, Self::Persistence(err) if err.is_cancelled()) {
            tracing::warn!(error = %self, code = self.error_code(), "Operation cancelled");
        } else {
            tracing::error!(error = %self, code = self.error_code(), "Service error occurred");
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
