//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Every domain error in the workspace converts into one of these variants,
/// which is what callers (and the HTTP layer) see.
#[derive(Debug, Error)]
pub enum AppError {
    /// Caller has no identity, or is not the assigned actor.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but lacks the role or ownership.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Entity id does not resolve.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Action is not valid from the entity's current state.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// A concurrent mutation won the race. Safe to retry after re-reading.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An external collaborator is unavailable.
    #[error("Dependency failure: {0}")]
    DependencyFailure(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::InvalidTransition(_) | Self::Conflict(_) => 409,
            Self::DependencyFailure(_) => 502,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::Conflict(_) => "CONFLICT",
            Self::DependencyFailure(_) => "DEPENDENCY_FAILURE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller may retry after re-fetching current state.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
