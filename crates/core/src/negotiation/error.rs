//! Negotiation errors.

use thiserror::Error;

use procura_shared::AppError;

use super::types::NegotiationStatus;

/// Negotiation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NegotiationError {
    /// Negotiation is already accepted or rejected.
    #[error("negotiation is {0}; expected OPEN or COUNTERED")]
    Closed(NegotiationStatus),

    /// Prices must be positive.
    #[error("price must be positive")]
    NonPositivePrice,
}

impl From<NegotiationError> for AppError {
    fn from(err: NegotiationError) -> Self {
        match err {
            NegotiationError::Closed(_) => AppError::InvalidTransition(err.to_string()),
            NegotiationError::NonPositivePrice => AppError::Validation(err.to_string()),
        }
    }
}
