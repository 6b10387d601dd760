//! Request lifecycle errors.

use thiserror::Error;
use uuid::Uuid;

use procura_shared::AppError;

use super::types::RequestStatus;

/// Errors raised while validating lifecycle changes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// Action is not valid from the current status.
    #[error("cannot {action} from {actual}; expected {}", expected_list(.expected))]
    InvalidTransition {
        /// Attempted action.
        action: &'static str,
        /// Statuses the action is valid from.
        expected: Vec<RequestStatus>,
        /// Status the request is in.
        actual: RequestStatus,
    },

    /// A contract exists, so negotiation cannot restart.
    #[error("request already has a contract")]
    ContractAlreadyExists,

    /// generate-po without a contract.
    #[error("request has no contract")]
    MissingContract,

    /// generate-contract without a negotiation.
    #[error("request has no negotiation")]
    MissingNegotiation,

    /// The active negotiation was rejected.
    #[error("negotiation was rejected")]
    NegotiationRejected,

    /// Nothing to negotiate.
    #[error("request has no quotes")]
    NoQuotes,

    /// Caller named a quote that does not belong to the request.
    #[error("quote {0} not found on this request")]
    QuoteNotFound(Uuid),

    /// Directive string not recognised.
    #[error("unknown directive: {0}")]
    UnknownDirective(String),

    /// Input failed validation.
    #[error("{0}")]
    InvalidField(String),
}

fn expected_list(statuses: &[RequestStatus]) -> String {
    statuses
        .iter()
        .map(RequestStatus::as_str)
        .collect::<Vec<_>>()
        .join(" or ")
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::QuoteNotFound(_) => AppError::NotFound(err.to_string()),
            LifecycleError::UnknownDirective(_) | LifecycleError::InvalidField(_) => {
                AppError::Validation(err.to_string())
            }
            _ => AppError::InvalidTransition(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_expected_and_actual() {
        let err = LifecycleError::InvalidTransition {
            action: "issue_rfq",
            expected: vec![RequestStatus::Sourcing],
            actual: RequestStatus::Quoting,
        };
        assert_eq!(
            err.to_string(),
            "cannot issue_rfq from QUOTING; expected SOURCING"
        );
    }

    #[test]
    fn test_mapping() {
        assert_eq!(
            AppError::from(LifecycleError::UnknownDirective("x".into())).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            AppError::from(LifecycleError::MissingContract).error_code(),
            "INVALID_TRANSITION"
        );
        assert_eq!(
            AppError::from(LifecycleError::QuoteNotFound(Uuid::nil())).status_code(),
            404
        );
    }
}
