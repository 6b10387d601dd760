//! Reconciliation errors.

use thiserror::Error;

use procura_shared::AppError;

use super::types::InvoiceStatus;

/// Reconciliation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconciliationError {
    /// PO total must be positive to compute a variance.
    #[error("purchase order total must be positive")]
    InvalidPoTotal,

    /// Invoice amounts must not be negative.
    #[error("invoice amounts cannot be negative")]
    NegativeAmount,

    /// Invoice number missing.
    #[error("invoice number is required")]
    MissingInvoiceNumber,

    /// Dispute without a reason.
    #[error("dispute reason is required")]
    DisputeReasonRequired,

    /// Action not valid from the invoice's status.
    #[error("cannot {action} an invoice that is {actual}")]
    InvalidTransition {
        /// Attempted action.
        action: &'static str,
        /// Current status.
        actual: InvoiceStatus,
    },
}

impl From<ReconciliationError> for AppError {
    fn from(err: ReconciliationError) -> Self {
        match err {
            ReconciliationError::InvalidTransition { .. } => {
                AppError::InvalidTransition(err.to_string())
            }
            _ => AppError::Validation(err.to_string()),
        }
    }
}
