//! Budget error types.

use thiserror::Error;

use procura_shared::AppError;

/// Budget-related errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BudgetError {
    /// Amount cannot be negative.
    #[error("Amount cannot be negative")]
    NegativeAmount,

    /// Budget envelope must be positive.
    #[error("Total amount must be positive")]
    NonPositiveTotal,

    /// Threshold outside 0..=100.
    #[error("Alert threshold must be between 0 and 100")]
    InvalidThreshold,

    /// Department or fiscal year missing.
    #[error("{0} is required")]
    MissingField(&'static str),
}

impl From<BudgetError> for AppError {
    fn from(err: BudgetError) -> Self {
        AppError::Validation(err.to_string())
    }
}
