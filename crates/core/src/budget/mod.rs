//! Budget commitment ledger.
//!
//! Committed amounts are reserved by in-flight requests, spent amounts are
//! realized on payment. Over-commitment raises alerts but is never refused.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::BudgetError;
pub use service::BudgetService;
pub use types::{BudgetFigures, BudgetPatch, BudgetStanding, LedgerUpdate, NewBudget};
