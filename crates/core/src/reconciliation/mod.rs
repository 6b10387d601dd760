//! Invoice three-way match and invoice status machine.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::ReconciliationError;
pub use service::ReconciliationEngine;
pub use types::{InvoiceAction, InvoiceStatus, MatchResult, MatchStatus, NewInvoice};
