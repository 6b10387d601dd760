//! Three-way match classification and invoice decisions.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::ReconciliationError;
use super::types::{InvoiceAction, InvoiceStatus, MatchResult, MatchStatus, NewInvoice};

/// Stateless reconciliation engine.
pub struct ReconciliationEngine;

impl ReconciliationEngine {
    /// Classifies an invoice total against the PO total.
    ///
    /// Above `tolerance` percent is a mismatch, anything above zero is a
    /// partial match.
    ///
    /// # Errors
    ///
    /// `InvalidPoTotal` if the PO total is not positive.
    pub fn classify(
        po_total: Decimal,
        invoice_total: Decimal,
        tolerance: Decimal,
    ) -> Result<MatchResult, ReconciliationError> {
        if po_total <= Decimal::ZERO {
            return Err(ReconciliationError::InvalidPoTotal);
        }
        let variance = invoice_total - po_total;
        let variance_percent = variance.abs() / po_total * Decimal::ONE_HUNDRED;

        let (status, reason) = if variance_percent > tolerance {
            (
                MatchStatus::Mismatch,
                Some(format!(
                    "Invoice total differs from PO by {}%",
                    one_decimal(variance_percent)
                )),
            )
        } else if variance_percent > Decimal::ZERO {
            (
                MatchStatus::PartialMatch,
                Some(format!("Minor variance of {}%", one_decimal(variance_percent))),
            )
        } else {
            (MatchStatus::Matched, None)
        };

        Ok(MatchResult {
            variance,
            variance_percent,
            status,
            reason,
        })
    }

    /// Validates invoice input.
    ///
    /// # Errors
    ///
    /// A `ReconciliationError` describing the first invalid field.
    pub fn validate(input: &NewInvoice) -> Result<(), ReconciliationError> {
        if input.invoice_number.trim().is_empty() {
            return Err(ReconciliationError::MissingInvoiceNumber);
        }
        if input.total.is_sign_negative()
            || input.subtotal.is_sign_negative()
            || input.tax.is_sign_negative()
        {
            return Err(ReconciliationError::NegativeAmount);
        }
        Ok(())
    }

    /// Resulting invoice status for `action`.
    ///
    /// RECEIVED → APPROVED | DISPUTED | PAID; APPROVED → PAID | DISPUTED;
    /// DISPUTED → APPROVED; PAID is terminal.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` or `DisputeReasonRequired`.
    pub fn decide(
        current: InvoiceStatus,
        action: &InvoiceAction,
    ) -> Result<InvoiceStatus, ReconciliationError> {
        use InvoiceStatus::{Approved, Disputed, Paid, Received};

        let next = match (current, action) {
            (Received | Disputed, InvoiceAction::Approve) => Approved,
            (Received | Approved, InvoiceAction::Dispute { reason }) => {
                if reason.trim().is_empty() {
                    return Err(ReconciliationError::DisputeReasonRequired);
                }
                Disputed
            }
            (Received | Approved, InvoiceAction::Pay { .. }) => Paid,
            _ => {
                return Err(ReconciliationError::InvalidTransition {
                    action: action.as_str(),
                    actual: current,
                });
            }
        };
        Ok(next)
    }
}

/// Percent with exactly one decimal place.
#[must_use]
pub fn one_decimal(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(1);
    rounded.to_string()
}
