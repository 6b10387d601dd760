//! Reconciliation domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of comparing an invoice against its PO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    /// Totals equal.
    Matched,
    /// Within tolerance.
    PartialMatch,
    /// Outside tolerance.
    Mismatch,
}

impl MatchStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "MATCHED",
            Self::PartialMatch => "PARTIAL_MATCH",
            Self::Mismatch => "MISMATCH",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MATCHED" => Some(Self::Matched),
            "PARTIAL_MATCH" => Some(Self::PartialMatch),
            "MISMATCH" => Some(Self::Mismatch),
            _ => None,
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Invoice payment sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Submitted by the vendor.
    Received,
    /// Approved for payment.
    Approved,
    /// Under dispute.
    Disputed,
    /// Paid.
    Paid,
}

impl InvoiceStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Approved => "APPROVED",
            Self::Disputed => "DISPUTED",
            Self::Paid => "PAID",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RECEIVED" => Some(Self::Received),
            "APPROVED" => Some(Self::Approved),
            "DISPUTED" => Some(Self::Disputed),
            "PAID" => Some(Self::Paid),
            _ => None,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Computed three-way match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// `invoice - po`.
    pub variance: Decimal,
    /// `|variance| / po * 100`.
    pub variance_percent: Decimal,
    /// Classification.
    pub status: MatchStatus,
    /// Human-readable explanation, absent when matched.
    pub reason: Option<String>,
}

/// Vendor-submitted invoice fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoice {
    /// Vendor's invoice number.
    pub invoice_number: String,
    /// Pre-tax amount.
    pub subtotal: Decimal,
    /// Tax.
    #[serde(default)]
    pub tax: Decimal,
    /// Amount billed.
    pub total: Decimal,
    /// Line items as billed.
    #[serde(default)]
    pub items: serde_json::Value,
    /// Payment due date.
    pub due_date: Option<DateTime<Utc>>,
}

/// Action on a submitted invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum InvoiceAction {
    /// Approve, forcing the match to MATCHED.
    Approve,
    /// Dispute with a reason.
    Dispute {
        /// Why.
        reason: String,
    },
    /// Record payment.
    Pay {
        /// Amount paid, defaults to the invoice total.
        #[serde(default)]
        amount: Option<Decimal>,
        /// Payment method, e.g. "ACH".
        #[serde(default)]
        method: Option<String>,
        /// Payment reference.
        #[serde(default)]
        reference: Option<String>,
    },
}

impl InvoiceAction {
    /// Returns the wire name of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Dispute { .. } => "dispute",
            Self::Pay { .. } => "pay",
        }
    }
}
