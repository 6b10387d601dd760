//! Negotiation domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Negotiation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegotiationStatus {
    /// Opening offer sent.
    Open,
    /// Vendor countered.
    Countered,
    /// Price agreed.
    Accepted,
    /// Abandoned or superseded.
    Rejected,
}

impl NegotiationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Countered => "COUNTERED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OPEN" => Some(Self::Open),
            "COUNTERED" => Some(Self::Countered),
            "ACCEPTED" => Some(Self::Accepted),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Open or countered.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Open | Self::Countered)
    }
}

impl fmt::Display for NegotiationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a single round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundStatus {
    /// Our offer is out.
    Sent,
    /// Vendor replied with a counter.
    Countered,
    /// Offer accepted.
    Accepted,
    /// Offer rejected.
    Rejected,
}

impl RoundStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "SENT",
            Self::Countered => "COUNTERED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SENT" => Some(Self::Sent),
            "COUNTERED" => Some(Self::Countered),
            "ACCEPTED" => Some(Self::Accepted),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Our pricing position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    /// Price we aim to close at.
    pub target_price: Decimal,
    /// First offer sent.
    pub opening_offer: Decimal,
}

/// A round to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundPlan {
    /// Round number, strictly increasing per negotiation.
    pub round: i32,
    /// Our offer.
    pub our_offer: Option<Decimal>,
    /// Vendor counter-offer.
    pub vendor_response: Option<Decimal>,
    /// Round status.
    pub status: RoundStatus,
    /// Free-text rationale.
    pub message: String,
}

/// What opening a negotiation writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningPlan {
    /// Quote total.
    pub original_price: Decimal,
    /// Starts equal to `original_price`.
    pub current_price: Decimal,
    /// From the strategy.
    pub target_price: Decimal,
    /// Round 1.
    pub first_round: RoundPlan,
}

/// What recording a counter writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterPlan {
    /// New current price.
    pub current_price: Decimal,
    /// Round to append.
    pub round: RoundPlan,
}

/// Savings of one negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Savings {
    /// `original - current`.
    pub amount: Decimal,
    /// `amount / original * 100`.
    pub percent: Decimal,
}

/// Savings across accepted negotiations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsSummary {
    /// Sum of savings amounts.
    pub total_savings: Decimal,
    /// Unweighted mean of per-negotiation percents, 2 decimals.
    pub average_savings_percent: Decimal,
    /// Negotiations counted.
    pub count: usize,
}
