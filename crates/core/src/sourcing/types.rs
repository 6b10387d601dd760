//! Sourcing types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A vendor considered for an RFQ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorCandidate {
    /// Vendor id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Rating, 0-5.
    pub rating: Decimal,
    /// Only verified vendors are solicited.
    pub verified: bool,
    /// Categories the vendor supplies.
    pub categories: Vec<String>,
}

impl VendorCandidate {
    /// Whether the vendor supplies `category` (case-insensitive).
    /// Any vendor matches when the request has no category yet.
    #[must_use]
    pub fn supplies(&self, category: Option<&str>) -> bool {
        category.is_none_or(|wanted| {
            self.categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(wanted.trim()))
        })
    }
}

/// Placeholder quote generated on behalf of a solicited vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteDraft {
    /// Vendor.
    pub vendor_id: Uuid,
    /// Unit price.
    pub unit_price: Decimal,
    /// Units.
    pub quantity: i32,
    /// `unit_price * quantity`.
    pub total_price: Decimal,
    /// Lead time in days.
    pub delivery_days: i32,
    /// Warranty text.
    pub warranty: String,
}

/// A quote as seen by the recommender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteCandidate {
    /// Quote id.
    pub id: Uuid,
    /// Total price.
    pub total_price: Decimal,
    /// Lead time in days.
    pub delivery_days: i32,
    /// Vendor rating.
    pub vendor_rating: Decimal,
    /// Currently flagged as recommended.
    pub recommended: bool,
}
