//! Contract drafting from an agreed negotiation.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Terms used when no drafting service supplies any.
pub const STANDARD_TERMS: [&str; 5] = [
    "Payment due within 30 days of invoice",
    "Free shipping for orders over $10,000",
    "Late delivery penalty: 1% per week",
    "Return window: 14 days from delivery",
    "Warranty as per manufacturer terms",
];

/// One contract line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// What is bought.
    pub description: String,
    /// Units.
    pub quantity: i32,
    /// Per-unit price.
    pub unit_price: Decimal,
    /// Line total.
    pub total: Decimal,
}

/// Contract snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDraft {
    /// Line items.
    pub items: Vec<LineItem>,
    /// Total value, equal to the negotiation's current price.
    pub total_value: Decimal,
    /// Payment terms.
    pub payment_terms: String,
    /// Promised delivery date.
    pub delivery_date: DateTime<Utc>,
    /// Warranty.
    pub warranty: String,
    /// Generated textual terms.
    pub terms: Vec<String>,
}

/// Settings for drafting.
#[derive(Debug, Clone)]
pub struct DraftSettings<'a> {
    /// Payment terms.
    pub payment_terms: &'a str,
    /// Warranty.
    pub warranty: &'a str,
    /// Lead time.
    pub delivery_days: i64,
}

/// Snapshots the agreed price into a single-line contract.
#[must_use]
pub fn draft(
    description: Option<&str>,
    quantity: Option<i32>,
    agreed_price: Decimal,
    settings: &DraftSettings<'_>,
    now: DateTime<Utc>,
) -> ContractDraft {
    let quantity = quantity.filter(|q| *q > 0).unwrap_or(1);
    let unit_price = (agreed_price / Decimal::from(quantity))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    ContractDraft {
        items: vec![LineItem {
            description: description.unwrap_or("Office Equipment").to_string(),
            quantity,
            unit_price,
            total: agreed_price,
        }],
        total_value: agreed_price,
        payment_terms: settings.payment_terms.to_string(),
        delivery_date: now + Duration::days(settings.delivery_days),
        warranty: settings.warranty.to_string(),
        terms: STANDARD_TERMS.iter().map(|t| (*t).to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_draft_snapshots_price() {
        let now = Utc::now();
        let settings = DraftSettings {
            payment_terms: "Net 30",
            warranty: "5 years",
            delivery_days: 14,
        };
        let c = draft(Some("Standing desks"), Some(40), dec!(14400), &settings, now);
        assert_eq!(c.total_value, dec!(14400));
        assert_eq!(c.items[0].unit_price, dec!(360));
        assert_eq!(c.delivery_date, now + Duration::days(14));
        assert_eq!(c.terms.len(), 5);
    }

    #[test]
    fn test_draft_without_quantity() {
        let settings = DraftSettings {
            payment_terms: "Net 30",
            warranty: "5 years",
            delivery_days: 14,
        };
        let c = draft(None, None, dec!(999), &settings, Utc::now());
        assert_eq!(c.items[0].quantity, 1);
        assert_eq!(c.items[0].description, "Office Equipment");
    }
}
