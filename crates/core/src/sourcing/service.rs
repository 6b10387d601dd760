//! Sourcing policy.

use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;
use uuid::Uuid;

use super::types::{QuoteCandidate, QuoteDraft, VendorCandidate};
use crate::request::LifecycleError;

/// Unit price assumed when the request carries no estimate.
const FALLBACK_UNIT_PRICE: Decimal = Decimal::from_parts(350, 0, 0, false, 0);
/// Quantity assumed when the request carries none.
pub const FALLBACK_QUANTITY: i32 = 40;

/// Stateless sourcing policy.
pub struct SourcingPolicy;

impl SourcingPolicy {
    /// Top `limit` verified vendors for `category`, best rated first.
    #[must_use]
    pub fn select_vendors(
        mut vendors: Vec<VendorCandidate>,
        category: Option<&str>,
        limit: usize,
    ) -> Vec<VendorCandidate> {
        vendors.retain(|v| v.verified && v.supplies(category));
        vendors.sort_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.name.cmp(&b.name)));
        vendors.truncate(limit);
        vendors
    }

    /// Deterministic placeholder quote for the `index`-th solicited vendor.
    ///
    /// Prices spread from 90% of the estimated unit price upward in 5% steps;
    /// lead time is `7 + 5 * index` days and warranty `3 + 2 * index` years.
    #[must_use]
    pub fn synthesize_quote(
        vendor: &VendorCandidate,
        index: usize,
        quantity: Option<i32>,
        budget_estimate: Option<Decimal>,
    ) -> QuoteDraft {
        let quantity = quantity.filter(|q| *q > 0).unwrap_or(FALLBACK_QUANTITY);
        let base = budget_estimate
            .filter(|b| *b > Decimal::ZERO)
            .map_or(FALLBACK_UNIT_PRICE, |b| b / Decimal::from(quantity));
        let step = i32::try_from(index).unwrap_or(i32::MAX);
        let factor = Decimal::new(90, 2) + Decimal::new(5, 2) * Decimal::from(step);
        let unit_price =
            (base * factor).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        QuoteDraft {
            vendor_id: vendor.id,
            unit_price,
            quantity,
            total_price: unit_price * Decimal::from(quantity),
            delivery_days: 7_i32.saturating_add(step.saturating_mul(5)),
            warranty: format!("{} years", 3_i32.saturating_add(step.saturating_mul(2))),
        }
    }

    /// Index of the quote to recommend: lowest total, then shortest lead
    /// time, then highest vendor rating.
    #[must_use]
    pub fn recommend(quotes: &[QuoteCandidate]) -> Option<usize> {
        quotes
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| rank(a, b))
            .map(|(i, _)| i)
    }

    /// Quote to negotiate on: the one named by the caller, else the
    /// recommended one, else the lowest total.
    ///
    /// # Errors
    ///
    /// `QuoteNotFound` for an unknown id, `NoQuotes` when there is nothing.
    pub fn select_for_negotiation(
        quotes: &[QuoteCandidate],
        specified: Option<Uuid>,
    ) -> Result<QuoteCandidate, LifecycleError> {
        if let Some(id) = specified {
            return quotes
                .iter()
                .find(|q| q.id == id)
                .copied()
                .ok_or(LifecycleError::QuoteNotFound(id));
        }
        quotes
            .iter()
            .find(|q| q.recommended)
            .or_else(|| quotes.iter().min_by(|a, b| a.total_price.cmp(&b.total_price)))
            .copied()
            .ok_or(LifecycleError::NoQuotes)
    }
}

fn rank(a: &QuoteCandidate, b: &QuoteCandidate) -> Ordering {
    a.total_price
        .cmp(&b.total_price)
        .then_with(|| a.delivery_days.cmp(&b.delivery_days))
        .then_with(|| b.vendor_rating.cmp(&a.vendor_rating))
}
