//! Negotiation round tracking and savings math.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::NegotiationError;
use super::types::{
    CounterPlan, NegotiationStatus, OpeningPlan, RoundPlan, RoundStatus, Savings, SavingsSummary,
    Strategy,
};

/// Target as a share of the quoted total when no strategy is given.
const DEFAULT_TARGET_RATIO: Decimal = Decimal::from_parts(85, 0, 0, false, 2);
/// Opening offer as a share of the quoted total.
const DEFAULT_OPENING_RATIO: Decimal = Decimal::from_parts(80, 0, 0, false, 2);

/// Stateless negotiation tracker.
pub struct NegotiationTracker;

impl NegotiationTracker {
    /// 85% target, 80% opening, both rounded to whole units.
    #[must_use]
    pub fn default_strategy(quote_total: Decimal) -> Strategy {
        Strategy {
            target_price: round_whole(quote_total * DEFAULT_TARGET_RATIO),
            opening_offer: round_whole(quote_total * DEFAULT_OPENING_RATIO),
        }
    }

    /// Plans a new negotiation from the selected quote.
    ///
    /// # Errors
    ///
    /// `NonPositivePrice` if the quote total or opening offer is not positive.
    pub fn open(quote_total: Decimal, strategy: Strategy) -> Result<OpeningPlan, NegotiationError> {
        if quote_total <= Decimal::ZERO || strategy.opening_offer <= Decimal::ZERO {
            return Err(NegotiationError::NonPositivePrice);
        }
        Ok(OpeningPlan {
            original_price: quote_total,
            current_price: quote_total,
            target_price: strategy.target_price,
            first_round: RoundPlan {
                round: 1,
                our_offer: Some(strategy.opening_offer),
                vendor_response: None,
                status: RoundStatus::Sent,
                message: format!(
                    "Opening offer {} against quoted {}, targeting {}",
                    strategy.opening_offer, quote_total, strategy.target_price
                ),
            },
        })
    }

    /// Appends a vendor counter as round `max + 1`.
    ///
    /// # Errors
    ///
    /// `Closed` once accepted or rejected; `NonPositivePrice` for a bad counter.
    pub fn record_counter(
        status: NegotiationStatus,
        max_round: i32,
        vendor_counter: Decimal,
        our_offer: Option<Decimal>,
        message: impl Into<String>,
    ) -> Result<CounterPlan, NegotiationError> {
        ensure_live(status)?;
        if vendor_counter <= Decimal::ZERO {
            return Err(NegotiationError::NonPositivePrice);
        }
        Ok(CounterPlan {
            current_price: vendor_counter,
            round: RoundPlan {
                round: max_round + 1,
                our_offer,
                vendor_response: Some(vendor_counter),
                status: RoundStatus::Countered,
                message: message.into(),
            },
        })
    }

    /// Placeholder vendor behaviour: meet halfway between our opening
    /// offer and the quoted price.
    #[must_use]
    pub fn simulated_counter(opening_offer: Decimal, original_price: Decimal) -> Decimal {
        round_whole((opening_offer + original_price) / Decimal::TWO)
    }

    /// Accepting freezes `current_price`.
    ///
    /// # Errors
    ///
    /// `Closed` once accepted or rejected.
    pub fn accept(status: NegotiationStatus) -> Result<NegotiationStatus, NegotiationError> {
        ensure_live(status)?;
        Ok(NegotiationStatus::Accepted)
    }

    /// Abandons the negotiation.
    ///
    /// # Errors
    ///
    /// `Closed` once accepted or rejected.
    pub fn reject(status: NegotiationStatus) -> Result<NegotiationStatus, NegotiationError> {
        ensure_live(status)?;
        Ok(NegotiationStatus::Rejected)
    }

    /// `original - current` and its share of `original`.
    #[must_use]
    pub fn savings(original_price: Decimal, current_price: Decimal) -> Savings {
        let amount = original_price - current_price;
        let percent = if original_price.is_zero() {
            Decimal::ZERO
        } else {
            amount / original_price * Decimal::ONE_HUNDRED
        };
        Savings { amount, percent }
    }

    /// Aggregates per-negotiation savings with an unweighted mean of percents.
    pub fn summarize<I>(prices: I) -> SavingsSummary
    where
        I: IntoIterator<Item = (Decimal, Decimal)>,
    {
        let mut total_savings = Decimal::ZERO;
        let mut percent_sum = Decimal::ZERO;
        let mut count = 0usize;
        for (original, current) in prices {
            let s = Self::savings(original, current);
            total_savings += s.amount;
            percent_sum += s.percent;
            count += 1;
        }
        let average_savings_percent = if count == 0 {
            Decimal::ZERO
        } else {
            (percent_sum / Decimal::from(count))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        };
        SavingsSummary {
            total_savings,
            average_savings_percent,
            count,
        }
    }
}

fn ensure_live(status: NegotiationStatus) -> Result<(), NegotiationError> {
    if status.is_live() {
        Ok(())
    } else {
        Err(NegotiationError::Closed(status))
    }
}

fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_strategy() {
        let s = NegotiationTracker::default_strategy(dec!(16000));
        assert_eq!(s.target_price, dec!(13600));
        assert_eq!(s.opening_offer, dec!(12800));
    }

    #[test]
    fn test_open_creates_round_one() {
        let plan = NegotiationTracker::open(
            dec!(16000),
            NegotiationTracker::default_strategy(dec!(16000)),
        )
        .unwrap();
        assert_eq!(plan.original_price, plan.current_price);
        assert_eq!(plan.first_round.round, 1);
        assert_eq!(plan.first_round.status, RoundStatus::Sent);
        assert_eq!(plan.first_round.our_offer, Some(dec!(12800)));
    }

    #[test]
    fn test_simulated_counter_is_midpoint() {
        assert_eq!(
            NegotiationTracker::simulated_counter(dec!(12800), dec!(16000)),
            dec!(14400)
        );
        assert_eq!(
            NegotiationTracker::simulated_counter(dec!(1), dec!(2)),
            dec!(2)
        );
    }

    #[test]
    fn test_counter_appends_next_round() {
        let plan = NegotiationTracker::record_counter(
            NegotiationStatus::Open,
            1,
            dec!(14400),
            Some(dec!(13600)),
            "Vendor counter-offer received",
        )
        .unwrap();
        assert_eq!(plan.round.round, 2);
        assert_eq!(plan.current_price, dec!(14400));
        assert_eq!(plan.round.status, RoundStatus::Countered);
    }

    #[test]
    fn test_closed_negotiation_rejects_changes() {
        assert_eq!(
            NegotiationTracker::accept(NegotiationStatus::Accepted).unwrap_err(),
            NegotiationError::Closed(NegotiationStatus::Accepted)
        );
        assert!(NegotiationTracker::reject(NegotiationStatus::Rejected).is_err());
        assert!(
            NegotiationTracker::record_counter(
                NegotiationStatus::Rejected,
                3,
                dec!(10),
                None,
                ""
            )
            .is_err()
        );
    }

    #[test]
    fn test_savings_average_is_unweighted() {
        // 10%, 20% and 30% on very different sizes
        let summary = NegotiationTracker::summarize([
            (dec!(100), dec!(90)),
            (dec!(10000), dec!(8000)),
            (dec!(1000), dec!(700)),
        ]);
        assert_eq!(summary.average_savings_percent, dec!(20));
        assert_eq!(summary.total_savings, dec!(2310));
        assert_eq!(summary.count, 3);
    }

    #[test]
    fn test_empty_summary() {
        let summary = NegotiationTracker::summarize(std::iter::empty());
        assert_eq!(summary.average_savings_percent, Decimal::ZERO);
        assert_eq!(summary.count, 0);
    }
}
