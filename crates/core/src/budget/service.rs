//! Ledger arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::BudgetError;
use super::types::{BudgetFigures, BudgetPatch, BudgetStanding, LedgerUpdate, NewBudget};

/// Alert threshold used when none is given.
pub const DEFAULT_ALERT_THRESHOLD: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

/// Budget service for ledger math.
pub struct BudgetService;

impl BudgetService {
    /// `round((spent + committed) / total * 100, 2)`; zero for an empty envelope.
    #[must_use]
    pub fn utilization(figures: &BudgetFigures) -> Decimal {
        if figures.total.is_zero() {
            return Decimal::ZERO;
        }
        ((figures.spent + figures.committed) / figures.total * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// `total - spent - committed`.
    #[must_use]
    pub fn remaining(figures: &BudgetFigures) -> Decimal {
        figures.total - figures.spent - figures.committed
    }

    /// Utilization, remaining and threshold flag in one read.
    #[must_use]
    pub fn standing(figures: &BudgetFigures) -> BudgetStanding {
        let utilization = Self::utilization(figures);
        BudgetStanding {
            utilization,
            remaining: Self::remaining(figures),
            is_over_threshold: utilization >= figures.alert_threshold,
        }
    }

    /// Reserves `amount`.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NegativeAmount` for a negative amount.
    pub fn commit(figures: &BudgetFigures, amount: Decimal) -> Result<LedgerUpdate, BudgetError> {
        non_negative(amount)?;
        Ok(LedgerUpdate {
            committed: figures.committed + amount,
            spent: figures.spent,
            clamped: false,
        })
    }

    /// Releases `amount`, flooring the commitment at zero.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NegativeAmount` for a negative amount.
    pub fn decommit(figures: &BudgetFigures, amount: Decimal) -> Result<LedgerUpdate, BudgetError> {
        non_negative(amount)?;
        let (committed, clamped) = floor_sub(figures.committed, amount);
        Ok(LedgerUpdate {
            committed,
            spent: figures.spent,
            clamped,
        })
    }

    /// Moves `amount` from committed to spent.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NegativeAmount` for a negative amount.
    pub fn realize(figures: &BudgetFigures, amount: Decimal) -> Result<LedgerUpdate, BudgetError> {
        non_negative(amount)?;
        let (committed, clamped) = floor_sub(figures.committed, amount);
        Ok(LedgerUpdate {
            committed,
            spent: figures.spent + amount,
            clamped,
        })
    }

    /// Validates creation input.
    ///
    /// # Errors
    ///
    /// Returns a `BudgetError` describing the first invalid field.
    pub fn validate_new(input: &NewBudget) -> Result<(), BudgetError> {
        if input.department.trim().is_empty() {
            return Err(BudgetError::MissingField("department"));
        }
        if input.total_amount <= Decimal::ZERO {
            return Err(BudgetError::NonPositiveTotal);
        }
        if let Some(threshold) = input.alert_threshold {
            threshold_in_range(threshold)?;
        }
        Ok(())
    }

    /// Validates a patch.
    ///
    /// # Errors
    ///
    /// Returns a `BudgetError` describing the first invalid field.
    pub fn validate_patch(patch: &BudgetPatch) -> Result<(), BudgetError> {
        if patch.total_amount.is_some_and(|t| t <= Decimal::ZERO) {
            return Err(BudgetError::NonPositiveTotal);
        }
        if patch.spent_amount.is_some_and(|a| a.is_sign_negative())
            || patch.committed_amount.is_some_and(|a| a.is_sign_negative())
        {
            return Err(BudgetError::NegativeAmount);
        }
        if let Some(threshold) = patch.alert_threshold {
            threshold_in_range(threshold)?;
        }
        Ok(())
    }
}

fn non_negative(amount: Decimal) -> Result<(), BudgetError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        Err(BudgetError::NegativeAmount)
    } else {
        Ok(())
    }
}

fn floor_sub(current: Decimal, amount: Decimal) -> (Decimal, bool) {
    let next = current - amount;
    if next < Decimal::ZERO {
        (Decimal::ZERO, true)
    } else {
        (next, false)
    }
}

fn threshold_in_range(threshold: Decimal) -> Result<(), BudgetError> {
    if threshold < Decimal::ZERO || threshold > Decimal::ONE_HUNDRED {
        Err(BudgetError::InvalidThreshold)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn engineering() -> BudgetFigures {
        BudgetFigures {
            total: dec!(150000),
            spent: dec!(45000),
            committed: dec!(25000),
            alert_threshold: dec!(80),
        }
    }

    #[test]
    fn test_utilization_rounds_to_two_places() {
        assert_eq!(BudgetService::utilization(&engineering()), dec!(46.67));
    }

    #[test]
    fn test_standing() {
        let s = BudgetService::standing(&engineering());
        assert_eq!(s.remaining, dec!(80000));
        assert!(!s.is_over_threshold);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let figures = BudgetFigures {
            total: dec!(1000),
            spent: dec!(500),
            committed: dec!(300),
            alert_threshold: dec!(80),
        };
        assert!(BudgetService::standing(&figures).is_over_threshold);
    }

    #[test]
    fn test_zero_total_has_zero_utilization() {
        let figures = BudgetFigures {
            total: Decimal::ZERO,
            spent: dec!(10),
            committed: Decimal::ZERO,
            alert_threshold: dec!(80),
        };
        assert_eq!(BudgetService::utilization(&figures), Decimal::ZERO);
    }

    #[test]
    fn test_decommit_floors_at_zero() {
        let update = BudgetService::decommit(&engineering(), dec!(30000)).unwrap();
        assert_eq!(update.committed, Decimal::ZERO);
        assert!(update.clamped);
    }

    #[test]
    fn test_realize_moves_commitment_to_spend() {
        let update = BudgetService::realize(&engineering(), dec!(15400)).unwrap();
        assert_eq!(update.spent, dec!(60400));
        assert_eq!(update.committed, dec!(9600));
        assert!(!update.clamped);
    }

    #[test]
    fn test_negative_amount_rejected() {
        assert_eq!(
            BudgetService::commit(&engineering(), dec!(-1)).unwrap_err(),
            BudgetError::NegativeAmount
        );
    }

    #[test]
    fn test_validate_new() {
        let mut input = NewBudget {
            department: "Engineering".into(),
            fiscal_year: 2026,
            quarter: None,
            total_amount: dec!(100),
            alert_threshold: Some(dec!(120)),
            manager_id: None,
        };
        assert_eq!(
            BudgetService::validate_new(&input).unwrap_err(),
            BudgetError::InvalidThreshold
        );
        input.alert_threshold = None;
        assert!(BudgetService::validate_new(&input).is_ok());
        input.department = " ".into();
        assert!(BudgetService::validate_new(&input).is_err());
    }

    #[test]
    fn test_default_threshold() {
        assert_eq!(DEFAULT_ALERT_THRESHOLD, dec!(80));
    }
}
