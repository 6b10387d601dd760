//! Property-based tests for the budget ledger.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::service::BudgetService;
use super::types::BudgetFigures;

#[derive(Debug, Clone, Copy)]
enum Op {
    Commit(i64),
    Decommit(i64),
    Realize(i64),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0i64..100_000).prop_map(Op::Commit),
        (0i64..100_000).prop_map(Op::Decommit),
        (0i64..100_000).prop_map(Op::Realize),
    ]
}

proptest! {
    /// After any sequence of ledger operations neither amount is negative.
    #[test]
    fn prop_ledger_never_negative(ops in prop::collection::vec(arb_op(), 0..50)) {
        let mut figures = BudgetFigures {
            total: dec!(150000),
            spent: Decimal::ZERO,
            committed: Decimal::ZERO,
            alert_threshold: dec!(80),
        };
        for op in ops {
            let update = match op {
                Op::Commit(a) => BudgetService::commit(&figures, Decimal::from(a)),
                Op::Decommit(a) => BudgetService::decommit(&figures, Decimal::from(a)),
                Op::Realize(a) => BudgetService::realize(&figures, Decimal::from(a)),
            }
            .unwrap();
            figures.committed = update.committed;
            figures.spent = update.spent;
            prop_assert!(figures.committed >= Decimal::ZERO);
            prop_assert!(figures.spent >= Decimal::ZERO);
        }
    }

    /// Utilization is exactly the rounded ratio.
    #[test]
    fn prop_utilization_deterministic(
        total in 1i64..1_000_000,
        spent in 0i64..1_000_000,
        committed in 0i64..1_000_000,
    ) {
        let figures = BudgetFigures {
            total: Decimal::from(total),
            spent: Decimal::from(spent),
            committed: Decimal::from(committed),
            alert_threshold: dec!(80),
        };
        let expected = (Decimal::from(spent + committed) / Decimal::from(total) * dec!(100))
            .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
        prop_assert_eq!(BudgetService::utilization(&figures), expected);
        prop_assert_eq!(
            BudgetService::standing(&figures).is_over_threshold,
            expected >= dec!(80)
        );
    }
}
