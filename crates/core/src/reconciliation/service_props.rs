//! Property-based tests for match classification.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::reconciliation::service::ReconciliationEngine;
use crate::reconciliation::types::MatchStatus;

proptest! {
    /// Classification agrees with the variance percent and is symmetric in
    /// the sign of the variance.
    #[test]
    fn prop_classification_follows_percent(po in 1i64..10_000_000, delta in -1_000_000i64..1_000_000) {
        let po_total = Decimal::from(po);
        let invoice_total = po_total + Decimal::from(delta);
        let r = ReconciliationEngine::classify(po_total, invoice_total, dec!(5)).unwrap();

        prop_assert_eq!(r.variance, Decimal::from(delta));
        let expected = if r.variance_percent > dec!(5) {
            MatchStatus::Mismatch
        } else if delta == 0 {
            MatchStatus::Matched
        } else {
            MatchStatus::PartialMatch
        };
        prop_assert_eq!(r.status, expected);
        prop_assert_eq!(r.reason.is_none(), delta == 0);

        let mirrored = ReconciliationEngine::classify(po_total, po_total - Decimal::from(delta), dec!(5)).unwrap();
        prop_assert_eq!(mirrored.status, r.status);
    }
}
