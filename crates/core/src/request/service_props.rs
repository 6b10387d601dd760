//! Property-based tests for the request lifecycle.

use proptest::prelude::*;

use crate::negotiation::NegotiationStatus;
use crate::request::service::LifecycleService;
use crate::request::types::{Directive, RequestFacts, RequestStatus};

fn arb_status() -> impl Strategy<Value = RequestStatus> {
    proptest::sample::select(RequestStatus::ALL.to_vec())
}

fn arb_directive() -> impl Strategy<Value = Directive> {
    prop_oneof![
        Just(Directive::AdvanceToSourcing),
        Just(Directive::IssueRfq),
        Just(Directive::StartNegotiation { quote_id: None }),
        Just(Directive::GenerateContract),
        Just(Directive::GeneratePo),
    ]
}

fn arb_facts() -> impl Strategy<Value = RequestFacts> {
    (
        any::<bool>(),
        prop_oneof![
            Just(None),
            Just(Some(NegotiationStatus::Open)),
            Just(Some(NegotiationStatus::Countered)),
            Just(Some(NegotiationStatus::Accepted)),
            Just(Some(NegotiationStatus::Rejected)),
        ],
    )
        .prop_map(|(has_contract, negotiation)| RequestFacts {
            has_contract,
            negotiation,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A successful directive always starts from the status it was given
    /// and never lands back on it.
    #[test]
    fn prop_transition_moves_forward(
        status in arb_status(),
        directive in arb_directive(),
        facts in arb_facts(),
    ) {
        if let Ok(t) = LifecycleService::apply(status, directive, facts) {
            prop_assert_eq!(t.from, status);
            prop_assert_ne!(t.to, status);
            prop_assert!(t.stage.is_some());
        }
    }

    /// Applying the same directive twice never succeeds both times.
    #[test]
    fn prop_directive_not_repeatable(
        status in arb_status(),
        directive in arb_directive(),
        facts in arb_facts(),
    ) {
        if let Ok(t) = LifecycleService::apply(status, directive, facts) {
            prop_assert!(LifecycleService::apply(t.to, directive, facts).is_err());
        }
    }
}
