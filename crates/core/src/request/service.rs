//! Request lifecycle state machine.
//!
//! Pure validation: each function takes the request's current status (and
//! the facts it depends on) and returns the [`Transition`] to persist. The
//! caller applies it with a compare-and-swap on `from`, so a request that
//! moved in the meantime fails instead of being overwritten.

use rust_decimal::Decimal;

use crate::negotiation::NegotiationStatus;

use super::error::LifecycleError;
use super::types::{
    Directive, NewRequest, RequestFacts, RequestPatch, RequestStatus, Stage, Transition,
};

/// Stateless lifecycle service.
pub struct LifecycleService;

impl LifecycleService {
    /// Validates a directive against the request's state.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when the status is wrong, or one of the
    /// precondition variants when a required child entity is missing.
    pub fn apply(
        current: RequestStatus,
        directive: Directive,
        facts: RequestFacts,
    ) -> Result<Transition, LifecycleError> {
        match directive {
            Directive::AdvanceToSourcing => expect(
                directive,
                current,
                &[RequestStatus::Draft],
                RequestStatus::Sourcing,
                Stage::VendorSearch,
            ),
            Directive::IssueRfq => expect(
                directive,
                current,
                &[RequestStatus::Sourcing],
                RequestStatus::Quoting,
                Stage::QuotesReceived,
            ),
            Directive::StartNegotiation { .. } => {
                let transition = expect(
                    directive,
                    current,
                    &[RequestStatus::Quoting, RequestStatus::Reviewing],
                    RequestStatus::Negotiating,
                    Stage::Negotiating,
                )?;
                if facts.has_contract {
                    return Err(LifecycleError::ContractAlreadyExists);
                }
                Ok(transition)
            }
            Directive::GenerateContract => {
                let transition = expect(
                    directive,
                    current,
                    &[RequestStatus::Negotiating],
                    RequestStatus::Reviewing,
                    Stage::ContractReview,
                )?;
                match facts.negotiation {
                    None => Err(LifecycleError::MissingNegotiation),
                    Some(NegotiationStatus::Rejected) => Err(LifecycleError::NegotiationRejected),
                    Some(_) if facts.has_contract => Err(LifecycleError::ContractAlreadyExists),
                    Some(_) => Ok(transition),
                }
            }
            Directive::GeneratePo => {
                let transition = expect(
                    directive,
                    current,
                    &[RequestStatus::Reviewing, RequestStatus::Approved],
                    RequestStatus::PoGenerated,
                    Stage::Complete,
                )?;
                if !facts.has_contract {
                    return Err(LifecycleError::MissingContract);
                }
                Ok(transition)
            }
        }
    }

    /// Stage after an RFQ, depending on whether any quotes came back.
    #[must_use]
    pub const fn rfq_stage(quotes_created: usize) -> Stage {
        if quotes_created == 0 {
            Stage::RfqSent
        } else {
            Stage::QuotesReceived
        }
    }

    /// Parses a directive name as produced by the intent extractor.
    ///
    /// Conversational actions (`none`, `clarify`, `show_quotes`) yield
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// `UnknownDirective` for anything else.
    pub fn parse_directive(
        action: &str,
        quote_id: Option<uuid::Uuid>,
    ) -> Result<Option<Directive>, LifecycleError> {
        match action.trim().to_lowercase().as_str() {
            "" | "none" | "clarify" | "show_quotes" => Ok(None),
            "advance_to_sourcing" | "search_vendors" => Ok(Some(Directive::AdvanceToSourcing)),
            "issue_rfq" | "send_rfq" => Ok(Some(Directive::IssueRfq)),
            "start_negotiation" => Ok(Some(Directive::StartNegotiation { quote_id })),
            "generate_contract" => Ok(Some(Directive::GenerateContract)),
            "generate_po" | "create_po" => Ok(Some(Directive::GeneratePo)),
            other => Err(LifecycleError::UnknownDirective(other.to_string())),
        }
    }

    /// Moves a pre-order request to CANCELLED.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` once a purchase order exists.
    pub fn cancel(current: RequestStatus) -> Result<Transition, LifecycleError> {
        if current.is_pre_order() {
            Ok(Transition {
                from: current,
                to: RequestStatus::Cancelled,
                stage: None,
            })
        } else {
            Err(LifecycleError::InvalidTransition {
                action: "cancel",
                expected: RequestStatus::ALL
                    .into_iter()
                    .filter(RequestStatus::is_pre_order)
                    .collect(),
                actual: current,
            })
        }
    }

    /// Only drafts may be deleted, whoever asks.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` for any other status.
    pub fn ensure_deletable(current: RequestStatus) -> Result<(), LifecycleError> {
        if current == RequestStatus::Draft {
            Ok(())
        } else {
            Err(LifecycleError::InvalidTransition {
                action: "delete",
                expected: vec![RequestStatus::Draft],
                actual: current,
            })
        }
    }

    /// Starting an approval chain moves the request to PENDING_APPROVAL.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the request is still before approval.
    pub fn submit_for_approval(current: RequestStatus) -> Result<Transition, LifecycleError> {
        const FROM: [RequestStatus; 5] = [
            RequestStatus::Draft,
            RequestStatus::Sourcing,
            RequestStatus::Quoting,
            RequestStatus::Negotiating,
            RequestStatus::Reviewing,
        ];
        if FROM.contains(&current) {
            Ok(Transition {
                from: current,
                to: RequestStatus::PendingApproval,
                stage: None,
            })
        } else {
            Err(LifecycleError::InvalidTransition {
                action: "submit_for_approval",
                expected: FROM.to_vec(),
                actual: current,
            })
        }
    }

    /// Terminal outcome of an approval chain.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the request is PENDING_APPROVAL.
    pub fn conclude_approval(
        current: RequestStatus,
        approved: bool,
    ) -> Result<Transition, LifecycleError> {
        let to = if approved {
            RequestStatus::Approved
        } else {
            RequestStatus::Rejected
        };
        if current == RequestStatus::PendingApproval {
            Ok(Transition {
                from: current,
                to,
                stage: None,
            })
        } else {
            Err(LifecycleError::InvalidTransition {
                action: if approved { "approve" } else { "reject" },
                expected: vec![RequestStatus::PendingApproval],
                actual: current,
            })
        }
    }

    /// Validates creation input.
    ///
    /// # Errors
    ///
    /// `InvalidField` for non-positive quantity or negative estimate.
    pub fn validate_new(input: &NewRequest) -> Result<(), LifecycleError> {
        validate_amounts(input.quantity, input.budget_estimate)
    }

    /// Validates a field patch.
    ///
    /// # Errors
    ///
    /// `InvalidField` for non-positive quantity or negative estimate.
    pub fn validate_patch(patch: &RequestPatch) -> Result<(), LifecycleError> {
        validate_amounts(patch.quantity, patch.budget_estimate)
    }
}

fn expect(
    directive: Directive,
    current: RequestStatus,
    from: &[RequestStatus],
    to: RequestStatus,
    stage: Stage,
) -> Result<Transition, LifecycleError> {
    if from.contains(&current) {
        Ok(Transition {
            from: current,
            to,
            stage: Some(stage),
        })
    } else {
        Err(LifecycleError::InvalidTransition {
            action: directive.as_str(),
            expected: from.to_vec(),
            actual: current,
        })
    }
}

fn validate_amounts(quantity: Option<i32>, estimate: Option<Decimal>) -> Result<(), LifecycleError> {
    if quantity.is_some_and(|q| q <= 0) {
        return Err(LifecycleError::InvalidField(
            "quantity must be positive".to_string(),
        ));
    }
    if estimate.is_some_and(|b| b.is_sign_negative()) {
        return Err(LifecycleError::InvalidField(
            "budget estimate cannot be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn facts() -> RequestFacts {
        RequestFacts::default()
    }

    #[test]
    fn test_advance_to_sourcing() {
        let t = LifecycleService::apply(RequestStatus::Draft, Directive::AdvanceToSourcing, facts())
            .unwrap();
        assert_eq!(t.to, RequestStatus::Sourcing);
        assert_eq!(t.stage, Some(Stage::VendorSearch));
    }

    #[test]
    fn test_issue_rfq_twice_fails_second_time() {
        let first =
            LifecycleService::apply(RequestStatus::Sourcing, Directive::IssueRfq, facts()).unwrap();
        let second = LifecycleService::apply(first.to, Directive::IssueRfq, facts());
        assert_eq!(
            second.unwrap_err(),
            LifecycleError::InvalidTransition {
                action: "issue_rfq",
                expected: vec![RequestStatus::Sourcing],
                actual: RequestStatus::Quoting,
            }
        );
    }

    #[test]
    fn test_start_negotiation_from_reviewing_without_contract() {
        let t = LifecycleService::apply(
            RequestStatus::Reviewing,
            Directive::StartNegotiation { quote_id: None },
            facts(),
        )
        .unwrap();
        assert_eq!(t.to, RequestStatus::Negotiating);
    }

    #[test]
    fn test_start_negotiation_rejected_once_contract_exists() {
        let err = LifecycleService::apply(
            RequestStatus::Reviewing,
            Directive::StartNegotiation { quote_id: None },
            RequestFacts {
                has_contract: true,
                negotiation: Some(NegotiationStatus::Accepted),
            },
        )
        .unwrap_err();
        assert_eq!(err, LifecycleError::ContractAlreadyExists);
    }

    #[test]
    fn test_generate_contract_needs_live_negotiation() {
        let missing =
            LifecycleService::apply(RequestStatus::Negotiating, Directive::GenerateContract, facts());
        assert_eq!(missing.unwrap_err(), LifecycleError::MissingNegotiation);

        let rejected = LifecycleService::apply(
            RequestStatus::Negotiating,
            Directive::GenerateContract,
            RequestFacts {
                has_contract: false,
                negotiation: Some(NegotiationStatus::Rejected),
            },
        );
        assert_eq!(rejected.unwrap_err(), LifecycleError::NegotiationRejected);

        let ok = LifecycleService::apply(
            RequestStatus::Negotiating,
            Directive::GenerateContract,
            RequestFacts {
                has_contract: false,
                negotiation: Some(NegotiationStatus::Countered),
            },
        )
        .unwrap();
        assert_eq!(ok.to, RequestStatus::Reviewing);
        assert_eq!(ok.stage, Some(Stage::ContractReview));
    }

    #[test]
    fn test_generate_po_from_approved() {
        let with_contract = RequestFacts {
            has_contract: true,
            negotiation: Some(NegotiationStatus::Accepted),
        };
        let t = LifecycleService::apply(RequestStatus::Approved, Directive::GeneratePo, with_contract)
            .unwrap();
        assert_eq!(t.to, RequestStatus::PoGenerated);
        assert_eq!(t.stage, Some(Stage::Complete));

        let err = LifecycleService::apply(RequestStatus::Reviewing, Directive::GeneratePo, facts());
        assert_eq!(err.unwrap_err(), LifecycleError::MissingContract);
    }

    #[test]
    fn test_parse_directive() {
        assert_eq!(
            LifecycleService::parse_directive("send_rfq", None).unwrap(),
            Some(Directive::IssueRfq)
        );
        assert_eq!(
            LifecycleService::parse_directive("create_po", None).unwrap(),
            Some(Directive::GeneratePo)
        );
        assert_eq!(LifecycleService::parse_directive("show_quotes", None).unwrap(), None);
        assert!(matches!(
            LifecycleService::parse_directive("launch_rocket", None),
            Err(LifecycleError::UnknownDirective(_))
        ));
    }

    #[test]
    fn test_delete_only_drafts() {
        assert!(LifecycleService::ensure_deletable(RequestStatus::Draft).is_ok());
        for status in RequestStatus::ALL.into_iter().skip(1) {
            assert!(LifecycleService::ensure_deletable(status).is_err());
        }
    }

    #[test]
    fn test_cancel_blocked_after_po() {
        assert!(LifecycleService::cancel(RequestStatus::Quoting).is_ok());
        assert!(LifecycleService::cancel(RequestStatus::PoGenerated).is_err());
        assert!(LifecycleService::cancel(RequestStatus::Cancelled).is_err());
    }

    #[test]
    fn test_conclude_approval_requires_pending() {
        let t = LifecycleService::conclude_approval(RequestStatus::PendingApproval, true).unwrap();
        assert_eq!(t.to, RequestStatus::Approved);
        assert!(LifecycleService::conclude_approval(RequestStatus::Cancelled, false).is_err());
    }

    #[test]
    fn test_patch_validation() {
        let bad = RequestPatch {
            quantity: Some(0),
            ..RequestPatch::default()
        };
        assert!(LifecycleService::validate_patch(&bad).is_err());
        let negative = RequestPatch {
            budget_estimate: Some(dec!(-1)),
            ..RequestPatch::default()
        };
        assert!(LifecycleService::validate_patch(&negative).is_err());
    }

    #[test]
    fn test_status_round_trip_names() {
        for status in RequestStatus::ALL {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RequestStatus::parse("pending_approval"), Some(RequestStatus::PendingApproval));
    }

    #[test]
    fn test_commitment_released_once_settled() {
        assert!(RequestStatus::Draft.holds_commitment());
        assert!(RequestStatus::Invoiced.holds_commitment());
        assert!(RequestStatus::Rejected.holds_commitment());
        assert!(!RequestStatus::Paid.holds_commitment());
        assert!(!RequestStatus::Cancelled.holds_commitment());
    }

    #[test]
    fn test_directive_wire_format() {
        let d: Directive = serde_json::from_str(r#"{"directive":"issue_rfq"}"#).unwrap();
        assert_eq!(d, Directive::IssueRfq);
        let d: Directive = serde_json::from_str(r#"{"directive":"start_negotiation"}"#).unwrap();
        assert_eq!(d, Directive::StartNegotiation { quote_id: None });
    }
}
