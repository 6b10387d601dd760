//! Property-based tests for approval chain closure.

use chrono::{Duration, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use crate::approval::service::ApprovalChain;
use crate::approval::types::{
    ApprovalDecision, ApprovalStatus, ApprovalStep, ApproverSpec, DecisionOutcome,
};
use crate::policy::Role;

fn chain_of(n: usize) -> Vec<ApprovalStep> {
    let specs: Vec<ApproverSpec> = (0..n)
        .map(|i| ApproverSpec {
            user_id: Uuid::from_u128(i as u128 + 1),
            role: Role::Manager,
            threshold: None,
        })
        .collect();
    ApprovalChain::plan(&specs, Utc::now(), Duration::hours(48))
        .unwrap()
        .into_iter()
        .map(|p| ApprovalStep {
            id: Uuid::new_v4(),
            step: p.step,
            approver_id: p.approver_id,
            status: ApprovalStatus::Pending,
        })
        .collect()
}

proptest! {
    /// Approving every step in order approves the request exactly once,
    /// on the last step.
    #[test]
    fn prop_full_traversal_approves_once(n in 1usize..10) {
        let mut chain = chain_of(n);
        let mut approvals = 0;
        let mut current = 0usize;
        loop {
            let step = chain[current];
            let outcome = ApprovalChain::decide(
                &step,
                step.approver_id,
                ApprovalDecision::Approve,
                &chain,
            ).unwrap();
            chain[current].status = ApprovalStatus::Approved;
            match outcome {
                DecisionOutcome::NotifyNext { step: next } => {
                    prop_assert_eq!(next.step, step.step + 1);
                    current += 1;
                }
                DecisionOutcome::RequestApproved => {
                    approvals += 1;
                    break;
                }
                DecisionOutcome::RequestRejected => prop_assert!(false, "unexpected rejection"),
            }
        }
        prop_assert_eq!(approvals, 1);
        prop_assert_eq!(current + 1, n);
    }

    /// Rejecting any step rejects the request regardless of what is pending.
    #[test]
    fn prop_reject_anywhere(n in 1usize..10, at in 0usize..10) {
        let at = at % n;
        let mut chain = chain_of(n);
        for s in chain.iter_mut().take(at) {
            s.status = ApprovalStatus::Approved;
        }
        let step = chain[at];
        let outcome = ApprovalChain::decide(
            &step,
            step.approver_id,
            ApprovalDecision::Reject,
            &chain,
        ).unwrap();
        prop_assert_eq!(outcome, DecisionOutcome::RequestRejected);
    }
}
