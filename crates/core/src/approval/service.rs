//! Approval chain planning and decisions.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use super::error::ApprovalError;
use super::types::{
    ApprovalDecision, ApprovalStatus, ApprovalStep, ApproverSpec, DecisionOutcome, PlannedStep,
};

/// Stateless approval chain logic.
pub struct ApprovalChain;

impl ApprovalChain {
    /// Materializes every step, 1-indexed, all due `now + sla`.
    ///
    /// # Errors
    ///
    /// `EmptyChain` or `DuplicateApprover`.
    pub fn plan(
        approvers: &[ApproverSpec],
        now: DateTime<Utc>,
        sla: Duration,
    ) -> Result<Vec<PlannedStep>, ApprovalError> {
        if approvers.is_empty() {
            return Err(ApprovalError::EmptyChain);
        }
        let mut seen = HashSet::new();
        let due_at = now + sla;
        approvers
            .iter()
            .zip(1..)
            .map(|(spec, step)| {
                if !seen.insert(spec.user_id) {
                    return Err(ApprovalError::DuplicateApprover(spec.user_id));
                }
                Ok(PlannedStep {
                    step,
                    approver_id: spec.user_id,
                    role: spec.role,
                    threshold: spec.threshold,
                    due_at,
                })
            })
            .collect()
    }

    /// Decides one step.
    ///
    /// `chain` holds every step of the request. Steps are decided in order:
    /// only the lowest pending step may be decided, and the next step is the
    /// one at `step + 1` that is still PENDING. Later pending steps are left
    /// alone on rejection.
    ///
    /// # Errors
    ///
    /// `NotAssignedApprover` if `actor` is not the step's approver,
    /// `AlreadyDecided` if the step is no longer pending, `OutOfTurn` if an
    /// earlier step is still pending.
    pub fn decide(
        current: &ApprovalStep,
        actor: Uuid,
        decision: ApprovalDecision,
        chain: &[ApprovalStep],
    ) -> Result<DecisionOutcome, ApprovalError> {
        if current.approver_id != actor {
            return Err(ApprovalError::NotAssignedApprover { actor });
        }
        if current.status != ApprovalStatus::Pending {
            return Err(ApprovalError::AlreadyDecided(current.status));
        }
        if let Some(waiting_on) = chain
            .iter()
            .filter(|s| s.status == ApprovalStatus::Pending && s.step < current.step)
            .map(|s| s.step)
            .min()
        {
            return Err(ApprovalError::OutOfTurn {
                step: current.step,
                waiting_on,
            });
        }
        match decision {
            ApprovalDecision::Reject => Ok(DecisionOutcome::RequestRejected),
            ApprovalDecision::Approve => Ok(Self::next_pending(chain, current.step).map_or(
                DecisionOutcome::RequestApproved,
                |step| DecisionOutcome::NotifyNext { step },
            )),
        }
    }

    /// The step right after `step`, if it is still pending.
    #[must_use]
    pub fn next_pending(chain: &[ApprovalStep], step: i32) -> Option<ApprovalStep> {
        chain
            .iter()
            .find(|s| s.step == step + 1 && s.status == ApprovalStatus::Pending)
            .copied()
    }

    /// First step of a freshly planned chain.
    #[must_use]
    pub fn first(plan: &[PlannedStep]) -> Option<Uuid> {
        plan.iter().min_by_key(|s| s.step).map(|s| s.approver_id)
    }
}
