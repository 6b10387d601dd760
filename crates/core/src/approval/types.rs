//! Approval domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::policy::Role;

/// Status of one approval step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    /// Awaiting decision.
    Pending,
    /// Approved.
    Approved,
    /// Rejected.
    Rejected,
}

impl ApprovalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Approver's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    /// Approve the step.
    Approve,
    /// Reject the step and the request.
    Reject,
}

impl ApprovalDecision {
    /// Resulting step status.
    #[must_use]
    pub const fn status(self) -> ApprovalStatus {
        match self {
            Self::Approve => ApprovalStatus::Approved,
            Self::Reject => ApprovalStatus::Rejected,
        }
    }
}

/// One entry of the approver sequence given to `createChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproverSpec {
    /// Approver user id.
    pub user_id: Uuid,
    /// Role the approver acts in.
    pub role: Role,
    /// Monetary threshold this step covers, informational.
    #[serde(default)]
    pub threshold: Option<Decimal>,
}

/// A step to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    /// 1-indexed position.
    pub step: i32,
    /// Assigned approver.
    pub approver_id: Uuid,
    /// Role.
    pub role: Role,
    /// Threshold.
    pub threshold: Option<Decimal>,
    /// `now + SLA`.
    pub due_at: DateTime<Utc>,
}

/// A persisted step, as far as decisions care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalStep {
    /// Step id.
    pub id: Uuid,
    /// 1-indexed position.
    pub step: i32,
    /// Assigned approver.
    pub approver_id: Uuid,
    /// Current status.
    pub status: ApprovalStatus,
}

/// What a decision means for the rest of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// Approved, and another step is waiting: notify it.
    NotifyNext {
        /// Next step.
        step: ApprovalStep,
    },
    /// Last step approved: request becomes APPROVED.
    RequestApproved,
    /// Step rejected: request becomes REJECTED.
    RequestRejected,
}
