//! Approval errors.

use thiserror::Error;
use uuid::Uuid;

use procura_shared::AppError;

use super::types::ApprovalStatus;

/// Approval errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApprovalError {
    /// Only the assigned approver may decide.
    #[error("user {actor} is not the assigned approver")]
    NotAssignedApprover {
        /// Caller.
        actor: Uuid,
    },

    /// Step already decided.
    #[error("approval is {0}; expected PENDING")]
    AlreadyDecided(ApprovalStatus),

    /// An earlier step is still undecided.
    #[error("step {step} cannot be decided before step {waiting_on}")]
    OutOfTurn {
        /// Step the caller tried to decide.
        step: i32,
        /// Lowest step still pending.
        waiting_on: i32,
    },

    /// No approvers given.
    #[error("approval chain needs at least one approver")]
    EmptyChain,

    /// Same approver twice.
    #[error("approver {0} appears more than once")]
    DuplicateApprover(Uuid),
}

impl From<ApprovalError> for AppError {
    fn from(err: ApprovalError) -> Self {
        match err {
            ApprovalError::NotAssignedApprover { .. } => AppError::Unauthorized(err.to_string()),
            ApprovalError::AlreadyDecided(_) | ApprovalError::OutOfTurn { .. } => {
                AppError::InvalidTransition(err.to_string())
            }
            ApprovalError::EmptyChain | ApprovalError::DuplicateApprover(_) => {
                AppError::Validation(err.to_string())
            }
        }
    }
}
