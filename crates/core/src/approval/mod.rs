//! Multi-step approval chains.
//!
//! A chain is fully materialized when created; only the first approver is
//! notified up front and each approval wakes the next step.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::ApprovalError;
pub use service::ApprovalChain;
pub use types::{
    ApprovalDecision, ApprovalStatus, ApprovalStep, ApproverSpec, DecisionOutcome, PlannedStep,
};
