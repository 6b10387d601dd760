//! Deferred tasks.
//!
//! Delayed side effects are stored as rows with a due time and executed by
//! an explicit runner, never by an in-process timer.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Task lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Waiting for its due time.
    Pending,
    /// Ran successfully.
    Done,
    /// Ran and failed; `last_error` says why.
    Failed,
    /// Claimed but had nothing left to do.
    Skipped,
}

impl TaskStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "DONE" => Some(Self::Done),
            "FAILED" => Some(Self::Failed),
            "SKIPPED" => Some(Self::Skipped),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a task does, stored as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskKind {
    /// Simulated vendor reply to our opening offer.
    VendorCounterOffer {
        /// Negotiation to update.
        negotiation_id: Uuid,
        /// Our opening offer.
        opening_offer: Decimal,
        /// Quoted price.
        original_price: Decimal,
        /// Our target, recorded as our offer in the counter round.
        target_price: Decimal,
    },
}

impl TaskKind {
    /// Short name for logs and the `kind` column.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::VendorCounterOffer { .. } => "vendor_counter_offer",
        }
    }
}

/// Due time `delay_secs` after `now`.
#[must_use]
pub fn due_after(now: DateTime<Utc>, delay_secs: i64) -> DateTime<Utc> {
    now + Duration::seconds(delay_secs.max(0))
}
