//! Budget data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The monetary columns of a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetFigures {
    /// Envelope size.
    pub total: Decimal,
    /// Realized spend.
    pub spent: Decimal,
    /// Reserved by in-flight requests.
    pub committed: Decimal,
    /// Utilization percent at which alerts fire.
    pub alert_threshold: Decimal,
}

/// Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetStanding {
    /// `(spent + committed) / total * 100`, 2 decimals.
    pub utilization: Decimal,
    /// `total - spent - committed`; negative when over-committed.
    pub remaining: Decimal,
    /// `utilization >= alert_threshold`.
    pub is_over_threshold: bool,
}

/// Result of a commit/decommit/realize step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerUpdate {
    /// New committed amount.
    pub committed: Decimal,
    /// New spent amount.
    pub spent: Decimal,
    /// The committed amount would have gone negative and was floored at zero.
    pub clamped: bool,
}

/// Input for creating a budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBudget {
    /// Owning department.
    pub department: String,
    /// Fiscal year label, e.g. 2026.
    pub fiscal_year: i32,
    /// Optional quarter (1-4).
    pub quarter: Option<i32>,
    /// Envelope size.
    pub total_amount: Decimal,
    /// Alert threshold percent, defaults to 80.
    pub alert_threshold: Option<Decimal>,
    /// Budget manager, receives alerts.
    pub manager_id: Option<Uuid>,
}

/// Partial update of a budget.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetPatch {
    /// New envelope size.
    pub total_amount: Option<Decimal>,
    /// Spend correction.
    pub spent_amount: Option<Decimal>,
    /// Commitment correction.
    pub committed_amount: Option<Decimal>,
    /// New alert threshold.
    pub alert_threshold: Option<Decimal>,
    /// New manager.
    pub manager_id: Option<Uuid>,
}

impl BudgetPatch {
    /// Whether the patch changes any monetary field.
    #[must_use]
    pub fn touches_money(&self) -> bool {
        self.total_amount.is_some()
            || self.spent_amount.is_some()
            || self.committed_amount.is_some()
            || self.alert_threshold.is_some()
    }
}
