//! Budget repository: envelope CRUD and the commitment ledger.
//!
//! Ledger steps run on the caller's transaction so a budget change and the
//! request change that caused it commit together.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use procura_core::audit::{AuditAction, AuditEntity, AuditRecord};
use procura_core::budget::service::DEFAULT_ALERT_THRESHOLD;
use procura_core::budget::{BudgetPatch, BudgetService, BudgetStanding, NewBudget};
use procura_core::notification::{Notification, NotificationKind};
use procura_core::policy::{Actor, Capability, Policy};
use procura_shared::{AppError, AppResult};

use super::audit::{append, snapshot};
use crate::context::EngineContext;
use crate::db_err;
use crate::entities::budgets;

/// A ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerStep {
    /// Reserve an amount.
    Commit,
    /// Release a reservation.
    Decommit,
    /// Move a reservation to spent.
    Realize,
}

impl LedgerStep {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Decommit => "decommit",
            Self::Realize => "realize",
        }
    }
}

/// A budget with its derived figures.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetView {
    /// Stored row.
    #[serde(flatten)]
    pub budget: budgets::Model,
    /// Computed on read.
    #[serde(flatten)]
    pub standing: BudgetStanding,
}

impl From<budgets::Model> for BudgetView {
    fn from(budget: budgets::Model) -> Self {
        let standing = BudgetService::standing(&budget.figures());
        Self { budget, standing }
    }
}

pub(crate) async fn find_budget<C: ConnectionTrait>(
    conn: &C,
    budget_id: Uuid,
) -> AppResult<budgets::Model> {
    budgets::Entity::find_by_id(budget_id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("Budget {budget_id} not found")))
}

/// Applies one ledger step on `conn`.
///
/// Returns the alert to send once the surrounding transaction commits, if
/// the budget ends up at or above its threshold.
pub(crate) async fn post<C: ConnectionTrait>(
    conn: &C,
    budget_id: Uuid,
    step: LedgerStep,
    amount: Decimal,
) -> AppResult<Option<Notification>> {
    let budget = budgets::Entity::find_by_id(budget_id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("Budget {budget_id} not found")))?;

    let figures = budget.figures();
    let update = match step {
        LedgerStep::Commit => BudgetService::commit(&figures, amount)?,
        LedgerStep::Decommit => BudgetService::decommit(&figures, amount)?,
        LedgerStep::Realize => BudgetService::realize(&figures, amount)?,
    };
    if update.clamped {
        tracing::warn!(
            budget_id = %budget_id,
            step = step.as_str(),
            %amount,
            committed = %figures.committed,
            "committed amount floored at zero"
        );
    }

    let mut active: budgets::ActiveModel = budget.into();
    active.committed_amount = Set(update.committed);
    active.spent_amount = Set(update.spent);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(conn).await.map_err(db_err)?;

    tracing::debug!(
        budget_id = %budget_id,
        step = step.as_str(),
        %amount,
        committed = %updated.committed_amount,
        spent = %updated.spent_amount,
        "ledger step"
    );

    Ok(threshold_alert(&updated))
}

/// Alert for the budget manager when the budget is over its threshold.
pub(crate) fn threshold_alert(budget: &budgets::Model) -> Option<Notification> {
    let standing = BudgetService::standing(&budget.figures());
    if !standing.is_over_threshold {
        return None;
    }
    let Some(manager_id) = budget.manager_id else {
        tracing::debug!(budget_id = %budget.id, "budget over threshold without a manager");
        return None;
    };
    Some(
        Notification::new(
            manager_id,
            NotificationKind::BudgetAlert,
            "Budget Alert",
            format!(
                "{} budget for FY{} is at {}% utilization (threshold {}%)",
                budget.department,
                budget.fiscal_year,
                standing.utilization,
                budget.alert_threshold.normalize()
            ),
        )
        .with_link(format!("/budgets/{}", budget.id)),
    )
}

/// Budget repository.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    ctx: EngineContext,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Creates a budget envelope.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the actor may manage budgets, `Validation` for bad
    /// input, or a database error.
    pub async fn create(&self, actor: &Actor, input: NewBudget) -> AppResult<BudgetView> {
        actor.require(Capability::ManageBudgets)?;
        BudgetService::validate_new(&input)?;

        let now = Utc::now();
        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let budget = budgets::ActiveModel {
            id: Set(Uuid::new_v4()),
            department: Set(input.department.trim().to_string()),
            fiscal_year: Set(input.fiscal_year),
            quarter: Set(input.quarter),
            total_amount: Set(input.total_amount),
            spent_amount: Set(Decimal::ZERO),
            committed_amount: Set(Decimal::ZERO),
            alert_threshold: Set(input.alert_threshold.unwrap_or(DEFAULT_ALERT_THRESHOLD)),
            manager_id: Set(input.manager_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        append(
            &txn,
            AuditRecord::new(AuditAction::Create, AuditEntity::Budget, budget.id)
                .by(actor.id, &actor.metadata)
                .snapshots(None, snapshot(&budget)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(budget_id = %budget.id, department = %budget.department, "budget created");
        Ok(budget.into())
    }

    /// Updates a budget.
    ///
    /// Monetary fields need the budget capability; the current manager may
    /// hand the budget over to someone else.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `NotFound`, `Validation`, or a database error.
    pub async fn update(
        &self,
        actor: &Actor,
        budget_id: Uuid,
        patch: BudgetPatch,
    ) -> AppResult<BudgetView> {
        BudgetService::validate_patch(&patch)?;

        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let budget = find_budget(&txn, budget_id).await?;
        if patch.touches_money() || budget.manager_id != Some(actor.id) {
            actor.require(Capability::ManageBudgets)?;
        }

        let before = snapshot(&budget);
        let mut active: budgets::ActiveModel = budget.into();
        if let Some(total) = patch.total_amount {
            active.total_amount = Set(total);
        }
        if let Some(spent) = patch.spent_amount {
            active.spent_amount = Set(spent);
        }
        if let Some(committed) = patch.committed_amount {
            active.committed_amount = Set(committed);
        }
        if let Some(threshold) = patch.alert_threshold {
            active.alert_threshold = Set(threshold);
        }
        if let Some(manager_id) = patch.manager_id {
            active.manager_id = Set(Some(manager_id));
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(db_err)?;

        append(
            &txn,
            AuditRecord::new(AuditAction::Update, AuditEntity::Budget, budget_id)
                .by(actor.id, &actor.metadata)
                .snapshots(before, snapshot(&updated)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(budget_id = %budget_id, "budget updated");
        self.ctx
            .dispatch(threshold_alert(&updated).into_iter().collect())
            .await;
        Ok(updated.into())
    }

    /// Reads a budget with utilization computed now.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden` for another department's budget, or a
    /// database error.
    pub async fn get(&self, actor: &Actor, budget_id: Uuid) -> AppResult<BudgetView> {
        let budget = find_budget(&self.ctx.db, budget_id).await?;
        if !Policy::allows(actor.role, Capability::ViewAllBudgets)
            && actor.department.as_deref() != Some(budget.department.as_str())
        {
            return Err(AppError::Forbidden(format!(
                "budget {budget_id} belongs to another department"
            )));
        }
        Ok(budget.into())
    }

    /// Lists budgets. Roles without the view-all capability only see their
    /// own department.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list(
        &self,
        actor: &Actor,
        department: Option<String>,
    ) -> AppResult<Vec<BudgetView>> {
        let department = if Policy::allows(actor.role, Capability::ViewAllBudgets) {
            department
        } else {
            match &actor.department {
                Some(own) => Some(own.clone()),
                None => return Ok(Vec::new()),
            }
        };

        let mut query = budgets::Entity::find();
        if let Some(department) = department {
            query = query.filter(budgets::Column::Department.eq(department));
        }
        let rows = query
            .order_by_desc(budgets::Column::FiscalYear)
            .order_by_asc(budgets::Column::Department)
            .all(&self.ctx.db)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(BudgetView::from).collect())
    }

    /// Reserves `amount` on a budget.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `NotFound`, `Validation` for a negative amount, or a
    /// database error.
    pub async fn commit(
        &self,
        actor: &Actor,
        budget_id: Uuid,
        amount: Decimal,
    ) -> AppResult<BudgetView> {
        self.step(actor, budget_id, LedgerStep::Commit, amount).await
    }

    /// Releases `amount`, flooring the commitment at zero.
    ///
    /// # Errors
    ///
    /// Same as [`Self::commit`].
    pub async fn decommit(
        &self,
        actor: &Actor,
        budget_id: Uuid,
        amount: Decimal,
    ) -> AppResult<BudgetView> {
        self.step(actor, budget_id, LedgerStep::Decommit, amount).await
    }

    /// Moves `amount` from committed to spent.
    ///
    /// # Errors
    ///
    /// Same as [`Self::commit`].
    pub async fn realize(
        &self,
        actor: &Actor,
        budget_id: Uuid,
        amount: Decimal,
    ) -> AppResult<BudgetView> {
        self.step(actor, budget_id, LedgerStep::Realize, amount).await
    }

    async fn step(
        &self,
        actor: &Actor,
        budget_id: Uuid,
        step: LedgerStep,
        amount: Decimal,
    ) -> AppResult<BudgetView> {
        actor.require(Capability::ManageBudgets)?;

        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let before = snapshot(&find_budget(&txn, budget_id).await?);
        let alert = post(&txn, budget_id, step, amount).await?;
        let updated = find_budget(&txn, budget_id).await?;
        append(
            &txn,
            AuditRecord::new(AuditAction::Update, AuditEntity::Budget, budget_id)
                .by(actor.id, &actor.metadata)
                .snapshots(before, snapshot(&updated)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        self.ctx.dispatch(alert.into_iter().collect()).await;
        Ok(updated.into())
    }
}
