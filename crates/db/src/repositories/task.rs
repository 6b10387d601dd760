//! Deferred task store and runner.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use procura_core::audit::{AuditAction, AuditEntity, AuditRecord};
use procura_core::negotiation::NegotiationTracker;
use procura_core::policy::{Actor, Capability};
use procura_core::tasks::{TaskKind, TaskStatus};
use procura_shared::{AppError, AppResult};

use super::audit::{append, snapshot};
use super::negotiation::{counter_in, find_negotiation};
use crate::context::EngineContext;
use crate::db_err;
use crate::entities::scheduled_tasks;

/// A task that failed during a run.
#[derive(Debug, Clone, Serialize)]
pub struct TaskFailure {
    /// Failed task.
    pub task_id: Uuid,
    /// Error message stored on the task.
    pub error: String,
}

/// Outcome of running due tasks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskReport {
    /// Tasks that completed.
    pub executed: usize,
    /// Tasks that had nothing left to do, e.g. a counter-offer on a closed
    /// negotiation.
    pub skipped: usize,
    /// Tasks that failed.
    pub failed: Vec<TaskFailure>,
}

pub(crate) async fn enqueue<C: ConnectionTrait>(
    conn: &C,
    kind: &TaskKind,
    due_at: DateTime<Utc>,
) -> AppResult<scheduled_tasks::Model> {
    let payload = serde_json::to_value(kind)
        .map_err(|e| AppError::Internal(format!("task payload: {e}")))?;
    let now = Utc::now();
    scheduled_tasks::ActiveModel {
        id: Set(Uuid::new_v4()),
        kind: Set(kind.name().to_string()),
        payload: Set(payload),
        status: Set(TaskStatus::Pending.as_str().to_string()),
        due_at: Set(due_at.into()),
        attempts: Set(0),
        last_error: Set(None),
        executed_at: Set(None),
        created_at: Set(now.into()),
    }
    .insert(conn)
    .await
    .map_err(db_err)
}

/// Deferred task repository.
#[derive(Debug, Clone)]
pub struct TaskRepository {
    ctx: EngineContext,
}

impl TaskRepository {
    /// Creates a new task repository.
    #[must_use]
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Pending tasks, oldest due first.
    ///
    /// # Errors
    ///
    /// `Forbidden` without the scheduler capability, or a database error.
    pub async fn pending(&self, actor: &Actor) -> AppResult<Vec<scheduled_tasks::Model>> {
        actor.require(Capability::RunScheduler)?;
        scheduled_tasks::Entity::find()
            .filter(scheduled_tasks::Column::Status.eq(TaskStatus::Pending.as_str()))
            .order_by_asc(scheduled_tasks::Column::DueAt)
            .all(&self.ctx.db)
            .await
            .map_err(db_err)
    }

    /// Runs every pending task due at or before `now`. One failing task does
    /// not stop the rest.
    ///
    /// # Errors
    ///
    /// `Forbidden` without the scheduler capability, or a database error
    /// while listing tasks.
    pub async fn run_due(&self, actor: &Actor, now: DateTime<Utc>) -> AppResult<TaskReport> {
        actor.require(Capability::RunScheduler)?;
        let due: Vec<_> = self
            .pending(actor)
            .await?
            .into_iter()
            .filter(|t| t.due_at <= now)
            .collect();

        let mut report = TaskReport::default();
        for task in due {
            match self.execute(actor, &task).await {
                Ok(TaskStatus::Skipped) => report.skipped += 1,
                Ok(_) => report.executed += 1,
                Err(e) => report.failed.push(TaskFailure {
                    task_id: task.id,
                    error: e.to_string(),
                }),
            }
        }
        tracing::info!(
            executed = report.executed,
            skipped = report.skipped,
            failed = report.failed.len(),
            "due tasks processed"
        );
        Ok(report)
    }

    /// Runs one pending task immediately, regardless of its due time.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition` if the task already ran, `Forbidden`,
    /// or the task's own error.
    pub async fn run_now(&self, actor: &Actor, task_id: Uuid) -> AppResult<scheduled_tasks::Model> {
        actor.require(Capability::RunScheduler)?;
        let task = self.find(task_id).await?;
        if task.status != TaskStatus::Pending.as_str() {
            return Err(AppError::InvalidTransition(format!(
                "task {task_id} is {}",
                task.status
            )));
        }
        self.execute(actor, &task).await?;
        self.find(task_id).await
    }

    async fn find(&self, task_id: Uuid) -> AppResult<scheduled_tasks::Model> {
        scheduled_tasks::Entity::find_by_id(task_id)
            .one(&self.ctx.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Task {task_id} not found")))
    }

    async fn execute(
        &self,
        actor: &Actor,
        task: &scheduled_tasks::Model,
    ) -> AppResult<TaskStatus> {
        let result = self.perform(actor, task).await;
        if let Err(e) = &result {
            tracing::error!(task_id = %task.id, kind = %task.kind, error = %e, "task failed");
            scheduled_tasks::Entity::update_many()
                .col_expr(
                    scheduled_tasks::Column::Status,
                    Expr::value(TaskStatus::Failed.as_str()),
                )
                .col_expr(
                    scheduled_tasks::Column::Attempts,
                    Expr::value(task.attempts + 1),
                )
                .col_expr(scheduled_tasks::Column::LastError, Expr::value(e.to_string()))
                .col_expr(scheduled_tasks::Column::ExecutedAt, Expr::value(Utc::now()))
                .filter(scheduled_tasks::Column::Id.eq(task.id))
                .filter(scheduled_tasks::Column::Status.eq(TaskStatus::Pending.as_str()))
                .exec(&self.ctx.db)
                .await
                .map_err(db_err)?;
        }
        result
    }

    /// Claims the task, runs it and records the task's own state change,
    /// all in one transaction. Returns the status the task finished in.
    async fn perform(
        &self,
        actor: &Actor,
        task: &scheduled_tasks::Model,
    ) -> AppResult<TaskStatus> {
        let kind: TaskKind = serde_json::from_value(task.payload.clone())
            .map_err(|e| AppError::Internal(format!("task payload: {e}")))?;

        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let claimed = scheduled_tasks::Entity::update_many()
            .col_expr(
                scheduled_tasks::Column::Status,
                Expr::value(TaskStatus::Done.as_str()),
            )
            .col_expr(
                scheduled_tasks::Column::Attempts,
                Expr::value(task.attempts + 1),
            )
            .col_expr(scheduled_tasks::Column::ExecutedAt, Expr::value(Utc::now()))
            .filter(scheduled_tasks::Column::Id.eq(task.id))
            .filter(scheduled_tasks::Column::Status.eq(TaskStatus::Pending.as_str()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if claimed.rows_affected == 0 {
            return Err(AppError::Conflict(format!(
                "task {} was claimed concurrently",
                task.id
            )));
        }

        let (outcome, request_id) = match kind {
            TaskKind::VendorCounterOffer {
                negotiation_id,
                opening_offer,
                original_price,
                target_price,
            } => {
                let negotiation = find_negotiation(&txn, negotiation_id).await?;
                if negotiation.status()?.is_live() {
                    let counter =
                        NegotiationTracker::simulated_counter(opening_offer, original_price);
                    let updated = counter_in(
                        &txn,
                        &negotiation,
                        counter,
                        Some(target_price),
                        format!("Vendor countered at {counter}"),
                    )
                    .await?;
                    append(
                        &txn,
                        AuditRecord::new(
                            AuditAction::Update,
                            AuditEntity::Negotiation,
                            negotiation_id,
                        )
                        .by(actor.id, &actor.metadata)
                        .for_request(updated.request_id)
                        .snapshots(snapshot(&negotiation), snapshot(&updated)),
                    )
                    .await?;
                    (TaskStatus::Done, negotiation.request_id)
                } else {
                    tracing::debug!(
                        task_id = %task.id,
                        negotiation_id = %negotiation_id,
                        status = %negotiation.status,
                        "negotiation already closed, counter-offer skipped"
                    );
                    (TaskStatus::Skipped, negotiation.request_id)
                }
            }
        };

        if outcome == TaskStatus::Skipped {
            scheduled_tasks::Entity::update_many()
                .col_expr(
                    scheduled_tasks::Column::Status,
                    Expr::value(TaskStatus::Skipped.as_str()),
                )
                .filter(scheduled_tasks::Column::Id.eq(task.id))
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }
        let finished = scheduled_tasks::Entity::find_by_id(task.id)
            .one(&txn)
            .await
            .map_err(db_err)?;
        append(
            &txn,
            AuditRecord::new(AuditAction::StatusChange, AuditEntity::Task, task.id)
                .by(actor.id, &actor.metadata)
                .for_request(request_id)
                .snapshots(snapshot(task), finished.as_ref().and_then(snapshot)),
        )
        .await?;

        txn.commit().await.map_err(db_err)?;
        tracing::debug!(task_id = %task.id, kind = %task.kind, status = %outcome, "task executed");
        Ok(outcome)
    }
}
