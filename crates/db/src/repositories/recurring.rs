//! Recurring schedules: attach to a template request and spawn copies when
//! due.

use chrono::{DateTime, Datelike, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use procura_core::audit::{AuditAction, AuditEntity, AuditRecord};
use procura_core::notification::{Notification, NotificationKind};
use procura_core::policy::{Actor, Capability};
use procura_core::recurring::{RecurringScheduler, ScheduleParams, SchedulePatch};
use procura_core::request::{NewRequest, Urgency};
use procura_shared::{AppError, AppResult};

use super::audit::{append, snapshot};
use super::request::{insert_draft, load_request, swap_request};
use crate::context::EngineContext;
use crate::db_err;
use crate::entities::{recurring_schedules, requests};

/// A schedule that failed during a tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickFailure {
    /// Failed schedule.
    pub schedule_id: Uuid,
    /// Error message.
    pub error: String,
}

/// Outcome of one scheduler tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickReport {
    /// Schedules that spawned a request.
    pub processed: usize,
    /// Schedules that failed; the rest still ran.
    pub failed: Vec<TickFailure>,
}

fn to_i32(value: u32) -> AppResult<i32> {
    i32::try_from(value).map_err(|_| AppError::Validation(format!("{value} is out of range")))
}

fn to_u32(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(1)
}

async fn find_schedule<C: ConnectionTrait>(
    conn: &C,
    schedule_id: Uuid,
) -> AppResult<recurring_schedules::Model> {
    recurring_schedules::Entity::find_by_id(schedule_id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("Recurring schedule {schedule_id} not found")))
}

/// Marks the template request recurring or not, with a version check.
async fn flag_template<C: ConnectionTrait>(
    conn: &C,
    request: &requests::Model,
    is_recurring: bool,
) -> AppResult<requests::Model> {
    swap_request(
        conn,
        request,
        None,
        requests::ActiveModel {
            is_recurring: Set(is_recurring),
            ..Default::default()
        },
    )
    .await
}

/// Recurring schedule repository.
#[derive(Debug, Clone)]
pub struct RecurringRepository {
    ctx: EngineContext,
}

impl RecurringRepository {
    /// Creates a new recurring repository.
    #[must_use]
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Attaches a schedule to a template request; the first run is due at
    /// `start_date`.
    ///
    /// # Errors
    ///
    /// `Validation` for bad parameters or a request that already has a
    /// schedule, `NotFound`, `Forbidden`, or a database error.
    pub async fn attach(
        &self,
        actor: &Actor,
        request_id: Uuid,
        params: ScheduleParams,
    ) -> AppResult<recurring_schedules::Model> {
        RecurringScheduler::validate(&params)?;

        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let request = load_request(&txn, request_id).await?;
        actor.require_owner_or(request.owner_id)?;
        let existing = recurring_schedules::Entity::find()
            .filter(recurring_schedules::Column::RequestId.eq(request_id))
            .one(&txn)
            .await
            .map_err(db_err)?;
        if existing.is_some() {
            return Err(AppError::Validation(format!(
                "request {request_id} already has a recurring schedule"
            )));
        }

        let now = Utc::now();
        let schedule = recurring_schedules::ActiveModel {
            id: Set(Uuid::new_v4()),
            request_id: Set(request_id),
            frequency: Set(params.frequency.as_str().to_string()),
            interval: Set(to_i32(params.interval)?),
            day_of_week: Set(params.day_of_week.map(to_i32).transpose()?),
            day_of_month: Set(params.day_of_month.map(to_i32).transpose()?),
            start_date: Set(params.start_date.into()),
            end_date: Set(params.end_date.map(Into::into)),
            last_run_date: Set(None),
            next_run_date: Set(params.start_date.into()),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;
        flag_template(&txn, &request, true).await?;

        append(
            &txn,
            AuditRecord::new(AuditAction::Create, AuditEntity::RecurringSchedule, schedule.id)
                .by(actor.id, &actor.metadata)
                .for_request(request_id)
                .snapshots(None, snapshot(&schedule)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            schedule_id = %schedule.id,
            request_id = %request_id,
            frequency = %params.frequency,
            "recurring schedule attached"
        );
        Ok(schedule)
    }

    /// Stops a schedule from running.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, or a database error.
    pub async fn pause(&self, actor: &Actor, schedule_id: Uuid) -> AppResult<recurring_schedules::Model> {
        self.set_active(actor, schedule_id, false).await
    }

    /// Lets a paused schedule run again.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, or a database error.
    pub async fn resume(&self, actor: &Actor, schedule_id: Uuid) -> AppResult<recurring_schedules::Model> {
        self.set_active(actor, schedule_id, true).await
    }

    async fn set_active(
        &self,
        actor: &Actor,
        schedule_id: Uuid,
        is_active: bool,
    ) -> AppResult<recurring_schedules::Model> {
        self.modify(actor, schedule_id, |schedule, changes| {
            if schedule.is_active != is_active {
                changes.is_active = Set(is_active);
            }
            Ok(())
        })
        .await
    }

    /// Changes frequency, interval, anchors or end date. The next run date
    /// is kept.
    ///
    /// # Errors
    ///
    /// `Validation` for bad values, `NotFound`, `Forbidden`, or a database
    /// error.
    pub async fn update(
        &self,
        actor: &Actor,
        schedule_id: Uuid,
        patch: SchedulePatch,
    ) -> AppResult<recurring_schedules::Model> {
        self.modify(actor, schedule_id, |schedule, changes| {
            RecurringScheduler::validate_patch(&patch, schedule.start_date.with_timezone(&Utc))?;
            if let Some(frequency) = patch.frequency {
                changes.frequency = Set(frequency.as_str().to_string());
            }
            if let Some(interval) = patch.interval {
                changes.interval = Set(to_i32(interval)?);
            }
            if let Some(day) = patch.day_of_week {
                changes.day_of_week = Set(Some(to_i32(day)?));
            }
            if let Some(day) = patch.day_of_month {
                changes.day_of_month = Set(Some(to_i32(day)?));
            }
            if let Some(end) = patch.end_date {
                changes.end_date = Set(Some(end.into()));
            }
            Ok(())
        })
        .await
    }

    async fn modify<F>(
        &self,
        actor: &Actor,
        schedule_id: Uuid,
        apply: F,
    ) -> AppResult<recurring_schedules::Model>
    where
        F: FnOnce(&recurring_schedules::Model, &mut recurring_schedules::ActiveModel) -> AppResult<()>,
    {
        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let schedule = find_schedule(&txn, schedule_id).await?;
        let request = load_request(&txn, schedule.request_id).await?;
        actor.require_owner_or(request.owner_id)?;

        let mut changes: recurring_schedules::ActiveModel = schedule.clone().into();
        apply(&schedule, &mut changes)?;
        changes.updated_at = Set(Utc::now().into());
        let updated = changes.update(&txn).await.map_err(db_err)?;

        append(
            &txn,
            AuditRecord::new(AuditAction::Update, AuditEntity::RecurringSchedule, schedule_id)
                .by(actor.id, &actor.metadata)
                .for_request(schedule.request_id)
                .snapshots(snapshot(&schedule), snapshot(&updated)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    /// Removes a schedule and clears the template's recurring flag.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, `Conflict`, or a database error.
    pub async fn delete(&self, actor: &Actor, schedule_id: Uuid) -> AppResult<()> {
        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let schedule = find_schedule(&txn, schedule_id).await?;
        let request = load_request(&txn, schedule.request_id).await?;
        actor.require_owner_or(request.owner_id)?;

        recurring_schedules::Entity::delete_by_id(schedule_id)
            .exec(&txn)
            .await
            .map_err(db_err)?;
        flag_template(&txn, &request, false).await?;

        append(
            &txn,
            AuditRecord::new(AuditAction::Delete, AuditEntity::RecurringSchedule, schedule_id)
                .by(actor.id, &actor.metadata)
                .for_request(schedule.request_id)
                .snapshots(snapshot(&schedule), None),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(schedule_id = %schedule_id, "recurring schedule deleted");
        Ok(())
    }

    /// Spawns a request for every active schedule due at `now`.
    ///
    /// Each schedule runs in its own transaction; a failure is logged and
    /// reported without stopping the others.
    ///
    /// # Errors
    ///
    /// `Forbidden` without `RunScheduler`, or a database error while listing
    /// schedules.
    pub async fn tick(&self, actor: &Actor, now: DateTime<Utc>) -> AppResult<TickReport> {
        actor.require(Capability::RunScheduler)?;
        let due: Vec<_> = recurring_schedules::Entity::find()
            .filter(recurring_schedules::Column::IsActive.eq(true))
            .order_by_asc(recurring_schedules::Column::NextRunDate)
            .all(&self.ctx.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .filter(|s| {
                RecurringScheduler::is_due(
                    s.is_active,
                    s.next_run_date.with_timezone(&Utc),
                    s.end_date.map(|d| d.with_timezone(&Utc)),
                    now,
                )
            })
            .collect();

        let mut report = TickReport::default();
        for schedule in due {
            match self.spawn(actor, &schedule, now).await {
                Ok(child) => {
                    report.processed += 1;
                    tracing::info!(
                        schedule_id = %schedule.id,
                        template_id = %schedule.request_id,
                        request_id = %child.id,
                        "recurring request spawned"
                    );
                }
                Err(e) => {
                    tracing::error!(schedule_id = %schedule.id, error = %e, "recurring schedule failed");
                    report.failed.push(TickFailure {
                        schedule_id: schedule.id,
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    async fn spawn(
        &self,
        actor: &Actor,
        schedule: &recurring_schedules::Model,
        now: DateTime<Utc>,
    ) -> AppResult<requests::Model> {
        let anchor_day = schedule
            .day_of_month
            .map_or_else(|| schedule.start_date.day(), to_u32);
        let next = RecurringScheduler::advance(
            schedule.next_run_date.with_timezone(&Utc),
            schedule.frequency()?,
            to_u32(schedule.interval),
            Some(anchor_day),
        )?;

        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let claimed = recurring_schedules::Entity::update_many()
            .set(recurring_schedules::ActiveModel {
                next_run_date: Set(next.into()),
                last_run_date: Set(Some(now.into())),
                updated_at: Set(now.into()),
                ..Default::default()
            })
            .filter(recurring_schedules::Column::Id.eq(schedule.id))
            .filter(recurring_schedules::Column::NextRunDate.eq(schedule.next_run_date))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if claimed.rows_affected == 0 {
            return Err(AppError::Conflict(format!(
                "schedule {} already ran",
                schedule.id
            )));
        }

        let template = load_request(&txn, schedule.request_id).await?;
        let input = NewRequest {
            title: template.title.clone(),
            category: template.category.clone(),
            description: template.description.clone(),
            quantity: template.quantity,
            specifications: template.specifications.clone(),
            budget_estimate: template.budget_estimate,
            urgency: Urgency::parse(&template.urgency),
            delivery_location: template.delivery_location.clone(),
            budget_id: None,
        };
        let mut outbox = Vec::new();
        let child = insert_draft(
            &txn,
            &self.ctx.settings,
            template.owner_id,
            &input,
            Some(template.id),
            &mut outbox,
        )
        .await?;

        append(
            &txn,
            AuditRecord::new(AuditAction::Spawn, AuditEntity::Request, child.id)
                .by(actor.id, &actor.metadata)
                .for_request(template.id)
                .snapshots(None, snapshot(&child)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        outbox.push(
            Notification::new(
                template.owner_id,
                NotificationKind::RecurringOrder,
                format!("Recurring order {}", child.request_number),
                format!(
                    "A new request was created from {}; next run {}",
                    template.request_number,
                    next.format("%Y-%m-%d")
                ),
            )
            .with_link(format!("/requests/{}", child.id)),
        );
        self.ctx.dispatch(outbox).await;
        Ok(child)
    }
}
