//! Negotiation repository: rounds, acceptance and savings reporting.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use procura_core::analytics::SpendScope;
use procura_core::audit::{AuditAction, AuditEntity, AuditRecord};
use procura_core::negotiation::{
    NegotiationStatus, NegotiationTracker, RoundPlan, SavingsSummary,
};
use procura_core::policy::Actor;
use procura_core::tasks::{TaskKind, due_after};
use procura_shared::{AppError, AppResult, ProcurementConfig};

use super::analytics::scoped_savings;
use super::audit::{append, snapshot};
use super::request::load_request;
use super::task::enqueue;
use crate::context::EngineContext;
use crate::db_err;
use crate::entities::{negotiation_rounds, negotiations, quotes};

/// A negotiation with its rounds in order.
#[derive(Debug, Clone, Serialize)]
pub struct NegotiationDetail {
    /// Negotiation row.
    #[serde(flatten)]
    pub negotiation: negotiations::Model,
    /// Rounds by ascending round number.
    pub rounds: Vec<negotiation_rounds::Model>,
}

pub(crate) async fn find_negotiation<C: ConnectionTrait>(
    conn: &C,
    negotiation_id: Uuid,
) -> AppResult<negotiations::Model> {
    negotiations::Entity::find_by_id(negotiation_id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("Negotiation {negotiation_id} not found")))
}

/// The request's live negotiation, or the most recent one.
pub(crate) async fn latest_negotiation<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
) -> AppResult<Option<negotiations::Model>> {
    let all = negotiations::Entity::find()
        .filter(negotiations::Column::RequestId.eq(request_id))
        .order_by_desc(negotiations::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(db_err)?;
    let live = all
        .iter()
        .position(|n| n.status().is_ok_and(|s| s.is_live()))
        .unwrap_or(0);
    Ok(all.into_iter().nth(live))
}

async fn insert_round<C: ConnectionTrait>(
    conn: &C,
    negotiation_id: Uuid,
    plan: RoundPlan,
    now: DateTime<Utc>,
) -> AppResult<negotiation_rounds::Model> {
    negotiation_rounds::ActiveModel {
        id: Set(Uuid::new_v4()),
        negotiation_id: Set(negotiation_id),
        round: Set(plan.round),
        our_offer: Set(plan.our_offer),
        vendor_response: Set(plan.vendor_response),
        status: Set(plan.status.as_str().to_string()),
        message: Set(plan.message),
        created_at: Set(now.into()),
    }
    .insert(conn)
    .await
    .map_err(db_err)
}

/// Opens a negotiation on `quote` with the default strategy and schedules
/// the simulated vendor counter-offer.
pub(crate) async fn open_in<C: ConnectionTrait>(
    conn: &C,
    actor: &Actor,
    quote: &quotes::Model,
    settings: &ProcurementConfig,
    now: DateTime<Utc>,
) -> AppResult<negotiations::Model> {
    let strategy = NegotiationTracker::default_strategy(quote.total_price);
    let plan = NegotiationTracker::open(quote.total_price, strategy)?;

    let negotiation = negotiations::ActiveModel {
        id: Set(Uuid::new_v4()),
        request_id: Set(quote.request_id),
        quote_id: Set(quote.id),
        vendor_id: Set(quote.vendor_id),
        original_price: Set(plan.original_price),
        current_price: Set(plan.current_price),
        target_price: Set(plan.target_price),
        status: Set(NegotiationStatus::Open.as_str().to_string()),
        completed_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await
    .map_err(db_err)?;
    insert_round(conn, negotiation.id, plan.first_round, now).await?;
    append(
        conn,
        AuditRecord::new(AuditAction::Create, AuditEntity::Negotiation, negotiation.id)
            .by(actor.id, &actor.metadata)
            .for_request(negotiation.request_id)
            .snapshots(None, snapshot(&negotiation)),
    )
    .await?;

    enqueue(
        conn,
        &TaskKind::VendorCounterOffer {
            negotiation_id: negotiation.id,
            opening_offer: strategy.opening_offer,
            original_price: plan.original_price,
            target_price: plan.target_price,
        },
        due_after(now, settings.counter_offer_delay_secs),
    )
    .await?;

    Ok(negotiation)
}

/// Writes `changes` if the negotiation is still in the status it was read in.
async fn swap_negotiation<C: ConnectionTrait>(
    conn: &C,
    current: &negotiations::Model,
    mut changes: negotiations::ActiveModel,
) -> AppResult<negotiations::Model> {
    changes.updated_at = Set(Utc::now().into());
    let result = negotiations::Entity::update_many()
        .set(changes)
        .filter(negotiations::Column::Id.eq(current.id))
        .filter(negotiations::Column::Status.eq(current.status.as_str()))
        .exec(conn)
        .await
        .map_err(db_err)?;
    if result.rows_affected == 0 {
        return Err(AppError::Conflict(format!(
            "negotiation {} was modified concurrently",
            current.id
        )));
    }
    find_negotiation(conn, current.id).await
}

/// Appends a vendor counter round and moves `current_price`.
pub(crate) async fn counter_in<C: ConnectionTrait>(
    conn: &C,
    negotiation: &negotiations::Model,
    vendor_counter: Decimal,
    our_offer: Option<Decimal>,
    message: String,
) -> AppResult<negotiations::Model> {
    let max_round = negotiation_rounds::Entity::find()
        .filter(negotiation_rounds::Column::NegotiationId.eq(negotiation.id))
        .order_by_desc(negotiation_rounds::Column::Round)
        .one(conn)
        .await
        .map_err(db_err)?
        .map_or(0, |r| r.round);

    let plan = NegotiationTracker::record_counter(
        negotiation.status()?,
        max_round,
        vendor_counter,
        our_offer,
        message,
    )?;
    insert_round(conn, negotiation.id, plan.round, Utc::now()).await?;

    swap_negotiation(
        conn,
        negotiation,
        negotiations::ActiveModel {
            current_price: Set(plan.current_price),
            status: Set(NegotiationStatus::Countered.as_str().to_string()),
            ..Default::default()
        },
    )
    .await
}

/// Closes a live negotiation as accepted or rejected.
pub(crate) async fn close_in<C: ConnectionTrait>(
    conn: &C,
    negotiation: &negotiations::Model,
    accept: bool,
    now: DateTime<Utc>,
) -> AppResult<negotiations::Model> {
    let current = negotiation.status()?;
    let next = if accept {
        NegotiationTracker::accept(current)?
    } else {
        NegotiationTracker::reject(current)?
    };
    swap_negotiation(
        conn,
        negotiation,
        negotiations::ActiveModel {
            status: Set(next.as_str().to_string()),
            completed_at: Set(Some(now.into())),
            ..Default::default()
        },
    )
    .await
}

/// Negotiation repository.
#[derive(Debug, Clone)]
pub struct NegotiationRepository {
    ctx: EngineContext,
}

impl NegotiationRepository {
    /// Creates a new negotiation repository.
    #[must_use]
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Reads a negotiation and its rounds.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden` for someone else's request, or a database
    /// error.
    pub async fn get(&self, actor: &Actor, negotiation_id: Uuid) -> AppResult<NegotiationDetail> {
        let negotiation = negotiations::Entity::find_by_id(negotiation_id)
            .one(&self.ctx.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Negotiation {negotiation_id} not found")))?;
        let request = load_request(&self.ctx.db, negotiation.request_id).await?;
        actor.require_owner_or(request.owner_id)?;
        self.detail(negotiation).await
    }

    /// Records a vendor counter-offer as a new round.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` once the negotiation is closed, `Validation` for a
    /// non-positive price, `NotFound`, `Forbidden`, or a database error.
    pub async fn record_counter(
        &self,
        actor: &Actor,
        negotiation_id: Uuid,
        vendor_counter: Decimal,
        our_offer: Option<Decimal>,
        message: Option<String>,
    ) -> AppResult<NegotiationDetail> {
        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let negotiation = find_negotiation(&txn, negotiation_id).await?;
        let request = load_request(&txn, negotiation.request_id).await?;
        actor.require_owner_or(request.owner_id)?;

        let message = message.unwrap_or_else(|| format!("Vendor countered at {vendor_counter}"));
        let updated = counter_in(&txn, &negotiation, vendor_counter, our_offer, message).await?;
        append(
            &txn,
            AuditRecord::new(AuditAction::Update, AuditEntity::Negotiation, negotiation_id)
                .by(actor.id, &actor.metadata)
                .for_request(request.id)
                .snapshots(snapshot(&negotiation), snapshot(&updated)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            negotiation_id = %negotiation_id,
            current_price = %updated.current_price,
            "counter-offer recorded"
        );
        self.detail(updated).await
    }

    /// Accepts the negotiation at its current price.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` once closed, `NotFound`, `Forbidden`, or a
    /// database error.
    pub async fn accept(&self, actor: &Actor, negotiation_id: Uuid) -> AppResult<NegotiationDetail> {
        self.close(actor, negotiation_id, true).await
    }

    /// Abandons the negotiation.
    ///
    /// # Errors
    ///
    /// Same as [`Self::accept`].
    pub async fn reject(&self, actor: &Actor, negotiation_id: Uuid) -> AppResult<NegotiationDetail> {
        self.close(actor, negotiation_id, false).await
    }

    async fn close(
        &self,
        actor: &Actor,
        negotiation_id: Uuid,
        accept: bool,
    ) -> AppResult<NegotiationDetail> {
        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let negotiation = find_negotiation(&txn, negotiation_id).await?;
        let request = load_request(&txn, negotiation.request_id).await?;
        actor.require_owner_or(request.owner_id)?;

        let updated = close_in(&txn, &negotiation, accept, Utc::now()).await?;
        append(
            &txn,
            AuditRecord::new(AuditAction::StatusChange, AuditEntity::Negotiation, negotiation_id)
                .by(actor.id, &actor.metadata)
                .for_request(request.id)
                .snapshots(snapshot(&negotiation), snapshot(&updated)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            negotiation_id = %negotiation_id,
            status = %updated.status,
            final_price = %updated.current_price,
            "negotiation closed"
        );
        self.detail(updated).await
    }

    /// Savings over accepted negotiations, averaged per negotiation. Callers
    /// without the all-spend capability see only their own requests.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn savings_summary(&self, actor: &Actor) -> AppResult<SavingsSummary> {
        scoped_savings(&self.ctx.db, SpendScope::for_actor(actor)).await
    }

    async fn detail(&self, negotiation: negotiations::Model) -> AppResult<NegotiationDetail> {
        let rounds = negotiation_rounds::Entity::find()
            .filter(negotiation_rounds::Column::NegotiationId.eq(negotiation.id))
            .order_by_asc(negotiation_rounds::Column::Round)
            .all(&self.ctx.db)
            .await
            .map_err(db_err)?;
        Ok(NegotiationDetail {
            negotiation,
            rounds,
        })
    }
}

/// Marks every live negotiation of a request rejected; used when a new one
/// supersedes it.
pub(crate) async fn supersede_in<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<u64> {
    let result = negotiations::Entity::update_many()
        .col_expr(
            negotiations::Column::Status,
            Expr::value(NegotiationStatus::Rejected.as_str()),
        )
        .col_expr(negotiations::Column::CompletedAt, Expr::value(now))
        .col_expr(negotiations::Column::UpdatedAt, Expr::value(now))
        .filter(negotiations::Column::RequestId.eq(request_id))
        .filter(negotiations::Column::Status.is_in([
            NegotiationStatus::Open.as_str(),
            NegotiationStatus::Countered.as_str(),
        ]))
        .exec(conn)
        .await
        .map_err(db_err)?;
    Ok(result.rows_affected)
}
