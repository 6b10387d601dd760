//! Read models for spend analytics, scoped by the caller's role.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use procura_core::analytics::{
    DashboardStats, OrderedRequest, RequestTally, SpendAnalytics, SpendOverview, SpendScope,
    SpendWindow,
};
use procura_core::negotiation::{NegotiationStatus, NegotiationTracker, SavingsSummary};
use procura_core::policy::Actor;
use procura_shared::AppResult;

use crate::context::EngineContext;
use crate::db_err;
use crate::entities::{contracts, negotiations, purchase_orders, requests, vendors};

/// Requests in `scope`, optionally only those created within `(since, until)`.
async fn scoped_requests<C: ConnectionTrait>(
    conn: &C,
    scope: SpendScope,
    created: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> AppResult<Vec<requests::Model>> {
    let mut query = requests::Entity::find();
    if let Some(owner) = scope.owner() {
        query = query.filter(requests::Column::OwnerId.eq(owner));
    }
    if let Some((since, until)) = created {
        query = query
            .filter(requests::Column::CreatedAt.gte(since))
            .filter(requests::Column::CreatedAt.lte(until));
    }
    query
        .order_by_asc(requests::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(db_err)
}

async fn orders_for<C: ConnectionTrait>(
    conn: &C,
    request_ids: &[Uuid],
) -> AppResult<Vec<purchase_orders::Model>> {
    if request_ids.is_empty() {
        return Ok(Vec::new());
    }
    purchase_orders::Entity::find()
        .filter(purchase_orders::Column::RequestId.is_in(request_ids.iter().copied()))
        .order_by_asc(purchase_orders::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(db_err)
}

/// Savings over accepted negotiations, limited to `request_ids` when given.
pub(crate) async fn accepted_savings<C: ConnectionTrait>(
    conn: &C,
    request_ids: Option<&[Uuid]>,
) -> AppResult<SavingsSummary> {
    let mut query = negotiations::Entity::find()
        .filter(negotiations::Column::Status.eq(NegotiationStatus::Accepted.as_str()));
    if let Some(ids) = request_ids {
        if ids.is_empty() {
            return Ok(NegotiationTracker::summarize(std::iter::empty()));
        }
        query = query.filter(negotiations::Column::RequestId.is_in(ids.iter().copied()));
    }
    let accepted = query.all(conn).await.map_err(db_err)?;
    Ok(NegotiationTracker::summarize(
        accepted.iter().map(|n| (n.original_price, n.current_price)),
    ))
}

/// Savings visible to `scope` across all time.
pub(crate) async fn scoped_savings<C: ConnectionTrait>(
    conn: &C,
    scope: SpendScope,
) -> AppResult<SavingsSummary> {
    match scope.owner() {
        None => accepted_savings(conn, None).await,
        Some(owner) => {
            let owned: Vec<Uuid> = requests::Entity::find()
                .select_only()
                .column(requests::Column::Id)
                .filter(requests::Column::OwnerId.eq(owner))
                .into_tuple()
                .all(conn)
                .await
                .map_err(db_err)?;
            accepted_savings(conn, Some(&owned)).await
        }
    }
}

/// Spend analytics repository.
#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    ctx: EngineContext,
}

impl AnalyticsRepository {
    /// Creates a new analytics repository.
    #[must_use]
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Spend by category, month, vendor and item for ordered requests
    /// created inside `window` ending at `now`, with the savings negotiated
    /// on them.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn overview(
        &self,
        actor: &Actor,
        window: SpendWindow,
        now: DateTime<Utc>,
    ) -> AppResult<SpendOverview> {
        let scope = SpendScope::for_actor(actor);
        let db = &self.ctx.db;

        let requests = scoped_requests(db, scope, Some((window.since(now), now))).await?;
        let ids: Vec<Uuid> = requests.iter().map(|r| r.id).collect();
        let orders = orders_for(db, &ids).await?;

        let vendor_names: HashMap<Uuid, String> = if orders.is_empty() {
            HashMap::new()
        } else {
            vendors::Entity::find()
                .filter(vendors::Column::Id.is_in(orders.iter().map(|o| o.vendor_id)))
                .all(db)
                .await
                .map_err(db_err)?
                .into_iter()
                .map(|v| (v.id, v.name))
                .collect()
        };
        let due_dates: HashMap<Uuid, DateTime<Utc>> = if orders.is_empty() {
            HashMap::new()
        } else {
            contracts::Entity::find()
                .filter(contracts::Column::Id.is_in(orders.iter().map(|o| o.contract_id)))
                .all(db)
                .await
                .map_err(db_err)?
                .into_iter()
                .map(|c| (c.id, c.delivery_date.with_timezone(&Utc)))
                .collect()
        };

        let by_id: HashMap<Uuid, &requests::Model> =
            requests.iter().map(|r| (r.id, r)).collect();
        let ordered: Vec<OrderedRequest> = orders
            .iter()
            .filter_map(|order| {
                let request = by_id.get(&order.request_id)?;
                Some(OrderedRequest {
                    category: request.category.clone(),
                    description: request.description.clone().or_else(|| request.title.clone()),
                    quantity: request.quantity,
                    created_at: request.created_at.with_timezone(&Utc),
                    vendor: vendor_names
                        .get(&order.vendor_id)
                        .cloned()
                        .unwrap_or_else(|| order.vendor_id.to_string()),
                    total: order.total,
                    ordered_at: order.created_at.with_timezone(&Utc),
                    delivered_at: order.delivered_at.map(|d| d.with_timezone(&Utc)),
                    due_by: due_dates.get(&order.contract_id).copied(),
                })
            })
            .collect();

        let ordered_ids: Vec<Uuid> = orders.iter().map(|o| o.request_id).collect();
        let savings = accepted_savings(db, Some(&ordered_ids)).await?;

        tracing::debug!(
            actor_id = %actor.id,
            window_days = window.days(),
            ordered = ordered.len(),
            "spend overview computed"
        );
        Ok(SpendAnalytics::overview(window, &ordered, savings))
    }

    /// Dashboard counters over every request in the caller's scope.
    ///
    /// # Errors
    ///
    /// Returns a database error, or `Internal` for a stored status that
    /// does not parse.
    pub async fn dashboard(&self, actor: &Actor, now: DateTime<Utc>) -> AppResult<DashboardStats> {
        let scope = SpendScope::for_actor(actor);
        let db = &self.ctx.db;

        let requests = scoped_requests(db, scope, None).await?;
        let ids: Vec<Uuid> = requests.iter().map(|r| r.id).collect();
        let totals: HashMap<Uuid, _> = orders_for(db, &ids)
            .await?
            .into_iter()
            .map(|o| (o.request_id, o.total))
            .collect();

        let tallies = requests
            .iter()
            .map(|r| {
                Ok(RequestTally {
                    status: r.status()?,
                    created_at: r.created_at.with_timezone(&Utc),
                    order_total: totals.get(&r.id).copied(),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        let savings = accepted_savings(db, scope.owner().map(|_| ids.as_slice())).await?;

        Ok(SpendAnalytics::dashboard(&tallies, savings.total_savings, now))
    }
}
