//! Invoice repository: three-way match on submission, approval, disputes
//! and payment.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use procura_core::audit::{AuditAction, AuditEntity, AuditRecord};
use procura_core::notification::{Notification, NotificationKind};
use procura_core::order::{OrderService, PoStatus};
use procura_core::policy::{Actor, Capability};
use procura_core::reconciliation::service::one_decimal;
use procura_core::reconciliation::{
    InvoiceAction, InvoiceStatus, MatchStatus, NewInvoice, ReconciliationEngine,
};
use procura_shared::types::ListLimit;
use procura_shared::{AppError, AppResult};

use super::audit::{append, snapshot};
use super::budget::{LedgerStep, post};
use super::request::{load_request, swap_request};
use crate::context::EngineContext;
use crate::db_err;
use crate::entities::{invoices, purchase_orders, requests, vendors};

/// Filter for invoice reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceFilter {
    /// Only invoices against this order.
    pub po_id: Option<Uuid>,
    /// Only this status, e.g. `RECEIVED`.
    pub status: Option<InvoiceStatus>,
    /// Only this match outcome.
    pub match_status: Option<MatchStatus>,
    /// Maximum rows, default 100.
    pub limit: Option<u64>,
}

async fn find_order<C: ConnectionTrait>(
    conn: &C,
    po_id: Uuid,
) -> AppResult<purchase_orders::Model> {
    purchase_orders::Entity::find_by_id(po_id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("Purchase order {po_id} not found")))
}

/// Moves an order to `next` if it is still in the status it was read in.
pub(crate) async fn swap_order<C: ConnectionTrait>(
    conn: &C,
    current: &purchase_orders::Model,
    mut changes: purchase_orders::ActiveModel,
) -> AppResult<purchase_orders::Model> {
    changes.updated_at = Set(Utc::now().into());
    let result = purchase_orders::Entity::update_many()
        .set(changes)
        .filter(purchase_orders::Column::Id.eq(current.id))
        .filter(purchase_orders::Column::Status.eq(current.status.as_str()))
        .exec(conn)
        .await
        .map_err(db_err)?;
    if result.rows_affected == 0 {
        return Err(AppError::Conflict(format!(
            "purchase order {} was modified concurrently",
            current.id
        )));
    }
    find_order(conn, current.id).await
}

/// Mirrors an order status onto its request.
pub(crate) async fn mirror_request<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
    po_status: PoStatus,
) -> AppResult<Option<(requests::Model, requests::Model)>> {
    let Some(status) = OrderService::request_status(po_status) else {
        return Ok(None);
    };
    let request = load_request(conn, request_id).await?;
    let updated = swap_request(
        conn,
        &request,
        Some(request.status()?),
        requests::ActiveModel {
            status: Set(status.as_str().to_string()),
            ..Default::default()
        },
    )
    .await?;
    Ok(Some((request, updated)))
}

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    ctx: EngineContext,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Records an invoice against an order and classifies it against the
    /// order total. The order and its request move to INVOICED; a mismatch
    /// notifies the request owner.
    ///
    /// # Errors
    ///
    /// `Validation` for bad input, `InvalidTransition` for a paid or
    /// cancelled order, `NotFound`, `Forbidden`, or a database error.
    pub async fn submit(
        &self,
        actor: &Actor,
        po_id: Uuid,
        input: NewInvoice,
    ) -> AppResult<invoices::Model> {
        ReconciliationEngine::validate(&input)?;

        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let order = find_order(&txn, po_id).await?;
        let request = load_request(&txn, order.request_id).await?;
        actor.require_owner_or(request.owner_id)?;

        let next = OrderService::invoice(order.status()?)?;
        let matched = ReconciliationEngine::classify(
            order.total,
            input.total,
            self.ctx.settings.match_tolerance_percent,
        )?;
        let now = Utc::now();

        let invoice = invoices::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_number: Set(input.invoice_number),
            po_id: Set(po_id),
            vendor_id: Set(order.vendor_id),
            request_id: Set(order.request_id),
            subtotal: Set(input.subtotal),
            tax: Set(input.tax),
            total: Set(input.total),
            po_total: Set(order.total),
            variance: Set(matched.variance),
            variance_percent: Set(matched.variance_percent),
            variance_reason: Set(matched.reason.clone()),
            match_status: Set(matched.status.as_str().to_string()),
            status: Set(InvoiceStatus::Received.as_str().to_string()),
            items: Set(input.items),
            due_date: Set(input.due_date.map(Into::into)),
            dispute_reason: Set(None),
            paid_amount: Set(None),
            paid_at: Set(None),
            payment_method: Set(None),
            payment_reference: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        if order.status()? != next {
            swap_order(
                &txn,
                &order,
                purchase_orders::ActiveModel {
                    status: Set(next.as_str().to_string()),
                    ..Default::default()
                },
            )
            .await?;
        }
        mirror_request(&txn, order.request_id, next).await?;

        append(
            &txn,
            AuditRecord::new(AuditAction::Create, AuditEntity::Invoice, invoice.id)
                .by(actor.id, &actor.metadata)
                .for_request(order.request_id)
                .snapshots(None, snapshot(&invoice)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            invoice_id = %invoice.id,
            po_id = %po_id,
            match_status = %matched.status,
            variance = %matched.variance,
            "invoice received"
        );
        if matched.status == MatchStatus::Mismatch {
            self.ctx
                .dispatch(vec![
                    Notification::new(
                        request.owner_id,
                        NotificationKind::InvoiceMismatch,
                        format!("Invoice {} needs review", invoice.invoice_number),
                        format!(
                            "Invoice total differs from {} by {}%",
                            order.po_number,
                            one_decimal(matched.variance_percent)
                        ),
                    )
                    .with_link(format!("/invoices/{}", invoice.id)),
                ])
                .await;
        }
        Ok(invoice)
    }

    /// Approves, disputes or pays an invoice.
    ///
    /// Payment also moves the order and request to PAID, bumps the vendor's
    /// order counters and realizes the paid amount on the request's budget.
    ///
    /// # Errors
    ///
    /// `Forbidden` without `SettleInvoices`, `InvalidTransition`,
    /// `Validation` for a dispute without reason, `NotFound`, or a database
    /// error.
    pub async fn decide(
        &self,
        actor: &Actor,
        invoice_id: Uuid,
        action: InvoiceAction,
    ) -> AppResult<invoices::Model> {
        actor.require(Capability::SettleInvoices)?;

        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let invoice = invoices::Entity::find_by_id(invoice_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Invoice {invoice_id} not found")))?;
        let next = ReconciliationEngine::decide(invoice.status()?, &action)?;
        let now = Utc::now();

        let mut changes = invoices::ActiveModel {
            status: Set(next.as_str().to_string()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let mut outbox = Vec::new();
        match &action {
            InvoiceAction::Approve => {
                changes.match_status = Set(MatchStatus::Matched.as_str().to_string());
            }
            InvoiceAction::Dispute { reason } => {
                changes.dispute_reason = Set(Some(reason.trim().to_string()));
            }
            InvoiceAction::Pay {
                amount,
                method,
                reference,
            } => {
                let paid = amount.unwrap_or(invoice.total);
                if paid <= Decimal::ZERO {
                    return Err(AppError::Validation(
                        "payment amount must be positive".to_string(),
                    ));
                }
                changes.paid_amount = Set(Some(paid));
                changes.paid_at = Set(Some(now.into()));
                changes.payment_method = Set(method.clone());
                changes.payment_reference = Set(reference.clone());
                outbox.extend(self.settle(&txn, &invoice, paid).await?);
            }
        }

        let result = invoices::Entity::update_many()
            .set(changes)
            .filter(invoices::Column::Id.eq(invoice_id))
            .filter(invoices::Column::Status.eq(invoice.status.as_str()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(AppError::Conflict(format!(
                "invoice {invoice_id} was modified concurrently"
            )));
        }
        let updated = invoices::Entity::find_by_id(invoice_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Invoice {invoice_id} not found")))?;

        append(
            &txn,
            AuditRecord::new(AuditAction::StatusChange, AuditEntity::Invoice, invoice_id)
                .by(actor.id, &actor.metadata)
                .for_request(invoice.request_id)
                .snapshots(snapshot(&invoice), snapshot(&updated)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            invoice_id = %invoice_id,
            action = action.as_str(),
            from = %invoice.status,
            to = %updated.status,
            "invoice decided"
        );
        self.ctx.dispatch(outbox).await;
        Ok(updated)
    }

    /// Payment side effects: order and request to PAID, vendor counters,
    /// budget realization.
    async fn settle<C: ConnectionTrait>(
        &self,
        conn: &C,
        invoice: &invoices::Model,
        paid: Decimal,
    ) -> AppResult<Option<Notification>> {
        let order = find_order(conn, invoice.po_id).await?;
        if order.status()? != PoStatus::Paid {
            swap_order(
                conn,
                &order,
                purchase_orders::ActiveModel {
                    status: Set(PoStatus::Paid.as_str().to_string()),
                    ..Default::default()
                },
            )
            .await?;
        }
        let mirrored = mirror_request(conn, invoice.request_id, PoStatus::Paid).await?;

        let vendor = vendors::Entity::find_by_id(invoice.vendor_id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Vendor {} not found", invoice.vendor_id)))?;
        let (orders, value) = (vendor.total_orders + 1, vendor.total_value + paid);
        let mut counters: vendors::ActiveModel = vendor.into();
        counters.total_orders = Set(orders);
        counters.total_value = Set(value);
        counters.updated_at = Set(Utc::now().into());
        counters.update(conn).await.map_err(db_err)?;

        let budget_id = mirrored
            .map(|(before, _)| before.budget_id)
            .unwrap_or_default();
        match budget_id {
            Some(budget_id) => post(conn, budget_id, LedgerStep::Realize, paid).await,
            None => Ok(None),
        }
    }

    /// Reads an invoice.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, or a database error.
    pub async fn get(&self, actor: &Actor, invoice_id: Uuid) -> AppResult<invoices::Model> {
        let invoice = invoices::Entity::find_by_id(invoice_id)
            .one(&self.ctx.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Invoice {invoice_id} not found")))?;
        let request = load_request(&self.ctx.db, invoice.request_id).await?;
        actor.require_owner_or(request.owner_id)?;
        Ok(invoice)
    }

    /// Invoices, newest first. Requires `SettleInvoices`.
    ///
    /// # Errors
    ///
    /// `Forbidden`, or a database error.
    pub async fn list(&self, actor: &Actor, filter: InvoiceFilter) -> AppResult<Vec<invoices::Model>> {
        actor.require(Capability::SettleInvoices)?;
        let mut query = invoices::Entity::find().order_by_desc(invoices::Column::CreatedAt);
        if let Some(po_id) = filter.po_id {
            query = query.filter(invoices::Column::PoId.eq(po_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(invoices::Column::Status.eq(status.as_str()));
        }
        if let Some(match_status) = filter.match_status {
            query = query.filter(invoices::Column::MatchStatus.eq(match_status.as_str()));
        }
        query
            .limit(ListLimit::from_query(filter.limit).get())
            .all(&self.ctx.db)
            .await
            .map_err(db_err)
    }
}
