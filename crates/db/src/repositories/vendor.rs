//! Vendor administration and the vendor portal.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use procura_core::audit::{AuditAction, AuditEntity, AuditRecord};
use procura_core::notification::{Notification, NotificationKind};
use procura_core::numbering::DocumentKind;
use procura_core::order::{OrderAction, OrderService, PoStatus};
use procura_core::policy::{Actor, ActorMetadata, Capability, VendorActor};
use procura_core::request::{RequestStatus, Stage};
use procura_shared::types::ListLimit;
use procura_shared::{AppError, AppResult};

use super::audit::{append, snapshot};
use super::invoice::{mirror_request, swap_order};
use super::request::{load_request, mark_recommended, swap_request};
use super::sequence::allocate;
use crate::context::EngineContext;
use crate::db_err;
use crate::entities::{deliveries, purchase_orders, quotes, requests, vendors};

/// Input for registering a vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVendor {
    /// Display name.
    pub name: String,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Categories supplied.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Rating from 0 to 5.
    #[serde(default)]
    pub rating: Decimal,
    /// Only verified vendors are solicited.
    #[serde(default)]
    pub verified: bool,
}

/// Filter for vendor lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VendorFilter {
    /// Only vendors supplying this category.
    pub category: Option<String>,
    /// Only verified vendors.
    #[serde(default)]
    pub verified_only: bool,
    /// Maximum rows, default 100.
    pub limit: Option<u64>,
}

/// A vendor's quote through the portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteSubmission {
    /// Price per unit.
    pub unit_price: Decimal,
    /// Lead time in days.
    pub delivery_days: i32,
    /// Warranty text.
    #[serde(default)]
    pub warranty: Option<String>,
}

/// Vendor repository.
#[derive(Debug, Clone)]
pub struct VendorRepository {
    ctx: EngineContext,
}

impl VendorRepository {
    /// Creates a new vendor repository.
    #[must_use]
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Registers a vendor.
    ///
    /// # Errors
    ///
    /// `Forbidden` without `ManageVendors`, `Validation` for an empty name
    /// or a rating outside 0..=5, or a database error.
    pub async fn create(&self, actor: &Actor, input: NewVendor) -> AppResult<vendors::Model> {
        actor.require(Capability::ManageVendors)?;
        if input.name.trim().is_empty() {
            return Err(AppError::Validation("vendor name is required".to_string()));
        }
        if input.rating < Decimal::ZERO || input.rating > Decimal::from(5) {
            return Err(AppError::Validation(
                "rating must be between 0 and 5".to_string(),
            ));
        }

        let now = Utc::now();
        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let vendor = vendors::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            email: Set(input.email),
            categories: Set(serde_json::Value::from(input.categories)),
            rating: Set(input.rating),
            verified: Set(input.verified),
            total_orders: Set(0),
            total_value: Set(Decimal::ZERO),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;
        append(
            &txn,
            AuditRecord::new(AuditAction::Create, AuditEntity::Vendor, vendor.id)
                .by(actor.id, &actor.metadata)
                .snapshots(None, snapshot(&vendor)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(vendor_id = %vendor.id, name = %vendor.name, "vendor registered");
        Ok(vendor)
    }

    /// Vendors by rating, best first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list(&self, filter: VendorFilter) -> AppResult<Vec<vendors::Model>> {
        let mut query = vendors::Entity::find()
            .order_by_desc(vendors::Column::Rating)
            .order_by_asc(vendors::Column::Name);
        if filter.verified_only {
            query = query.filter(vendors::Column::Verified.eq(true));
        }
        let limit = usize::try_from(ListLimit::from_query(filter.limit).get()).unwrap_or(usize::MAX);
        let all = query.all(&self.ctx.db).await.map_err(db_err)?;
        Ok(all
            .into_iter()
            .filter(|v| v.candidate().supplies(filter.category.as_deref()))
            .take(limit)
            .collect())
    }

    async fn find(&self, vendor_id: Uuid) -> AppResult<vendors::Model> {
        vendors::Entity::find_by_id(vendor_id)
            .one(&self.ctx.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Vendor {vendor_id} not found")))
    }

    /// QUOTING requests in the vendor's categories that it has not quoted.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown vendor, or a database error.
    pub async fn open_rfqs(&self, vendor: VendorActor) -> AppResult<Vec<requests::Model>> {
        let candidate = self.find(vendor.vendor_id).await?.candidate();
        let quoted: Vec<Uuid> = quotes::Entity::find()
            .select_only()
            .column(quotes::Column::RequestId)
            .filter(quotes::Column::VendorId.eq(vendor.vendor_id))
            .into_tuple()
            .all(&self.ctx.db)
            .await
            .map_err(db_err)?;

        let open = requests::Entity::find()
            .filter(requests::Column::Status.eq(RequestStatus::Quoting.as_str()))
            .order_by_asc(requests::Column::CreatedAt)
            .all(&self.ctx.db)
            .await
            .map_err(db_err)?;
        Ok(open
            .into_iter()
            .filter(|r| !quoted.contains(&r.id))
            .filter(|r| {
                r.category
                    .as_deref()
                    .is_none_or(|c| candidate.supplies(Some(c)))
            })
            .collect())
    }

    /// Records a vendor's quote against a QUOTING request and re-runs the
    /// recommendation.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the request is QUOTING, `Validation` for a
    /// duplicate quote or bad prices, `NotFound`, or a database error.
    pub async fn submit_quote(
        &self,
        vendor: VendorActor,
        request_id: Uuid,
        input: QuoteSubmission,
    ) -> AppResult<quotes::Model> {
        if input.unit_price <= Decimal::ZERO {
            return Err(AppError::Validation("unit price must be positive".to_string()));
        }
        if input.delivery_days < 0 {
            return Err(AppError::Validation(
                "delivery days must not be negative".to_string(),
            ));
        }
        let supplier = self.find(vendor.vendor_id).await?;

        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let request = load_request(&txn, request_id).await?;
        let status = request.status()?;
        if status != RequestStatus::Quoting {
            return Err(AppError::InvalidTransition(format!(
                "cannot quote a request that is {status}; expected QUOTING"
            )));
        }
        let duplicate = quotes::Entity::find()
            .filter(quotes::Column::RequestId.eq(request_id))
            .filter(quotes::Column::VendorId.eq(vendor.vendor_id))
            .one(&txn)
            .await
            .map_err(db_err)?;
        if duplicate.is_some() {
            return Err(AppError::Validation(format!(
                "vendor already quoted request {request_id}"
            )));
        }

        let now = Utc::now();
        let quantity = request.quantity.filter(|q| *q > 0).unwrap_or(1);
        let number = allocate(
            &txn,
            DocumentKind::Quote,
            chrono::Datelike::year(&now),
            self.ctx.settings.max_number_attempts,
        )
        .await?;
        let quote = quotes::ActiveModel {
            id: Set(Uuid::new_v4()),
            quote_number: Set(number),
            request_id: Set(request_id),
            vendor_id: Set(vendor.vendor_id),
            unit_price: Set(input.unit_price),
            quantity: Set(quantity),
            total_price: Set(input.unit_price * Decimal::from(quantity)),
            delivery_days: Set(input.delivery_days),
            warranty: Set(input.warranty),
            valid_until: Set((now + Duration::days(self.ctx.settings.quote_validity_days)).into()),
            recommended: Set(false),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;
        let ranked = mark_recommended(&txn, request_id).await?;

        if request.stage()? == Stage::RfqSent {
            swap_request(
                &txn,
                &request,
                Some(RequestStatus::Quoting),
                requests::ActiveModel {
                    stage: Set(Stage::QuotesReceived.as_str().to_string()),
                    ..Default::default()
                },
            )
            .await?;
        }

        let quote = ranked.into_iter().find(|q| q.id == quote.id).unwrap_or(quote);
        append(
            &txn,
            AuditRecord::new(AuditAction::Create, AuditEntity::Quote, quote.id)
                .by(vendor.vendor_id, &ActorMetadata::default())
                .for_request(request_id)
                .snapshots(None, snapshot(&quote)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            quote_id = %quote.id,
            request_id = %request_id,
            vendor_id = %vendor.vendor_id,
            total = %quote.total_price,
            "vendor quote received"
        );
        self.ctx
            .dispatch(vec![
                Notification::new(
                    request.owner_id,
                    NotificationKind::QuoteReceived,
                    format!("New quote for {}", request.request_number),
                    format!("{} quoted {}", supplier.name, quote.total_price),
                )
                .with_link(format!("/requests/{request_id}")),
            ])
            .await;
        Ok(quote)
    }

    /// Orders issued to the vendor, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn orders(&self, vendor: VendorActor) -> AppResult<Vec<purchase_orders::Model>> {
        purchase_orders::Entity::find()
            .filter(purchase_orders::Column::VendorId.eq(vendor.vendor_id))
            .order_by_desc(purchase_orders::Column::CreatedAt)
            .all(&self.ctx.db)
            .await
            .map_err(db_err)
    }

    /// Acknowledges, ships or delivers an order. The request mirrors the
    /// order status and its owner is notified.
    ///
    /// # Errors
    ///
    /// `Forbidden` for another vendor's order, `InvalidTransition`,
    /// `NotFound`, `Conflict`, or a database error.
    pub async fn update_order(
        &self,
        vendor: VendorActor,
        po_id: Uuid,
        action: OrderAction,
    ) -> AppResult<purchase_orders::Model> {
        let txn = self.ctx.db.begin().await.map_err(db_err)?;
        let order = purchase_orders::Entity::find_by_id(po_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Purchase order {po_id} not found")))?;
        if order.vendor_id != vendor.vendor_id {
            return Err(AppError::Forbidden(format!(
                "purchase order {po_id} belongs to another vendor"
            )));
        }
        let next = OrderService::apply(order.status()?, &action)?;
        let now = Utc::now();

        let mut changes = purchase_orders::ActiveModel {
            status: Set(next.as_str().to_string()),
            ..Default::default()
        };
        match &action {
            OrderAction::Acknowledge => changes.acknowledged_at = Set(Some(now.into())),
            OrderAction::Ship {
                tracking_number,
                carrier,
            } => {
                changes.shipped_at = Set(Some(now.into()));
                deliveries::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    po_id: Set(po_id),
                    tracking_number: Set(tracking_number.clone()),
                    carrier: Set(carrier.clone()),
                    status: Set(deliveries::STATUS_SHIPPED.to_string()),
                    shipped_at: Set(now.into()),
                    delivered_at: Set(None),
                    created_at: Set(now.into()),
                }
                .insert(&txn)
                .await
                .map_err(db_err)?;
            }
            OrderAction::Deliver { .. } => {
                if next == PoStatus::Delivered {
                    changes.delivered_at = Set(Some(now.into()));
                }
                deliveries::Entity::update_many()
                    .col_expr(
                        deliveries::Column::Status,
                        Expr::value(deliveries::STATUS_DELIVERED),
                    )
                    .col_expr(deliveries::Column::DeliveredAt, Expr::value(now))
                    .filter(deliveries::Column::PoId.eq(po_id))
                    .filter(deliveries::Column::Status.eq(deliveries::STATUS_SHIPPED))
                    .exec(&txn)
                    .await
                    .map_err(db_err)?;
            }
        }
        let updated = swap_order(&txn, &order, changes).await?;
        let mirrored = mirror_request(&txn, order.request_id, next).await?;

        append(
            &txn,
            AuditRecord::new(AuditAction::StatusChange, AuditEntity::PurchaseOrder, po_id)
                .by(vendor.vendor_id, &ActorMetadata::default())
                .for_request(order.request_id)
                .snapshots(snapshot(&order), snapshot(&updated)),
        )
        .await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            po_id = %po_id,
            action = action.as_str(),
            from = %order.status,
            to = %updated.status,
            "purchase order updated"
        );
        if let Some((request, _)) = mirrored {
            self.ctx
                .dispatch(vec![
                    Notification::new(
                        request.owner_id,
                        NotificationKind::DeliveryUpdate,
                        format!("Order {} {}", updated.po_number, next.as_str().to_lowercase()),
                        format!(
                            "Purchase order {} for {} is now {}",
                            updated.po_number, request.request_number, next
                        ),
                    )
                    .with_link(format!("/requests/{}", request.id)),
                ])
                .await;
        }
        Ok(updated)
    }
}
