//! `SeaORM` Entity for invoices table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use procura_core::reconciliation::InvoiceStatus;
use procura_shared::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub invoice_number: String,
    pub po_id: Uuid,
    pub vendor_id: Uuid,
    pub request_id: Uuid,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    /// PO total at submission time.
    pub po_total: Decimal,
    pub variance: Decimal,
    pub variance_percent: Decimal,
    pub variance_reason: Option<String>,
    pub match_status: String,
    pub status: String,
    pub items: Json,
    pub due_date: Option<DateTimeWithTimeZone>,
    pub dispute_reason: Option<String>,
    pub paid_amount: Option<Decimal>,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Parsed invoice status.
    ///
    /// # Errors
    ///
    /// `Internal` if the stored value is not a known status.
    pub fn status(&self) -> Result<InvoiceStatus, AppError> {
        InvoiceStatus::parse(&self.status)
            .ok_or_else(|| AppError::Internal(format!("unknown invoice status {}", self.status)))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_orders::Entity",
        from = "Column::PoId",
        to = "super::purchase_orders::Column::Id"
    )]
    PurchaseOrders,
}

impl Related<super::purchase_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
