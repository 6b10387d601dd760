//! `SeaORM` Entity for deliveries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shipment on its way.
pub const STATUS_SHIPPED: &str = "SHIPPED";
/// Shipment arrived.
pub const STATUS_DELIVERED: &str = "DELIVERED";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "deliveries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub po_id: Uuid,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub status: String,
    pub shipped_at: DateTimeWithTimeZone,
    pub delivered_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
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
