//! `SeaORM` Entity for contracts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Contract drafted from an accepted negotiation.
pub const STATUS_DRAFT: &str = "DRAFT";
/// Contract frozen when its purchase order is issued.
pub const STATUS_SIGNED: &str = "SIGNED";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub contract_number: String,
    #[sea_orm(unique)]
    pub request_id: Uuid,
    pub negotiation_id: Uuid,
    pub vendor_id: Uuid,
    pub items: Json,
    pub total_value: Decimal,
    pub payment_terms: String,
    pub delivery_date: DateTimeWithTimeZone,
    pub warranty: String,
    pub terms: Json,
    pub status: String,
    pub signed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::requests::Entity",
        from = "Column::RequestId",
        to = "super::requests::Column::Id"
    )]
    Requests,
}

impl Related<super::requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
