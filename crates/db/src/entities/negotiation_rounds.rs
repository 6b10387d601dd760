//! `SeaORM` Entity for negotiation_rounds table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "negotiation_rounds")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub negotiation_id: Uuid,
    pub round: i32,
    pub our_offer: Option<Decimal>,
    pub vendor_response: Option<Decimal>,
    pub status: String,
    pub message: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::negotiations::Entity",
        from = "Column::NegotiationId",
        to = "super::negotiations::Column::Id"
    )]
    Negotiations,
}

impl Related<super::negotiations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Negotiations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
