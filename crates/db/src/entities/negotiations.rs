//! `SeaORM` Entity for negotiations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use procura_core::negotiation::NegotiationStatus;
use procura_shared::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "negotiations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub request_id: Uuid,
    pub quote_id: Uuid,
    pub vendor_id: Uuid,
    pub original_price: Decimal,
    pub current_price: Decimal,
    pub target_price: Decimal,
    pub status: String,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Parsed negotiation status.
    ///
    /// # Errors
    ///
    /// `Internal` if the stored value is not a known status.
    pub fn status(&self) -> Result<NegotiationStatus, AppError> {
        NegotiationStatus::parse(&self.status).ok_or_else(|| {
            AppError::Internal(format!("unknown negotiation status {}", self.status))
        })
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::requests::Entity",
        from = "Column::RequestId",
        to = "super::requests::Column::Id"
    )]
    Requests,
    #[sea_orm(has_many = "super::negotiation_rounds::Entity")]
    NegotiationRounds,
}

impl Related<super::requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requests.def()
    }
}

impl Related<super::negotiation_rounds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NegotiationRounds.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
