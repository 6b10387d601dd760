//! `SeaORM` Entity for requests table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use procura_core::request::{RequestStatus, Stage};
use procura_shared::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub request_number: String,
    pub owner_id: Uuid,
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i32>,
    pub specifications: Option<Json>,
    pub budget_estimate: Option<Decimal>,
    pub urgency: String,
    pub delivery_location: Option<String>,
    pub status: String,
    pub stage: String,
    pub budget_id: Option<Uuid>,
    pub parent_request_id: Option<Uuid>,
    pub is_recurring: bool,
    pub version: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Parsed workflow status.
    ///
    /// # Errors
    ///
    /// `Internal` if the stored value is not a known status.
    pub fn status(&self) -> Result<RequestStatus, AppError> {
        RequestStatus::parse(&self.status)
            .ok_or_else(|| AppError::Internal(format!("unknown request status {}", self.status)))
    }

    /// Parsed stage.
    ///
    /// # Errors
    ///
    /// `Internal` if the stored value is not a known stage.
    pub fn stage(&self) -> Result<Stage, AppError> {
        Stage::parse(&self.stage)
            .ok_or_else(|| AppError::Internal(format!("unknown request stage {}", self.stage)))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budgets::Entity",
        from = "Column::BudgetId",
        to = "super::budgets::Column::Id"
    )]
    Budgets,
    #[sea_orm(has_many = "super::quotes::Entity")]
    Quotes,
    #[sea_orm(has_many = "super::approvals::Entity")]
    Approvals,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl Related<super::quotes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quotes.def()
    }
}

impl Related<super::approvals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Approvals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
