//! `SeaORM` Entity for budgets table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use procura_core::budget::BudgetFigures;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub department: String,
    pub fiscal_year: i32,
    pub quarter: Option<i32>,
    pub total_amount: Decimal,
    pub spent_amount: Decimal,
    pub committed_amount: Decimal,
    pub alert_threshold: Decimal,
    pub manager_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Monetary columns as seen by the ledger.
    #[must_use]
    pub const fn figures(&self) -> BudgetFigures {
        BudgetFigures {
            total: self.total_amount,
            spent: self.spent_amount,
            committed: self.committed_amount,
            alert_threshold: self.alert_threshold,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::requests::Entity")]
    Requests,
}

impl Related<super::requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
