//! `SeaORM` Entity for recurring_schedules table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use procura_core::recurring::Frequency;
use procura_shared::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_schedules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub request_id: Uuid,
    pub frequency: String,
    pub interval: i32,
    pub day_of_week: Option<i32>,
    pub day_of_month: Option<i32>,
    pub start_date: DateTimeWithTimeZone,
    pub end_date: Option<DateTimeWithTimeZone>,
    pub last_run_date: Option<DateTimeWithTimeZone>,
    pub next_run_date: DateTimeWithTimeZone,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Parsed frequency.
    ///
    /// # Errors
    ///
    /// `Internal` if the stored value is not a known frequency.
    pub fn frequency(&self) -> Result<Frequency, AppError> {
        Frequency::parse(&self.frequency)
            .ok_or_else(|| AppError::Internal(format!("unknown frequency {}", self.frequency)))
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
}

impl Related<super::requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
