//! `SeaORM` Entity for approvals table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use procura_core::approval::{ApprovalStatus, ApprovalStep};
use procura_shared::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approvals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub request_id: Uuid,
    pub step: i32,
    pub approver_id: Uuid,
    pub role: String,
    pub threshold: Option<Decimal>,
    pub status: String,
    pub comments: Option<String>,
    pub due_date: DateTimeWithTimeZone,
    pub decided_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// The step as seen by the approval chain.
    ///
    /// # Errors
    ///
    /// `Internal` if the stored status is not a known status.
    pub fn as_step(&self) -> Result<ApprovalStep, AppError> {
        let status = ApprovalStatus::parse(&self.status).ok_or_else(|| {
            AppError::Internal(format!("unknown approval status {}", self.status))
        })?;
        Ok(ApprovalStep {
            id: self.id,
            step: self.step,
            approver_id: self.approver_id,
            status,
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
}

impl Related<super::requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
