//! `SeaORM` Entity for vendors table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use procura_core::sourcing::VendorCandidate;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "vendors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    /// JSON array of category names.
    pub categories: Json,
    pub rating: Decimal,
    pub verified: bool,
    pub total_orders: i32,
    pub total_value: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Category names, ignoring malformed entries.
    #[must_use]
    pub fn category_list(&self) -> Vec<String> {
        self.categories
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|c| c.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// View used by the sourcing policy.
    #[must_use]
    pub fn candidate(&self) -> VendorCandidate {
        VendorCandidate {
            id: self.id,
            name: self.name.clone(),
            rating: self.rating,
            verified: self.verified,
            categories: self.category_list(),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::quotes::Entity")]
    Quotes,
}

impl Related<super::quotes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quotes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
