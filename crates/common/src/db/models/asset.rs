//! Asset entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Asset operating status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetStatus {
    Active,
    Down,
    Retired,
}

impl AssetStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Active" => Some(AssetStatus::Active),
            "Down" => Some(AssetStatus::Down),
            "Retired" => Some(AssetStatus::Retired),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Active => "Active",
            AssetStatus::Down => "Down",
            AssetStatus::Retired => "Retired",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Per-store sequential number, assigned max+1 at creation.
    /// Append-only: deleted numbers are never reused.
    pub asset_no: i32,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub category: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub location: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub serial_number: Option<String>,

    pub store_id: Uuid,

    /// Optional parent asset (self-referential, non-cyclic by convention)
    pub parent_asset_id: Option<Uuid>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn asset_status(&self) -> AssetStatus {
        AssetStatus::parse(&self.status).unwrap_or(AssetStatus::Active)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,

    #[sea_orm(has_many = "super::work_order::Entity")]
    WorkOrders,

    #[sea_orm(has_many = "super::pm_schedule::Entity")]
    PmSchedules,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl Related<super::work_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
