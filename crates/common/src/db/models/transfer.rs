//! Inter-store transfer entity
//!
//! Records an ownership move: an asset changing stores, or an inventory
//! quantity delta applied across two stores' item rows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What kind of thing moved
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferKind {
    Asset,
    Inventory,
}

impl TransferKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ASSET" => Some(TransferKind::Asset),
            "INVENTORY" => Some(TransferKind::Inventory),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Asset => "ASSET",
            TransferKind::Inventory => "INVENTORY",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub kind: String,

    pub asset_id: Option<Uuid>,

    pub inventory_item_id: Option<Uuid>,

    pub quantity: i32,

    pub from_store_id: Uuid,

    pub to_store_id: Uuid,

    /// Work order this transfer was performed under, if any
    pub work_order_id: Option<Uuid>,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn transfer_kind(&self) -> Option<TransferKind> {
        TransferKind::parse(&self.kind)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::FromStoreId",
        to = "super::store::Column::Id"
    )]
    FromStore,

    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::ToStoreId",
        to = "super::store::Column::Id"
    )]
    ToStore,
}

impl ActiveModelBehavior for ActiveModel {}
