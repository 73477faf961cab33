//! Store entity
//!
//! The unit of tenancy isolation: every scoped entity hangs off a store.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stores")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub code: Option<String>,

    /// Public intake lookup token. Null until first generated, then stable.
    #[sea_orm(column_type = "Text", nullable, unique)]
    pub qr_code: Option<String>,

    pub district_id: Option<Uuid>,

    /// Asset/inventory category labels configured for this store
    #[sea_orm(column_type = "JsonBinary")]
    pub categories: Json,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::asset::Entity")]
    Assets,

    #[sea_orm(has_many = "super::inventory_item::Entity")]
    InventoryItems,

    #[sea_orm(has_many = "super::work_order::Entity")]
    WorkOrders,

    #[sea_orm(has_many = "super::technician::Entity")]
    Technicians,

    #[sea_orm(has_many = "super::purchase_order::Entity")]
    PurchaseOrders,
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assets.def()
    }
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryItems.def()
    }
}

impl Related<super::work_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
