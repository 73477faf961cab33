//! Work order entity

use crate::workorders::{Priority, WorkOrderStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    #[sea_orm(column_type = "Text")]
    pub priority: String,

    pub asset_id: Option<Uuid>,

    pub store_id: Option<Uuid>,

    /// Assigned technician
    pub assigned_to_id: Option<Uuid>,

    /// Opaque token for the read-only shared view. Null until issued.
    #[sea_orm(column_type = "Text", nullable, unique)]
    pub share_token: Option<String>,

    /// Email of the submitter for public QR intake orders
    #[sea_orm(column_type = "Text", nullable)]
    pub requested_by: Option<String>,

    pub due_date: Option<Date>,

    pub completed_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Persisted status as an enum. Falls back to Open for rows written
    /// before the status vocabulary was fixed.
    pub fn work_order_status(&self) -> WorkOrderStatus {
        WorkOrderStatus::parse(&self.status).unwrap_or(WorkOrderStatus::Open)
    }

    pub fn work_order_priority(&self) -> Priority {
        Priority::parse(&self.priority).unwrap_or(Priority::Medium)
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

    #[sea_orm(
        belongs_to = "super::asset::Entity",
        from = "Column::AssetId",
        to = "super::asset::Column::Id"
    )]
    Asset,

    #[sea_orm(
        belongs_to = "super::technician::Entity",
        from = "Column::AssignedToId",
        to = "super::technician::Column::Id"
    )]
    AssignedTo,

    #[sea_orm(has_many = "super::note::Entity")]
    Notes,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl Related<super::technician::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignedTo.def()
    }
}

impl Related<super::note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joins_to_linked_entities() {
        let _ = Entity::find().find_also_related(crate::db::models::technician::Entity);
        let _ = Entity::find().find_also_related(crate::db::models::asset::Entity);
        let _ = Entity::find().find_with_related(crate::db::models::note::Entity);
    }
}
