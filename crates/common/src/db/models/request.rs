//! Maintenance request entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Request review status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Open,
    Approved,
    Rejected,
    Converted,
}

impl RequestStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Open" => Some(RequestStatus::Open),
            "Approved" => Some(RequestStatus::Approved),
            "Rejected" => Some(RequestStatus::Rejected),
            "Converted" => Some(RequestStatus::Converted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Open => "Open",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
            RequestStatus::Converted => "Converted",
        }
    }

    /// Review flow: Open -> Approved/Rejected; Approved -> Converted
    pub fn can_transition(&self, to: RequestStatus) -> bool {
        use RequestStatus::*;
        *self == to
            || matches!(
                (self, to),
                (Open, Approved) | (Open, Rejected) | (Approved, Converted)
            )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Global sequential number, assigned max+1 at creation
    #[sea_orm(unique)]
    pub request_number: i32,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub asset_id: Option<Uuid>,

    #[sea_orm(column_type = "Text")]
    pub priority: String,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub store_id: Option<Uuid>,

    /// Email of the submitting account
    #[sea_orm(column_type = "Text")]
    pub created_by: String,

    /// Attachment URLs as a JSON array
    #[sea_orm(column_type = "JsonBinary")]
    pub attachments: Json,

    /// Work order this request was converted into, if any
    pub work_order_id: Option<Uuid>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn request_status(&self) -> RequestStatus {
        RequestStatus::parse(&self.status).unwrap_or(RequestStatus::Open)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::asset::Entity",
        from = "Column::AssetId",
        to = "super::asset::Column::Id"
    )]
    Asset,

    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,

    #[sea_orm(
        belongs_to = "super::work_order::Entity",
        from = "Column::WorkOrderId",
        to = "super::work_order::Column::Id"
    )]
    WorkOrder,
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::RequestStatus::*;

    #[test]
    fn test_request_transitions() {
        assert!(Open.can_transition(Approved));
        assert!(Open.can_transition(Rejected));
        assert!(Approved.can_transition(Converted));
        assert!(!Rejected.can_transition(Converted));
        assert!(!Converted.can_transition(Open));
        assert!(Open.can_transition(Open));
    }
}
