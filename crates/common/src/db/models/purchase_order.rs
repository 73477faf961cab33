//! Purchase order entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchase order status. Forward-only through the ordering flow, with
/// cancellation allowed any time before receipt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderStatus {
    Draft,
    PendingApproval,
    Approved,
    Ordered,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Draft" => Some(PurchaseOrderStatus::Draft),
            "Pending Approval" => Some(PurchaseOrderStatus::PendingApproval),
            "Approved" => Some(PurchaseOrderStatus::Approved),
            "Ordered" => Some(PurchaseOrderStatus::Ordered),
            "Received" => Some(PurchaseOrderStatus::Received),
            "Cancelled" => Some(PurchaseOrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Draft => "Draft",
            PurchaseOrderStatus::PendingApproval => "Pending Approval",
            PurchaseOrderStatus::Approved => "Approved",
            PurchaseOrderStatus::Ordered => "Ordered",
            PurchaseOrderStatus::Received => "Received",
            PurchaseOrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn can_transition(&self, to: PurchaseOrderStatus) -> bool {
        use PurchaseOrderStatus::*;
        if *self == to {
            return true;
        }
        match (self, to) {
            (Draft, PendingApproval) | (Draft, Cancelled) => true,
            (PendingApproval, Approved) | (PendingApproval, Cancelled) => true,
            (Approved, Ordered) | (Approved, Cancelled) => true,
            (Ordered, Received) | (Ordered, Cancelled) => true,
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Per-store sequential number, assigned max+1 at creation
    pub po_number: i32,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub store_id: Uuid,

    pub vendor_id: Option<Uuid>,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn po_status(&self) -> PurchaseOrderStatus {
        PurchaseOrderStatus::parse(&self.status).unwrap_or(PurchaseOrderStatus::Draft)
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
        belongs_to = "super::vendor::Entity",
        from = "Column::VendorId",
        to = "super::vendor::Column::Id"
    )]
    Vendor,

    #[sea_orm(has_many = "super::purchase_order_line::Entity")]
    Lines,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl Related<super::vendor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendor.def()
    }
}

impl Related<super::purchase_order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::PurchaseOrderStatus::*;

    #[test]
    fn test_joins_to_store_vendor_and_lines() {
        use sea_orm::EntityTrait;
        let _ = super::Entity::find().find_also_related(super::super::store::Entity);
        let _ = super::Entity::find().find_also_related(super::super::vendor::Entity);
        let _ = super::Entity::find().find_with_related(super::super::purchase_order_line::Entity);
    }

    #[test]
    fn test_po_transitions() {
        assert!(Draft.can_transition(PendingApproval));
        assert!(PendingApproval.can_transition(Approved));
        assert!(Approved.can_transition(Ordered));
        assert!(Ordered.can_transition(Received));
        assert!(Ordered.can_transition(Cancelled));
        assert!(!Received.can_transition(Cancelled));
        assert!(!Cancelled.can_transition(Ordered));
        assert!(!Draft.can_transition(Received));
    }
}
