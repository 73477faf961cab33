//! SeaORM entity models
//!
//! Database entities for the StoreKeep CMMS

mod asset;
mod attachment;
mod inventory_item;
mod note;
mod pm_schedule;
mod purchase_order;
mod purchase_order_line;
mod request;
mod store;
mod technician;
mod transfer;
mod user;
mod vendor;
mod work_order;

pub use store::{
    ActiveModel as StoreActiveModel, Column as StoreColumn, Entity as StoreEntity, Model as Store,
};

pub use asset::{
    ActiveModel as AssetActiveModel, AssetStatus, Column as AssetColumn, Entity as AssetEntity,
    Model as Asset,
};

pub use work_order::{
    ActiveModel as WorkOrderActiveModel, Column as WorkOrderColumn, Entity as WorkOrderEntity,
    Model as WorkOrder,
};

pub use pm_schedule::{
    ActiveModel as PmScheduleActiveModel, Column as PmScheduleColumn, Entity as PmScheduleEntity,
    Model as PmSchedule,
};

pub use request::{
    ActiveModel as RequestActiveModel, Column as RequestColumn, Entity as RequestEntity,
    Model as Request, RequestStatus,
};

pub use inventory_item::{
    ActiveModel as InventoryItemActiveModel, Column as InventoryItemColumn,
    Entity as InventoryItemEntity, Model as InventoryItem,
};

pub use transfer::{
    ActiveModel as TransferActiveModel, Column as TransferColumn, Entity as TransferEntity,
    Model as Transfer, TransferKind,
};

pub use purchase_order::{
    ActiveModel as PurchaseOrderActiveModel, Column as PurchaseOrderColumn,
    Entity as PurchaseOrderEntity, Model as PurchaseOrder, PurchaseOrderStatus,
};

pub use purchase_order_line::{
    ActiveModel as PurchaseOrderLineActiveModel, Column as PurchaseOrderLineColumn,
    Entity as PurchaseOrderLineEntity, Model as PurchaseOrderLine,
};

pub use technician::{
    ActiveModel as TechnicianActiveModel, Column as TechnicianColumn, Entity as TechnicianEntity,
    Model as Technician,
};

pub use vendor::{
    ActiveModel as VendorActiveModel, Column as VendorColumn, Entity as VendorEntity,
    Model as Vendor,
};

pub use user::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as UserEntity, Model as User,
};

pub use note::{
    ActiveModel as NoteActiveModel, Column as NoteColumn, Entity as NoteEntity, Model as Note,
};

pub use attachment::{
    ActiveModel as AttachmentActiveModel, Column as AttachmentColumn, Entity as AttachmentEntity,
    Model as Attachment,
};
