//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations with proper
//! error handling. Every list/find method that touches store-owned data
//! takes a `StoreScope`; a `Denied` scope yields an empty result, never an
//! unscoped one.

use crate::auth::StoreScope;
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::workorders::{Priority, WorkOrderStatus};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

/// Assignee change requested by a work order update. An empty-string
/// assignee value in the payload maps to `Clear` (disconnect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssigneeChange {
    #[default]
    Keep,
    Clear,
    Set(Uuid),
}

/// Field changes for a generic work order update. `status` has already been
/// transition-validated by the caller. `completed_at` is only stamped when a
/// calling flow explicitly provides it.
#[derive(Debug, Default)]
pub struct WorkOrderUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkOrderStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    pub assignee: AssigneeChange,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Default)]
pub struct AssetUpdate {
    pub name: Option<String>,
    pub status: Option<AssetStatus>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub serial_number: Option<String>,
    pub parent_asset_id: Option<Option<Uuid>>,
}

#[derive(Debug, Default)]
pub struct StoreUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
    pub district_id: Option<Option<Uuid>>,
    pub categories: Option<serde_json::Value>,
}

#[derive(Debug, Default)]
pub struct InventoryItemUpdate {
    pub name: Option<String>,
    pub part_number: Option<String>,
    pub reorder_threshold: Option<i32>,
}

#[derive(Debug, Default)]
pub struct PmScheduleUpdate {
    pub title: Option<String>,
    pub frequency_days: Option<i32>,
    pub next_due_date: Option<NaiveDate>,
    pub active: Option<bool>,
}

/// New purchase order line input
#[derive(Debug, Clone)]
pub struct NewPurchaseOrderLine {
    pub description: String,
    pub inventory_item_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: rust_decimal::Decimal,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    fn now() -> chrono::DateTime<chrono::FixedOffset> {
        chrono::Utc::now().into()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_user(
        &self,
        email: String,
        password_hash: String,
        role: String,
        store_id: Option<Uuid>,
        technician_id: Option<Uuid>,
        vendor_id: Option<Uuid>,
    ) -> Result<User> {
        let now = Self::now();
        let user = UserActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(password_hash),
            role: Set(role),
            store_id: Set(store_id),
            technician_id: Set(technician_id),
            vendor_id: Set(vendor_id),
            created_at: Set(now),
            updated_at: Set(now),
        };
        user.insert(self.write_conn()).await.map_err(Into::into)
    }

    pub async fn list_users(&self, scope: &StoreScope) -> Result<Vec<User>> {
        let query = UserEntity::find().order_by_desc(UserColumn::CreatedAt);
        let query = match scope {
            StoreScope::All => query,
            StoreScope::Store(store_id) => query.filter(UserColumn::StoreId.eq(*store_id)),
            StoreScope::Denied => return Ok(Vec::new()),
        };
        query.all(self.read_conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Store Operations
    // ========================================================================

    pub async fn create_store(
        &self,
        name: String,
        code: Option<String>,
        district_id: Option<Uuid>,
        categories: serde_json::Value,
    ) -> Result<Store> {
        let now = Self::now();
        let store = StoreActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            code: Set(code),
            qr_code: Set(None),
            district_id: Set(district_id),
            categories: Set(categories),
            created_at: Set(now),
            updated_at: Set(now),
        };
        store.insert(self.write_conn()).await.map_err(Into::into)
    }

    pub async fn find_store_by_id(&self, id: Uuid) -> Result<Option<Store>> {
        StoreEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Public intake lookup by QR token
    pub async fn find_store_by_qr_code(&self, qr_code: &str) -> Result<Option<Store>> {
        StoreEntity::find()
            .filter(StoreColumn::QrCode.eq(qr_code))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn list_stores(&self, scope: &StoreScope) -> Result<Vec<Store>> {
        let query = StoreEntity::find().order_by_asc(StoreColumn::Name);
        let query = match scope {
            StoreScope::All => query,
            StoreScope::Store(store_id) => query.filter(StoreColumn::Id.eq(*store_id)),
            StoreScope::Denied => return Ok(Vec::new()),
        };
        query.all(self.read_conn()).await.map_err(Into::into)
    }

    pub async fn update_store(&self, id: Uuid, update: StoreUpdate) -> Result<Store> {
        let mut store: StoreActiveModel = self
            .find_store_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Store",
                id: id.to_string(),
            })?
            .into();

        if let Some(name) = update.name {
            store.name = Set(name);
        }
        if let Some(code) = update.code {
            store.code = Set(Some(code));
        }
        if let Some(district_id) = update.district_id {
            store.district_id = Set(district_id);
        }
        if let Some(categories) = update.categories {
            store.categories = Set(categories);
        }
        store.updated_at = Set(Self::now());
        store.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Assign the store's QR intake token, once. Returns the stored token,
    /// which never changes after first assignment.
    pub async fn ensure_store_qr_code(&self, id: Uuid, token: String) -> Result<Store> {
        let store = self
            .find_store_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Store",
                id: id.to_string(),
            })?;

        if store.qr_code.is_some() {
            return Ok(store);
        }

        let mut active: StoreActiveModel = store.into();
        active.qr_code = Set(Some(token));
        active.updated_at = Set(Self::now());
        active.update(self.write_conn()).await.map_err(Into::into)
    }

    pub async fn delete_store(&self, id: Uuid) -> Result<bool> {
        let result = StoreEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Asset Operations
    // ========================================================================

    /// Next per-store asset number: max existing + 1. Append-only; deleted
    /// numbers are never reused. Read-then-write, not race-free (see DESIGN).
    pub async fn next_asset_no(&self, store_id: Uuid) -> Result<i32> {
        let highest = AssetEntity::find()
            .filter(AssetColumn::StoreId.eq(store_id))
            .order_by_desc(AssetColumn::AssetNo)
            .one(self.read_conn())
            .await?;
        Ok(highest.map(|a| a.asset_no + 1).unwrap_or(1))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_asset(
        &self,
        store_id: Uuid,
        asset_no: i32,
        name: String,
        status: AssetStatus,
        category: Option<String>,
        location: Option<String>,
        serial_number: Option<String>,
        parent_asset_id: Option<Uuid>,
    ) -> Result<Asset> {
        let now = Self::now();
        let asset = AssetActiveModel {
            id: Set(Uuid::new_v4()),
            asset_no: Set(asset_no),
            name: Set(name),
            status: Set(status.as_str().to_string()),
            category: Set(category),
            location: Set(location),
            serial_number: Set(serial_number),
            store_id: Set(store_id),
            parent_asset_id: Set(parent_asset_id),
            created_at: Set(now),
            updated_at: Set(now),
        };
        asset.insert(self.write_conn()).await.map_err(Into::into)
    }

    pub async fn find_asset_by_id(&self, id: Uuid) -> Result<Option<Asset>> {
        AssetEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_asset_by_no(&self, store_id: Uuid, asset_no: i32) -> Result<Option<Asset>> {
        AssetEntity::find()
            .filter(AssetColumn::StoreId.eq(store_id))
            .filter(AssetColumn::AssetNo.eq(asset_no))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn list_assets(&self, scope: &StoreScope) -> Result<Vec<Asset>> {
        let query = AssetEntity::find().order_by_desc(AssetColumn::CreatedAt);
        let query = match scope {
            StoreScope::All => query,
            StoreScope::Store(store_id) => query.filter(AssetColumn::StoreId.eq(*store_id)),
            StoreScope::Denied => return Ok(Vec::new()),
        };
        query.all(self.read_conn()).await.map_err(Into::into)
    }

    pub async fn update_asset(&self, id: Uuid, update: AssetUpdate) -> Result<Asset> {
        let mut asset: AssetActiveModel = self
            .find_asset_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Asset",
                id: id.to_string(),
            })?
            .into();

        if let Some(name) = update.name {
            asset.name = Set(name);
        }
        if let Some(status) = update.status {
            asset.status = Set(status.as_str().to_string());
        }
        if let Some(category) = update.category {
            asset.category = Set(Some(category));
        }
        if let Some(location) = update.location {
            asset.location = Set(Some(location));
        }
        if let Some(serial_number) = update.serial_number {
            asset.serial_number = Set(Some(serial_number));
        }
        if let Some(parent) = update.parent_asset_id {
            asset.parent_asset_id = Set(parent);
        }
        asset.updated_at = Set(Self::now());
        asset.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Move an asset to another store (transfer flow)
    pub async fn move_asset_to_store(&self, id: Uuid, to_store_id: Uuid) -> Result<Asset> {
        let mut asset: AssetActiveModel = self
            .find_asset_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Asset",
                id: id.to_string(),
            })?
            .into();
        asset.store_id = Set(to_store_id);
        asset.updated_at = Set(Self::now());
        asset.update(self.write_conn()).await.map_err(Into::into)
    }

    pub async fn delete_asset(&self, id: Uuid) -> Result<bool> {
        let result = AssetEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Inventory Operations
    // ========================================================================

    pub async fn create_inventory_item(
        &self,
        store_id: Uuid,
        name: String,
        part_number: String,
        quantity_on_hand: i32,
        reorder_threshold: i32,
    ) -> Result<InventoryItem> {
        let now = Self::now();
        let item = InventoryItemActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            part_number: Set(part_number),
            quantity_on_hand: Set(quantity_on_hand),
            reorder_threshold: Set(reorder_threshold),
            store_id: Set(store_id),
            created_at: Set(now),
            updated_at: Set(now),
        };
        item.insert(self.write_conn()).await.map_err(Into::into)
    }

    pub async fn find_inventory_item_by_id(&self, id: Uuid) -> Result<Option<InventoryItem>> {
        InventoryItemEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Natural-key lookup used by import dedup and transfer targeting
    pub async fn find_inventory_item_by_part_number(
        &self,
        store_id: Uuid,
        part_number: &str,
    ) -> Result<Option<InventoryItem>> {
        InventoryItemEntity::find()
            .filter(InventoryItemColumn::StoreId.eq(store_id))
            .filter(InventoryItemColumn::PartNumber.eq(part_number))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn list_inventory_items(&self, scope: &StoreScope) -> Result<Vec<InventoryItem>> {
        let query = InventoryItemEntity::find().order_by_asc(InventoryItemColumn::Name);
        let query = match scope {
            StoreScope::All => query,
            StoreScope::Store(store_id) => {
                query.filter(InventoryItemColumn::StoreId.eq(*store_id))
            }
            StoreScope::Denied => return Ok(Vec::new()),
        };
        query.all(self.read_conn()).await.map_err(Into::into)
    }

    pub async fn update_inventory_item(
        &self,
        id: Uuid,
        update: InventoryItemUpdate,
    ) -> Result<InventoryItem> {
        let mut item: InventoryItemActiveModel = self
            .find_inventory_item_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Inventory item",
                id: id.to_string(),
            })?
            .into();

        if let Some(name) = update.name {
            item.name = Set(name);
        }
        if let Some(part_number) = update.part_number {
            item.part_number = Set(part_number);
        }
        if let Some(threshold) = update.reorder_threshold {
            item.reorder_threshold = Set(threshold);
        }
        item.updated_at = Set(Self::now());
        item.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Apply a quantity delta, rejecting any change that would go negative
    pub async fn adjust_inventory_quantity(&self, id: Uuid, delta: i32) -> Result<InventoryItem> {
        let item = self
            .find_inventory_item_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Inventory item",
                id: id.to_string(),
            })?;

        let new_quantity = item.quantity_on_hand + delta;
        if new_quantity < 0 {
            return Err(AppError::InsufficientQuantity {
                available: item.quantity_on_hand,
                requested: -delta,
            });
        }

        let mut active: InventoryItemActiveModel = item.into();
        active.quantity_on_hand = Set(new_quantity);
        active.updated_at = Set(Self::now());
        active.update(self.write_conn()).await.map_err(Into::into)
    }

    pub async fn delete_inventory_item(&self, id: Uuid) -> Result<bool> {
        let result = InventoryItemEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Work Order Operations
    // ========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn create_work_order(
        &self,
        title: String,
        description: Option<String>,
        status: WorkOrderStatus,
        priority: Priority,
        asset_id: Option<Uuid>,
        store_id: Option<Uuid>,
        assigned_to_id: Option<Uuid>,
        requested_by: Option<String>,
        due_date: Option<NaiveDate>,
    ) -> Result<WorkOrder> {
        let now = Self::now();
        let work_order = WorkOrderActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title),
            description: Set(description),
            status: Set(status.as_str().to_string()),
            priority: Set(priority.as_str().to_string()),
            asset_id: Set(asset_id),
            store_id: Set(store_id),
            assigned_to_id: Set(assigned_to_id),
            share_token: Set(None),
            requested_by: Set(requested_by),
            due_date: Set(due_date),
            completed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        work_order
            .insert(self.write_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_work_order_by_id(&self, id: Uuid) -> Result<Option<WorkOrder>> {
        WorkOrderEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_work_order_by_share_token(&self, token: &str) -> Result<Option<WorkOrder>> {
        WorkOrderEntity::find()
            .filter(WorkOrderColumn::ShareToken.eq(token))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// PM idempotency guard: an open order for the same asset with the exact
    /// generated title means the schedule already has a live work order.
    pub async fn find_open_work_order_by_title(
        &self,
        asset_id: Uuid,
        title: &str,
    ) -> Result<Option<WorkOrder>> {
        WorkOrderEntity::find()
            .filter(WorkOrderColumn::AssetId.eq(asset_id))
            .filter(WorkOrderColumn::Title.eq(title))
            .filter(
                WorkOrderColumn::Status.is_in([
                    WorkOrderStatus::Open.as_str(),
                    WorkOrderStatus::InProgress.as_str(),
                ]),
            )
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn list_work_orders(&self, scope: &StoreScope) -> Result<Vec<WorkOrder>> {
        let query = WorkOrderEntity::find().order_by_desc(WorkOrderColumn::CreatedAt);
        let query = match scope {
            StoreScope::All => query,
            StoreScope::Store(store_id) => query.filter(WorkOrderColumn::StoreId.eq(*store_id)),
            StoreScope::Denied => return Ok(Vec::new()),
        };
        query.all(self.read_conn()).await.map_err(Into::into)
    }

    /// Work orders assigned to a technician, within scope
    pub async fn list_work_orders_for_technician(
        &self,
        scope: &StoreScope,
        technician_id: Uuid,
    ) -> Result<Vec<WorkOrder>> {
        let query = WorkOrderEntity::find()
            .filter(WorkOrderColumn::AssignedToId.eq(technician_id))
            .order_by_desc(WorkOrderColumn::CreatedAt);
        let query = match scope {
            StoreScope::All => query,
            StoreScope::Store(store_id) => query.filter(WorkOrderColumn::StoreId.eq(*store_id)),
            StoreScope::Denied => return Ok(Vec::new()),
        };
        query.all(self.read_conn()).await.map_err(Into::into)
    }

    pub async fn update_work_order(&self, id: Uuid, update: WorkOrderUpdate) -> Result<WorkOrder> {
        let mut work_order: WorkOrderActiveModel = self
            .find_work_order_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Work order",
                id: id.to_string(),
            })?
            .into();

        if let Some(title) = update.title {
            work_order.title = Set(title);
        }
        if let Some(description) = update.description {
            work_order.description = Set(Some(description));
        }
        if let Some(status) = update.status {
            work_order.status = Set(status.as_str().to_string());
        }
        if let Some(priority) = update.priority {
            work_order.priority = Set(priority.as_str().to_string());
        }
        if let Some(due_date) = update.due_date {
            work_order.due_date = Set(Some(due_date));
        }
        match update.assignee {
            AssigneeChange::Keep => {}
            AssigneeChange::Clear => work_order.assigned_to_id = Set(None),
            AssigneeChange::Set(technician_id) => {
                work_order.assigned_to_id = Set(Some(technician_id))
            }
        }
        if let Some(completed_at) = update.completed_at {
            work_order.completed_at = Set(Some(completed_at.into()));
        }
        work_order.updated_at = Set(Self::now());
        work_order
            .update(self.write_conn())
            .await
            .map_err(Into::into)
    }

    /// Set or clear the share token for the read-only public view
    pub async fn set_work_order_share_token(
        &self,
        id: Uuid,
        token: Option<String>,
    ) -> Result<WorkOrder> {
        let mut work_order: WorkOrderActiveModel = self
            .find_work_order_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Work order",
                id: id.to_string(),
            })?
            .into();
        work_order.share_token = Set(token);
        work_order.updated_at = Set(Self::now());
        work_order
            .update(self.write_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn delete_work_order(&self, id: Uuid) -> Result<bool> {
        let result = WorkOrderEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Work Order Notes
    // ========================================================================

    pub async fn create_note(
        &self,
        work_order_id: Uuid,
        body: String,
        author_email: String,
    ) -> Result<Note> {
        let note = NoteActiveModel {
            id: Set(Uuid::new_v4()),
            work_order_id: Set(work_order_id),
            body: Set(body),
            author_email: Set(author_email),
            created_at: Set(Self::now()),
        };
        note.insert(self.write_conn()).await.map_err(Into::into)
    }

    pub async fn list_notes(&self, work_order_id: Uuid) -> Result<Vec<Note>> {
        NoteEntity::find()
            .filter(NoteColumn::WorkOrderId.eq(work_order_id))
            .order_by_asc(NoteColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // PM Schedule Operations
    // ========================================================================

    pub async fn create_pm_schedule(
        &self,
        title: String,
        asset_id: Uuid,
        store_id: Option<Uuid>,
        frequency_days: i32,
        next_due_date: NaiveDate,
    ) -> Result<PmSchedule> {
        let now = Self::now();
        let schedule = PmScheduleActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title),
            asset_id: Set(asset_id),
            store_id: Set(store_id),
            frequency_days: Set(frequency_days),
            next_due_date: Set(next_due_date),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        schedule.insert(self.write_conn()).await.map_err(Into::into)
    }

    pub async fn find_pm_schedule_by_id(&self, id: Uuid) -> Result<Option<PmSchedule>> {
        PmScheduleEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn list_pm_schedules(&self, scope: &StoreScope) -> Result<Vec<PmSchedule>> {
        let query = PmScheduleEntity::find().order_by_asc(PmScheduleColumn::NextDueDate);
        let query = match scope {
            StoreScope::All => query,
            StoreScope::Store(store_id) => query.filter(PmScheduleColumn::StoreId.eq(*store_id)),
            StoreScope::Denied => return Ok(Vec::new()),
        };
        query.all(self.read_conn()).await.map_err(Into::into)
    }

    /// Active schedules due on or before `today`, within scope
    pub async fn list_due_pm_schedules(
        &self,
        scope: &StoreScope,
        today: NaiveDate,
    ) -> Result<Vec<PmSchedule>> {
        let query = PmScheduleEntity::find()
            .filter(PmScheduleColumn::Active.eq(true))
            .filter(PmScheduleColumn::NextDueDate.lte(today))
            .order_by_asc(PmScheduleColumn::NextDueDate);
        let query = match scope {
            StoreScope::All => query,
            StoreScope::Store(store_id) => query.filter(PmScheduleColumn::StoreId.eq(*store_id)),
            StoreScope::Denied => return Ok(Vec::new()),
        };
        query.all(self.read_conn()).await.map_err(Into::into)
    }

    pub async fn update_pm_schedule(
        &self,
        id: Uuid,
        update: PmScheduleUpdate,
    ) -> Result<PmSchedule> {
        let mut schedule: PmScheduleActiveModel = self
            .find_pm_schedule_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "PM schedule",
                id: id.to_string(),
            })?
            .into();

        if let Some(title) = update.title {
            schedule.title = Set(title);
        }
        if let Some(frequency_days) = update.frequency_days {
            schedule.frequency_days = Set(frequency_days);
        }
        if let Some(next_due_date) = update.next_due_date {
            schedule.next_due_date = Set(next_due_date);
        }
        if let Some(active) = update.active {
            schedule.active = Set(active);
        }
        schedule.updated_at = Set(Self::now());
        schedule.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Advance the schedule's due date after a roller pass
    pub async fn set_pm_schedule_due_date(
        &self,
        id: Uuid,
        next_due_date: NaiveDate,
    ) -> Result<PmSchedule> {
        self.update_pm_schedule(
            id,
            PmScheduleUpdate {
                next_due_date: Some(next_due_date),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete_pm_schedule(&self, id: Uuid) -> Result<bool> {
        let result = PmScheduleEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Request Operations
    // ========================================================================

    /// Next global request number: max existing + 1. Read-then-write, not
    /// race-free (see DESIGN).
    pub async fn next_request_number(&self) -> Result<i32> {
        let highest = RequestEntity::find()
            .order_by_desc(RequestColumn::RequestNumber)
            .one(self.read_conn())
            .await?;
        Ok(highest.map(|r| r.request_number + 1).unwrap_or(1))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_request(
        &self,
        request_number: i32,
        title: String,
        description: String,
        asset_id: Option<Uuid>,
        priority: Priority,
        store_id: Option<Uuid>,
        created_by: String,
        attachments: serde_json::Value,
    ) -> Result<Request> {
        let now = Self::now();
        let request = RequestActiveModel {
            id: Set(Uuid::new_v4()),
            request_number: Set(request_number),
            title: Set(title),
            description: Set(description),
            asset_id: Set(asset_id),
            priority: Set(priority.as_str().to_string()),
            status: Set(RequestStatus::Open.as_str().to_string()),
            store_id: Set(store_id),
            created_by: Set(created_by),
            attachments: Set(attachments),
            work_order_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        request.insert(self.write_conn()).await.map_err(Into::into)
    }

    pub async fn find_request_by_id(&self, id: Uuid) -> Result<Option<Request>> {
        RequestEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn list_requests(&self, scope: &StoreScope) -> Result<Vec<Request>> {
        let query = RequestEntity::find().order_by_desc(RequestColumn::RequestNumber);
        let query = match scope {
            StoreScope::All => query,
            StoreScope::Store(store_id) => query.filter(RequestColumn::StoreId.eq(*store_id)),
            StoreScope::Denied => return Ok(Vec::new()),
        };
        query.all(self.read_conn()).await.map_err(Into::into)
    }

    pub async fn set_request_status(
        &self,
        id: Uuid,
        status: RequestStatus,
        work_order_id: Option<Uuid>,
    ) -> Result<Request> {
        let mut request: RequestActiveModel = self
            .find_request_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Request",
                id: id.to_string(),
            })?
            .into();
        request.status = Set(status.as_str().to_string());
        if let Some(work_order_id) = work_order_id {
            request.work_order_id = Set(Some(work_order_id));
        }
        request.updated_at = Set(Self::now());
        request.update(self.write_conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Transfer Operations
    // ========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn create_transfer(
        &self,
        kind: TransferKind,
        asset_id: Option<Uuid>,
        inventory_item_id: Option<Uuid>,
        quantity: i32,
        from_store_id: Uuid,
        to_store_id: Uuid,
        work_order_id: Option<Uuid>,
    ) -> Result<Transfer> {
        let transfer = TransferActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(kind.as_str().to_string()),
            asset_id: Set(asset_id),
            inventory_item_id: Set(inventory_item_id),
            quantity: Set(quantity),
            from_store_id: Set(from_store_id),
            to_store_id: Set(to_store_id),
            work_order_id: Set(work_order_id),
            created_at: Set(Self::now()),
        };
        transfer.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Transfers touching the scoped store, in either direction
    pub async fn list_transfers(&self, scope: &StoreScope) -> Result<Vec<Transfer>> {
        let query = TransferEntity::find().order_by_desc(TransferColumn::CreatedAt);
        let query = match scope {
            StoreScope::All => query,
            StoreScope::Store(store_id) => query.filter(
                TransferColumn::FromStoreId
                    .eq(*store_id)
                    .or(TransferColumn::ToStoreId.eq(*store_id)),
            ),
            StoreScope::Denied => return Ok(Vec::new()),
        };
        query.all(self.read_conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Purchase Order Operations
    // ========================================================================

    /// Next per-store PO number: max existing + 1
    pub async fn next_po_number(&self, store_id: Uuid) -> Result<i32> {
        let highest = PurchaseOrderEntity::find()
            .filter(PurchaseOrderColumn::StoreId.eq(store_id))
            .order_by_desc(PurchaseOrderColumn::PoNumber)
            .one(self.read_conn())
            .await?;
        Ok(highest.map(|po| po.po_number + 1).unwrap_or(1))
    }

    pub async fn create_purchase_order(
        &self,
        store_id: Uuid,
        po_number: i32,
        vendor_id: Option<Uuid>,
        notes: Option<String>,
        lines: Vec<NewPurchaseOrderLine>,
    ) -> Result<(PurchaseOrder, Vec<PurchaseOrderLine>)> {
        let now = Self::now();
        let purchase_order = PurchaseOrderActiveModel {
            id: Set(Uuid::new_v4()),
            po_number: Set(po_number),
            status: Set(PurchaseOrderStatus::Draft.as_str().to_string()),
            store_id: Set(store_id),
            vendor_id: Set(vendor_id),
            notes: Set(notes),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let purchase_order = purchase_order.insert(self.write_conn()).await?;

        let mut inserted_lines = Vec::with_capacity(lines.len());
        for line in lines {
            let row = PurchaseOrderLineActiveModel {
                id: Set(Uuid::new_v4()),
                purchase_order_id: Set(purchase_order.id),
                description: Set(line.description),
                inventory_item_id: Set(line.inventory_item_id),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                created_at: Set(now),
            };
            inserted_lines.push(row.insert(self.write_conn()).await?);
        }

        Ok((purchase_order, inserted_lines))
    }

    pub async fn find_purchase_order_by_id(&self, id: Uuid) -> Result<Option<PurchaseOrder>> {
        PurchaseOrderEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn list_purchase_orders(&self, scope: &StoreScope) -> Result<Vec<PurchaseOrder>> {
        let query = PurchaseOrderEntity::find().order_by_desc(PurchaseOrderColumn::CreatedAt);
        let query = match scope {
            StoreScope::All => query,
            StoreScope::Store(store_id) => {
                query.filter(PurchaseOrderColumn::StoreId.eq(*store_id))
            }
            StoreScope::Denied => return Ok(Vec::new()),
        };
        query.all(self.read_conn()).await.map_err(Into::into)
    }

    pub async fn list_purchase_order_lines(
        &self,
        purchase_order_id: Uuid,
    ) -> Result<Vec<PurchaseOrderLine>> {
        PurchaseOrderLineEntity::find()
            .filter(PurchaseOrderLineColumn::PurchaseOrderId.eq(purchase_order_id))
            .order_by_asc(PurchaseOrderLineColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn set_purchase_order_status(
        &self,
        id: Uuid,
        status: PurchaseOrderStatus,
    ) -> Result<PurchaseOrder> {
        let mut purchase_order: PurchaseOrderActiveModel = self
            .find_purchase_order_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Purchase order",
                id: id.to_string(),
            })?
            .into();
        purchase_order.status = Set(status.as_str().to_string());
        purchase_order.updated_at = Set(Self::now());
        purchase_order
            .update(self.write_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Technician Operations
    // ========================================================================

    pub async fn create_technician(
        &self,
        store_id: Uuid,
        name: String,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<Technician> {
        let now = Self::now();
        let technician = TechnicianActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            email: Set(email),
            phone: Set(phone),
            store_id: Set(store_id),
            created_at: Set(now),
            updated_at: Set(now),
        };
        technician
            .insert(self.write_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_technician_by_id(&self, id: Uuid) -> Result<Option<Technician>> {
        TechnicianEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn list_technicians(&self, scope: &StoreScope) -> Result<Vec<Technician>> {
        let query = TechnicianEntity::find().order_by_asc(TechnicianColumn::Name);
        let query = match scope {
            StoreScope::All => query,
            StoreScope::Store(store_id) => query.filter(TechnicianColumn::StoreId.eq(*store_id)),
            StoreScope::Denied => return Ok(Vec::new()),
        };
        query.all(self.read_conn()).await.map_err(Into::into)
    }

    pub async fn delete_technician(&self, id: Uuid) -> Result<bool> {
        let result = TechnicianEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Vendor Operations
    // ========================================================================

    pub async fn create_vendor(
        &self,
        store_id: Option<Uuid>,
        name: String,
        email: Option<String>,
        phone: Option<String>,
        category: Option<String>,
    ) -> Result<Vendor> {
        let now = Self::now();
        let vendor = VendorActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            email: Set(email),
            phone: Set(phone),
            category: Set(category),
            store_id: Set(store_id),
            created_at: Set(now),
            updated_at: Set(now),
        };
        vendor.insert(self.write_conn()).await.map_err(Into::into)
    }

    pub async fn find_vendor_by_email(&self, email: &str) -> Result<Option<Vendor>> {
        VendorEntity::find()
            .filter(VendorColumn::Email.eq(email))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_vendor_by_id(&self, id: Uuid) -> Result<Option<Vendor>> {
        VendorEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn list_vendors(&self, scope: &StoreScope) -> Result<Vec<Vendor>> {
        let query = VendorEntity::find().order_by_asc(VendorColumn::Name);
        let query = match scope {
            StoreScope::All => query,
            StoreScope::Store(store_id) => query.filter(VendorColumn::StoreId.eq(*store_id)),
            StoreScope::Denied => return Ok(Vec::new()),
        };
        query.all(self.read_conn()).await.map_err(Into::into)
    }

    pub async fn delete_vendor(&self, id: Uuid) -> Result<bool> {
        let result = VendorEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Attachment Operations
    // ========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn create_attachment(
        &self,
        file_name: String,
        stored_path: String,
        content_type: Option<String>,
        size_bytes: i64,
        store_id: Option<Uuid>,
        uploaded_by: Option<String>,
    ) -> Result<Attachment> {
        let attachment = AttachmentActiveModel {
            id: Set(Uuid::new_v4()),
            file_name: Set(file_name),
            stored_path: Set(stored_path),
            content_type: Set(content_type),
            size_bytes: Set(size_bytes),
            store_id: Set(store_id),
            uploaded_by: Set(uploaded_by),
            created_at: Set(Self::now()),
        };
        attachment
            .insert(self.write_conn())
            .await
            .map_err(Into::into)
    }
}
