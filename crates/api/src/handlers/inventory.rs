//! Inventory item handlers

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::handlers::assets::{ImportResponse, ListQuery};
use crate::services::import;
use crate::AppState;
use storekeep_common::auth::Principal;
use storekeep_common::db::models::InventoryItem;
use storekeep_common::db::repository::InventoryItemUpdate;
use storekeep_common::db::Repository;
use storekeep_common::errors::{AppError, Result};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(length(min = 1, max = 100))]
    pub part_number: String,

    #[serde(default)]
    pub quantity_on_hand: i32,

    #[serde(default)]
    pub reorder_threshold: i32,

    pub store_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub part_number: Option<String>,
    pub reorder_threshold: Option<i32>,
    /// Signed delta applied to quantity on hand
    pub quantity_delta: Option<i32>,
}

#[derive(Serialize)]
pub struct ItemResponse {
    pub success: bool,
    pub item: InventoryItem,
}

#[derive(Serialize)]
pub struct ListItemsResponse {
    pub success: bool,
    pub items: Vec<InventoryItem>,
}

/// List inventory in scope. Fails soft on read errors.
pub async fn list_items(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> Json<ListItemsResponse> {
    let repo = Repository::new(state.db.clone());
    let scope = principal.scope().narrowed(query.store_id);

    let items = match repo.list_inventory_items(&scope).await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list inventory, returning empty");
            Vec::new()
        }
    };

    Json(ListItemsResponse {
        success: true,
        items,
    })
}

pub async fn create_item(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>)> {
    principal.require_admin_like()?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    if request.quantity_on_hand < 0 {
        return Err(AppError::Validation {
            message: "quantity_on_hand cannot be negative".to_string(),
            field: Some("quantity_on_hand".to_string()),
        });
    }

    let repo = Repository::new(state.db.clone());
    let store_id = principal.scope().target_store(request.store_id)?;

    // Part numbers are the natural key within a store
    if repo
        .find_inventory_item_by_part_number(store_id, &request.part_number)
        .await?
        .is_some()
    {
        return Err(AppError::Duplicate {
            message: format!(
                "An inventory item with part number {} already exists in this store",
                request.part_number
            ),
        });
    }

    let item = repo
        .create_inventory_item(
            store_id,
            request.name,
            request.part_number,
            request.quantity_on_hand,
            request.reorder_threshold,
        )
        .await?;

    tracing::info!(item_id = %item.id, store_id = %store_id, "Inventory item created");

    Ok((
        StatusCode::CREATED,
        Json(ItemResponse {
            success: true,
            item,
        }),
    ))
}

pub async fn get_item(
    State(state): State<AppState>,
    principal: Principal,
    Path(item_id): Path<Uuid>,
) -> Result<Json<ItemResponse>> {
    let repo = Repository::new(state.db.clone());

    let item = repo
        .find_inventory_item_by_id(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Inventory item",
            id: item_id.to_string(),
        })?;

    principal.scope().check(Some(item.store_id))?;

    Ok(Json(ItemResponse {
        success: true,
        item,
    }))
}

pub async fn update_item(
    State(state): State<AppState>,
    principal: Principal,
    Path(item_id): Path<Uuid>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<ItemResponse>> {
    principal.require_admin_like()?;

    let repo = Repository::new(state.db.clone());
    let existing = repo
        .find_inventory_item_by_id(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Inventory item",
            id: item_id.to_string(),
        })?;
    principal.scope().check(Some(existing.store_id))?;

    let mut item = repo
        .update_inventory_item(
            item_id,
            InventoryItemUpdate {
                name: request.name,
                part_number: request.part_number,
                reorder_threshold: request.reorder_threshold,
            },
        )
        .await?;

    if let Some(delta) = request.quantity_delta {
        item = repo.adjust_inventory_quantity(item_id, delta).await?;
    }

    tracing::info!(item_id = %item.id, "Inventory item updated");

    Ok(Json(ItemResponse {
        success: true,
        item,
    }))
}

pub async fn delete_item(
    State(state): State<AppState>,
    principal: Principal,
    Path(item_id): Path<Uuid>,
) -> Result<StatusCode> {
    principal.require_admin_like()?;

    let repo = Repository::new(state.db.clone());
    let item = repo
        .find_inventory_item_by_id(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Inventory item",
            id: item_id.to_string(),
        })?;
    principal.scope().check(Some(item.store_id))?;

    repo.delete_inventory_item(item_id).await?;

    tracing::info!(item_id = %item_id, "Inventory item deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Spreadsheet import for inventory items
pub async fn bulk_import(
    State(state): State<AppState>,
    principal: Principal,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>> {
    principal.require_admin_like()?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut requested_store: Option<Uuid> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::ImportParse {
            message: format!("Malformed multipart body: {}", e),
        }
    })? {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload.xlsx").to_string();
                let bytes = field.bytes().await.map_err(|e| AppError::ImportParse {
                    message: format!("Failed to read upload: {}", e),
                })?;
                file = Some((file_name, bytes.to_vec()));
            }
            Some("store_id") => {
                let raw = field.text().await.map_err(|e| AppError::ImportParse {
                    message: format!("Failed to read store_id field: {}", e),
                })?;
                requested_store =
                    Some(Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidFormat {
                        message: format!("Invalid store_id: {}", raw),
                    })?);
            }
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| AppError::MissingField {
        field: "file".to_string(),
    })?;
    let store_id = principal.scope().target_store(requested_store)?;

    let repo = Repository::new(state.db.clone());
    let report = import::import_inventory(&repo, store_id, &file_name, &bytes).await?;

    storekeep_common::metrics::record_import_rows(
        "inventory",
        report.success_count,
        report.failed_count,
    );
    tracing::info!(
        store_id = %store_id,
        imported = report.success_count,
        failed = report.failed_count,
        "Inventory import finished"
    );

    Ok(Json(report.into()))
}
