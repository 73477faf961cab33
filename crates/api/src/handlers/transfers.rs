//! Inter-store transfer handlers
//!
//! An ASSET transfer re-homes the asset row; an INVENTORY transfer applies a
//! quantity delta to the source and destination items, creating the
//! destination item on first transfer.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::assets::ListQuery;
use crate::AppState;
use storekeep_common::auth::Principal;
use storekeep_common::db::models::{Transfer, TransferKind};
use storekeep_common::db::Repository;
use storekeep_common::errors::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    /// ASSET or INVENTORY
    pub kind: String,

    pub asset_id: Option<Uuid>,
    pub inventory_item_id: Option<Uuid>,

    #[serde(default)]
    pub quantity: i32,

    pub from_store_id: Option<Uuid>,
    pub to_store_id: Uuid,
    pub work_order_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct TransferResponse {
    pub success: bool,
    pub transfer: Transfer,
}

#[derive(Serialize)]
pub struct ListTransfersResponse {
    pub success: bool,
    pub transfers: Vec<Transfer>,
}

/// List transfers touching the scoped store. Fails soft on read errors.
pub async fn list_transfers(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> Json<ListTransfersResponse> {
    let repo = Repository::new(state.db.clone());
    let scope = principal.scope().narrowed(query.store_id);

    let transfers = match repo.list_transfers(&scope).await {
        Ok(transfers) => transfers,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list transfers, returning empty");
            Vec::new()
        }
    };

    Json(ListTransfersResponse {
        success: true,
        transfers,
    })
}

pub async fn create_transfer(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateTransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>)> {
    principal.require_admin_like()?;

    let kind = TransferKind::parse(&request.kind).ok_or_else(|| AppError::Validation {
        message: format!("Invalid transfer kind: {}", request.kind),
        field: Some("kind".to_string()),
    })?;

    let repo = Repository::new(state.db.clone());
    let from_store_id = principal.scope().target_store(request.from_store_id)?;
    let to_store_id = request.to_store_id;

    if from_store_id == to_store_id {
        return Err(AppError::Validation {
            message: "Source and destination stores must differ".to_string(),
            field: Some("to_store_id".to_string()),
        });
    }

    // Independent reads, fetched concurrently
    let (from_store, to_store) = futures::try_join!(
        repo.find_store_by_id(from_store_id),
        repo.find_store_by_id(to_store_id)
    )?;
    from_store.ok_or_else(|| AppError::NotFound {
        resource: "Store",
        id: from_store_id.to_string(),
    })?;
    to_store.ok_or_else(|| AppError::NotFound {
        resource: "Store",
        id: to_store_id.to_string(),
    })?;

    let transfer = match kind {
        TransferKind::Asset => {
            let asset_id = request.asset_id.ok_or_else(|| AppError::MissingField {
                field: "asset_id".to_string(),
            })?;
            let asset = repo
                .find_asset_by_id(asset_id)
                .await?
                .ok_or_else(|| AppError::NotFound {
                    resource: "Asset",
                    id: asset_id.to_string(),
                })?;
            if asset.store_id != from_store_id {
                return Err(AppError::StoreMismatch {
                    message: "Asset does not belong to the source store".to_string(),
                });
            }

            repo.move_asset_to_store(asset_id, to_store_id).await?;

            repo.create_transfer(
                kind,
                Some(asset_id),
                None,
                1,
                from_store_id,
                to_store_id,
                request.work_order_id,
            )
            .await?
        }
        TransferKind::Inventory => {
            let item_id = request
                .inventory_item_id
                .ok_or_else(|| AppError::MissingField {
                    field: "inventory_item_id".to_string(),
                })?;
            if request.quantity < 1 {
                return Err(AppError::Validation {
                    message: "Transfer quantity must be at least 1".to_string(),
                    field: Some("quantity".to_string()),
                });
            }

            let source = repo
                .find_inventory_item_by_id(item_id)
                .await?
                .ok_or_else(|| AppError::NotFound {
                    resource: "Inventory item",
                    id: item_id.to_string(),
                })?;
            if source.store_id != from_store_id {
                return Err(AppError::StoreMismatch {
                    message: "Inventory item does not belong to the source store".to_string(),
                });
            }

            // Debit first so insufficient stock rejects before any write
            // lands on the destination
            repo.adjust_inventory_quantity(item_id, -request.quantity)
                .await?;

            let destination = match repo
                .find_inventory_item_by_part_number(to_store_id, &source.part_number)
                .await?
            {
                Some(existing) => existing,
                None => {
                    repo.create_inventory_item(
                        to_store_id,
                        source.name.clone(),
                        source.part_number.clone(),
                        0,
                        source.reorder_threshold,
                    )
                    .await?
                }
            };
            repo.adjust_inventory_quantity(destination.id, request.quantity)
                .await?;

            repo.create_transfer(
                kind,
                None,
                Some(item_id),
                request.quantity,
                from_store_id,
                to_store_id,
                request.work_order_id,
            )
            .await?
        }
    };

    tracing::info!(
        transfer_id = %transfer.id,
        kind = %transfer.kind,
        from = %from_store_id,
        to = %to_store_id,
        "Transfer recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(TransferResponse {
            success: true,
            transfer,
        }),
    ))
}
