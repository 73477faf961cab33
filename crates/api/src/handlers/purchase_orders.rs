//! Purchase order handlers
//!
//! Purchase orders carry a per-store sequential number and a forward-only
//! approval chain. Receiving an order credits linked inventory items.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::handlers::assets::ListQuery;
use crate::AppState;
use storekeep_common::auth::Principal;
use storekeep_common::db::models::{PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus};
use storekeep_common::db::repository::NewPurchaseOrderLine;
use storekeep_common::db::Repository;
use storekeep_common::errors::{AppError, Result};

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePurchaseOrderRequest {
    pub store_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub notes: Option<String>,

    #[validate(length(min = 1))]
    pub lines: Vec<LineInput>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LineInput {
    pub description: String,
    pub inventory_item_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePurchaseOrderRequest {
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct PurchaseOrderResponse {
    pub success: bool,
    pub purchase_order: PurchaseOrder,
    pub lines: Vec<PurchaseOrderLine>,
}

#[derive(Serialize)]
pub struct ListPurchaseOrdersResponse {
    pub success: bool,
    pub purchase_orders: Vec<PurchaseOrder>,
}

/// List purchase orders in scope. Fails soft on read errors.
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> Json<ListPurchaseOrdersResponse> {
    let repo = Repository::new(state.db.clone());
    let scope = principal.scope().narrowed(query.store_id);

    let purchase_orders = match repo.list_purchase_orders(&scope).await {
        Ok(orders) => orders,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list purchase orders, returning empty");
            Vec::new()
        }
    };

    Json(ListPurchaseOrdersResponse {
        success: true,
        purchase_orders,
    })
}

pub async fn create_purchase_order(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreatePurchaseOrderRequest>,
) -> Result<(StatusCode, Json<PurchaseOrderResponse>)> {
    principal.require_admin_like()?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let store_id = principal.scope().target_store(request.store_id)?;

    if let Some(vendor_id) = request.vendor_id {
        repo.find_vendor_by_id(vendor_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Vendor",
                id: vendor_id.to_string(),
            })?;
    }

    let mut lines = Vec::with_capacity(request.lines.len());
    for (index, line) in request.lines.into_iter().enumerate() {
        if line.description.trim().is_empty() {
            return Err(AppError::Validation {
                message: format!("Line {}: description is required", index + 1),
                field: Some("lines".to_string()),
            });
        }
        if line.quantity < 1 {
            return Err(AppError::Validation {
                message: format!("Line {}: quantity must be at least 1", index + 1),
                field: Some("lines".to_string()),
            });
        }
        if let Some(item_id) = line.inventory_item_id {
            let item = repo
                .find_inventory_item_by_id(item_id)
                .await?
                .ok_or_else(|| AppError::NotFound {
                    resource: "Inventory item",
                    id: item_id.to_string(),
                })?;
            if item.store_id != store_id {
                return Err(AppError::StoreMismatch {
                    message: "Inventory item does not belong to this store".to_string(),
                });
            }
        }
        lines.push(NewPurchaseOrderLine {
            description: line.description,
            inventory_item_id: line.inventory_item_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
        });
    }

    let po_number = repo.next_po_number(store_id).await?;
    let (purchase_order, lines) = repo
        .create_purchase_order(store_id, po_number, request.vendor_id, request.notes, lines)
        .await?;

    tracing::info!(
        purchase_order_id = %purchase_order.id,
        po_number,
        store_id = %store_id,
        "Purchase order created"
    );

    Ok((
        StatusCode::CREATED,
        Json(PurchaseOrderResponse {
            success: true,
            purchase_order,
            lines,
        }),
    ))
}

pub async fn get_purchase_order(
    State(state): State<AppState>,
    principal: Principal,
    Path(purchase_order_id): Path<Uuid>,
) -> Result<Json<PurchaseOrderResponse>> {
    let repo = Repository::new(state.db.clone());

    let purchase_order = repo
        .find_purchase_order_by_id(purchase_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Purchase order",
            id: purchase_order_id.to_string(),
        })?;

    principal.scope().check(Some(purchase_order.store_id))?;

    let lines = repo.list_purchase_order_lines(purchase_order_id).await?;

    Ok(Json(PurchaseOrderResponse {
        success: true,
        purchase_order,
        lines,
    }))
}

/// Advance the approval chain. Moving to Received credits each line's
/// linked inventory item by the ordered quantity.
pub async fn update_purchase_order(
    State(state): State<AppState>,
    principal: Principal,
    Path(purchase_order_id): Path<Uuid>,
    Json(update): Json<UpdatePurchaseOrderRequest>,
) -> Result<Json<PurchaseOrderResponse>> {
    principal.require_admin_like()?;

    let repo = Repository::new(state.db.clone());
    let existing = repo
        .find_purchase_order_by_id(purchase_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Purchase order",
            id: purchase_order_id.to_string(),
        })?;
    principal.scope().check(Some(existing.store_id))?;

    let raw = update.status.ok_or_else(|| AppError::MissingField {
        field: "status".to_string(),
    })?;
    let to = PurchaseOrderStatus::parse(&raw).ok_or_else(|| AppError::Validation {
        message: format!("Invalid purchase order status: {}", raw),
        field: Some("status".to_string()),
    })?;

    let from = existing.po_status();
    if !from.can_transition(to) {
        return Err(AppError::InvalidTransition {
            entity: "purchase order",
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        });
    }

    let lines = repo.list_purchase_order_lines(purchase_order_id).await?;

    // Receipt credits stock once, guarded by the forward-only chain
    if to == PurchaseOrderStatus::Received && from != PurchaseOrderStatus::Received {
        for line in &lines {
            if let Some(item_id) = line.inventory_item_id {
                repo.adjust_inventory_quantity(item_id, line.quantity).await?;
            }
        }
    }

    let purchase_order = repo.set_purchase_order_status(purchase_order_id, to).await?;

    tracing::info!(
        purchase_order_id = %purchase_order.id,
        status = %purchase_order.status,
        "Purchase order updated"
    );

    Ok(Json(PurchaseOrderResponse {
        success: true,
        purchase_order,
        lines,
    }))
}
