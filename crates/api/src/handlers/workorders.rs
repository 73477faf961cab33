//! Work order handlers
//!
//! Covers the authenticated CRUD surface plus the two unauthenticated
//! entry points: QR-keyed public intake and share-token read-only views.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::handlers::assets::ListQuery;
use crate::AppState;
use storekeep_common::auth::{self, Principal, Role};
use storekeep_common::db::models::{Note, WorkOrder};
use storekeep_common::db::repository::{AssigneeChange, WorkOrderUpdate};
use storekeep_common::db::Repository;
use storekeep_common::errors::{AppError, Result};
use storekeep_common::metrics::record_work_order_created;
use storekeep_common::workorders::{validate_transition, Priority, WorkOrderStatus};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkOrderRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,

    pub description: Option<String>,
    pub priority: Option<String>,
    pub asset_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub assigned_to_id: Option<Uuid>,
    pub due_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWorkOrderRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<chrono::NaiveDate>,
    /// Technician id to assign, or the empty string to disconnect
    pub assigned_to_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PublicWorkOrderRequest {
    /// The store's QR intake token
    #[validate(length(min = 1))]
    pub store: String,

    #[validate(length(min = 1, max = 300))]
    pub title: String,

    pub description: Option<String>,
    pub priority: Option<String>,
    pub asset_id: Option<Uuid>,
    pub requested_by: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddNoteRequest {
    #[validate(length(min = 1, max = 5000))]
    pub body: String,
}

/// A work order as rendered to clients: the persisted row plus the
/// display-layer status label
#[derive(Serialize)]
pub struct WorkOrderView {
    #[serde(flatten)]
    pub work_order: WorkOrder,
    pub display_status: &'static str,
}

impl From<WorkOrder> for WorkOrderView {
    fn from(work_order: WorkOrder) -> Self {
        let display_status = work_order.work_order_status().display_label();
        Self {
            work_order,
            display_status,
        }
    }
}

#[derive(Serialize)]
pub struct WorkOrderResponse {
    pub success: bool,
    pub work_order: WorkOrderView,
}

#[derive(Serialize)]
pub struct ListWorkOrdersResponse {
    pub success: bool,
    pub work_orders: Vec<WorkOrderView>,
}

#[derive(Serialize)]
pub struct ShareLinkResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_url: Option<String>,
}

#[derive(Serialize)]
pub struct NotesResponse {
    pub success: bool,
    pub notes: Vec<Note>,
}

#[derive(Serialize)]
pub struct NoteResponse {
    pub success: bool,
    pub note: Note,
}

fn parse_priority(raw: Option<&str>) -> Result<Priority> {
    match raw {
        None => Ok(Priority::Medium),
        Some(raw) => Priority::parse(raw).ok_or_else(|| AppError::Validation {
            message: format!("Invalid priority: {}", raw),
            field: Some("priority".to_string()),
        }),
    }
}

/// Vendors cannot touch work orders at all
fn require_work_order_access(principal: &Principal) -> Result<()> {
    if principal.role() == Role::Vendor {
        return Err(AppError::Forbidden {
            message: "Vendors cannot access work orders".to_string(),
        });
    }
    Ok(())
}

/// List work orders in scope. Technicians see only their own assignments.
/// Fails soft on read errors.
pub async fn list_work_orders(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListWorkOrdersResponse>> {
    require_work_order_access(&principal)?;

    let repo = Repository::new(state.db.clone());
    let scope = principal.scope().narrowed(query.store_id);

    let result = match principal.technician_id() {
        Some(technician_id) => {
            repo.list_work_orders_for_technician(&scope, technician_id)
                .await
        }
        None => repo.list_work_orders(&scope).await,
    };

    let work_orders = match result {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list work orders, returning empty");
            Vec::new()
        }
    };

    Ok(Json(ListWorkOrdersResponse {
        success: true,
        work_orders: work_orders.into_iter().map(Into::into).collect(),
    }))
}

pub async fn create_work_order(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateWorkOrderRequest>,
) -> Result<(StatusCode, Json<WorkOrderResponse>)> {
    principal.require_can_create_work_orders()?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let priority = parse_priority(request.priority.as_deref())?;

    let repo = Repository::new(state.db.clone());
    let store_id = principal.scope().target_store(request.store_id)?;

    if let Some(asset_id) = request.asset_id {
        let asset = repo
            .find_asset_by_id(asset_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Asset",
                id: asset_id.to_string(),
            })?;
        if asset.store_id != store_id {
            return Err(AppError::StoreMismatch {
                message: "Asset does not belong to this store".to_string(),
            });
        }
    }

    if let Some(technician_id) = request.assigned_to_id {
        let technician = repo
            .find_technician_by_id(technician_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Technician",
                id: technician_id.to_string(),
            })?;
        principal.scope().check(Some(technician.store_id))?;
    }

    let work_order = repo
        .create_work_order(
            request.title,
            request.description,
            WorkOrderStatus::Open,
            priority,
            request.asset_id,
            Some(store_id),
            request.assigned_to_id,
            Some(principal.email().to_string()),
            request.due_date,
        )
        .await?;

    record_work_order_created("manual");
    tracing::info!(work_order_id = %work_order.id, store_id = %store_id, "Work order created");

    Ok((
        StatusCode::CREATED,
        Json(WorkOrderResponse {
            success: true,
            work_order: work_order.into(),
        }),
    ))
}

pub async fn get_work_order(
    State(state): State<AppState>,
    principal: Principal,
    Path(work_order_id): Path<Uuid>,
) -> Result<Json<WorkOrderResponse>> {
    require_work_order_access(&principal)?;

    let repo = Repository::new(state.db.clone());
    let work_order = repo
        .find_work_order_by_id(work_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Work order",
            id: work_order_id.to_string(),
        })?;

    principal.scope().check(work_order.store_id)?;

    Ok(Json(WorkOrderResponse {
        success: true,
        work_order: work_order.into(),
    }))
}

/// Field update with transition validation. A payload that does not change
/// status bypasses the transition check. Completing an order here does NOT
/// stamp `completed_at`; that is left to the flows that need it.
pub async fn update_work_order(
    State(state): State<AppState>,
    principal: Principal,
    Path(work_order_id): Path<Uuid>,
    Json(request): Json<UpdateWorkOrderRequest>,
) -> Result<Json<WorkOrderResponse>> {
    require_work_order_access(&principal)?;
    if principal.role() == Role::User {
        return Err(AppError::Forbidden {
            message: "Your role cannot update work orders".to_string(),
        });
    }

    let repo = Repository::new(state.db.clone());
    let existing = repo
        .find_work_order_by_id(work_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Work order",
            id: work_order_id.to_string(),
        })?;
    principal.scope().check(existing.store_id)?;

    let status = match request.status.as_deref() {
        None => None,
        Some(raw) => {
            let to = WorkOrderStatus::parse(raw).ok_or_else(|| AppError::Validation {
                message: format!("Invalid work order status: {}", raw),
                field: Some("status".to_string()),
            })?;
            validate_transition(existing.work_order_status(), to)?;
            Some(to)
        }
    };

    let priority = match request.priority.as_deref() {
        None => None,
        Some(raw) => Some(parse_priority(Some(raw))?),
    };

    let assignee = match request.assigned_to_id.as_deref() {
        None => AssigneeChange::Keep,
        Some("") => AssigneeChange::Clear,
        Some(raw) => {
            let technician_id =
                Uuid::parse_str(raw).map_err(|_| AppError::InvalidFormat {
                    message: format!("Invalid technician id: {}", raw),
                })?;
            let technician = repo
                .find_technician_by_id(technician_id)
                .await?
                .ok_or_else(|| AppError::NotFound {
                    resource: "Technician",
                    id: technician_id.to_string(),
                })?;
            principal.scope().check(Some(technician.store_id))?;
            AssigneeChange::Set(technician_id)
        }
    };

    let work_order = repo
        .update_work_order(
            work_order_id,
            WorkOrderUpdate {
                title: request.title,
                description: request.description,
                status,
                priority,
                due_date: request.due_date,
                assignee,
                completed_at: None,
            },
        )
        .await?;

    tracing::info!(
        work_order_id = %work_order.id,
        status = %work_order.status,
        "Work order updated"
    );

    Ok(Json(WorkOrderResponse {
        success: true,
        work_order: work_order.into(),
    }))
}

pub async fn delete_work_order(
    State(state): State<AppState>,
    principal: Principal,
    Path(work_order_id): Path<Uuid>,
) -> Result<StatusCode> {
    principal.require_admin_like()?;

    let repo = Repository::new(state.db.clone());
    let work_order = repo
        .find_work_order_by_id(work_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Work order",
            id: work_order_id.to_string(),
        })?;
    principal.scope().check(work_order.store_id)?;

    repo.delete_work_order(work_order_id).await?;

    tracing::info!(work_order_id = %work_order_id, "Work order deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Public intake keyed by a store's QR token. An asset belonging to a
/// different store is rejected rather than silently re-homed.
pub async fn create_public_work_order(
    State(state): State<AppState>,
    Json(request): Json<PublicWorkOrderRequest>,
) -> Result<(StatusCode, Json<WorkOrderResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let priority = parse_priority(request.priority.as_deref())?;

    let repo = Repository::new(state.db.clone());
    let store = repo
        .find_store_by_qr_code(&request.store)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Store",
            id: request.store.clone(),
        })?;

    if let Some(asset_id) = request.asset_id {
        let asset = repo
            .find_asset_by_id(asset_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Asset",
                id: asset_id.to_string(),
            })?;
        if asset.store_id != store.id {
            return Err(AppError::StoreMismatch {
                message: "Asset does not belong to this store".to_string(),
            });
        }
    }

    let work_order = repo
        .create_work_order(
            request.title,
            request.description,
            WorkOrderStatus::Open,
            priority,
            request.asset_id,
            Some(store.id),
            None,
            request.requested_by,
            None,
        )
        .await?;

    record_work_order_created("public");
    tracing::info!(
        work_order_id = %work_order.id,
        store_id = %store.id,
        "Public work order submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(WorkOrderResponse {
            success: true,
            work_order: work_order.into(),
        }),
    ))
}

/// Unauthenticated read-only view keyed by share token
pub async fn get_shared_work_order(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<WorkOrderResponse>> {
    let repo = Repository::new(state.db.clone());
    let work_order = repo
        .find_work_order_by_share_token(&token)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Shared work order",
            id: token,
        })?;

    Ok(Json(WorkOrderResponse {
        success: true,
        work_order: work_order.into(),
    }))
}

fn share_url(state: &AppState, token: &str) -> String {
    format!(
        "{}/workorders/shared/{}",
        state.config.server.public_base_url.trim_end_matches('/'),
        token
    )
}

/// Issue a share token. Re-issuing returns the existing token unchanged.
pub async fn create_share_link(
    State(state): State<AppState>,
    principal: Principal,
    Path(work_order_id): Path<Uuid>,
) -> Result<Json<ShareLinkResponse>> {
    principal.require_admin_like()?;

    let repo = Repository::new(state.db.clone());
    let work_order = repo
        .find_work_order_by_id(work_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Work order",
            id: work_order_id.to_string(),
        })?;
    principal.scope().check(work_order.store_id)?;

    let token = match work_order.share_token {
        Some(token) => token,
        None => {
            let token = auth::generate_share_token();
            repo.set_work_order_share_token(work_order_id, Some(token.clone()))
                .await?;
            tracing::info!(work_order_id = %work_order_id, "Share link issued");
            token
        }
    };

    let url = share_url(&state, &token);
    Ok(Json(ShareLinkResponse {
        success: true,
        share_token: Some(token),
        share_url: Some(url),
    }))
}

pub async fn get_share_link(
    State(state): State<AppState>,
    principal: Principal,
    Path(work_order_id): Path<Uuid>,
) -> Result<Json<ShareLinkResponse>> {
    principal.require_admin_like()?;

    let repo = Repository::new(state.db.clone());
    let work_order = repo
        .find_work_order_by_id(work_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Work order",
            id: work_order_id.to_string(),
        })?;
    principal.scope().check(work_order.store_id)?;

    let share_url = work_order.share_token.as_deref().map(|t| share_url(&state, t));
    Ok(Json(ShareLinkResponse {
        success: true,
        share_token: work_order.share_token,
        share_url,
    }))
}

pub async fn revoke_share_link(
    State(state): State<AppState>,
    principal: Principal,
    Path(work_order_id): Path<Uuid>,
) -> Result<Json<ShareLinkResponse>> {
    principal.require_admin_like()?;

    let repo = Repository::new(state.db.clone());
    let work_order = repo
        .find_work_order_by_id(work_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Work order",
            id: work_order_id.to_string(),
        })?;
    principal.scope().check(work_order.store_id)?;

    repo.set_work_order_share_token(work_order_id, None).await?;

    tracing::info!(work_order_id = %work_order_id, "Share link revoked");
    Ok(Json(ShareLinkResponse {
        success: true,
        share_token: None,
        share_url: None,
    }))
}

pub async fn list_notes(
    State(state): State<AppState>,
    principal: Principal,
    Path(work_order_id): Path<Uuid>,
) -> Result<Json<NotesResponse>> {
    require_work_order_access(&principal)?;

    let repo = Repository::new(state.db.clone());
    let work_order = repo
        .find_work_order_by_id(work_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Work order",
            id: work_order_id.to_string(),
        })?;
    principal.scope().check(work_order.store_id)?;

    let notes = repo.list_notes(work_order_id).await?;

    Ok(Json(NotesResponse {
        success: true,
        notes,
    }))
}

pub async fn add_note(
    State(state): State<AppState>,
    principal: Principal,
    Path(work_order_id): Path<Uuid>,
    Json(request): Json<AddNoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>)> {
    require_work_order_access(&principal)?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let work_order = repo
        .find_work_order_by_id(work_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Work order",
            id: work_order_id.to_string(),
        })?;
    principal.scope().check(work_order.store_id)?;

    let note = repo
        .create_note(work_order_id, request.body, principal.email().to_string())
        .await?;

    tracing::info!(work_order_id = %work_order_id, note_id = %note.id, "Note added");

    Ok((
        StatusCode::CREATED,
        Json(NoteResponse {
            success: true,
            note,
        }),
    ))
}
