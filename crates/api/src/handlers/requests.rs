//! Maintenance request handlers
//!
//! Requests carry a global sequential number and may convert 1:1 into a
//! work order once approved. Confirmation mail is best-effort.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::handlers::assets::ListQuery;
use crate::AppState;
use storekeep_common::auth::Principal;
use storekeep_common::db::models::{Request, RequestStatus};
use storekeep_common::db::Repository;
use storekeep_common::errors::{AppError, Result};
use storekeep_common::mailer::MailMessage;
use storekeep_common::metrics::{record_mail, record_work_order_created};
use storekeep_common::workorders::{Priority, WorkOrderStatus};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequestRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,

    #[validate(length(min = 1, max = 10000))]
    pub description: String,

    pub asset_id: Option<Uuid>,
    pub priority: Option<String>,
    pub store_id: Option<Uuid>,

    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequestRequest {
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct RequestResponse {
    pub success: bool,
    pub request: Request,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_order_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct ListRequestsResponse {
    pub success: bool,
    pub requests: Vec<Request>,
}

/// Mail failures are logged and counted, never surfaced to the caller
async fn notify(state: &AppState, to: &str, subject: String, body: String) {
    let message = MailMessage {
        to: to.to_string(),
        subject,
        body,
    };
    match state.mailer.send(&message).await {
        Ok(()) => record_mail(true),
        Err(e) => {
            record_mail(false);
            tracing::warn!(error = %e, to = %message.to, "Failed to send notification mail");
        }
    }
}

/// List maintenance requests in scope. Fails soft on read errors.
pub async fn list_requests(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> Json<ListRequestsResponse> {
    let repo = Repository::new(state.db.clone());
    let scope = principal.scope().narrowed(query.store_id);

    let requests = match repo.list_requests(&scope).await {
        Ok(requests) => requests,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list requests, returning empty");
            Vec::new()
        }
    };

    Json(ListRequestsResponse {
        success: true,
        requests,
    })
}

pub async fn create_request(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateRequestRequest>,
) -> Result<(StatusCode, Json<RequestResponse>)> {
    principal.require_can_create_requests()?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let priority = match request.priority.as_deref() {
        None => Priority::Medium,
        Some(raw) => Priority::parse(raw).ok_or_else(|| AppError::Validation {
            message: format!("Invalid priority: {}", raw),
            field: Some("priority".to_string()),
        })?,
    };

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

    let request_number = repo.next_request_number().await?;
    let created = repo
        .create_request(
            request_number,
            request.title,
            request.description,
            request.asset_id,
            priority,
            Some(store_id),
            principal.email().to_string(),
            serde_json::json!(request.attachments),
        )
        .await?;

    tracing::info!(
        request_id = %created.id,
        request_number,
        store_id = %store_id,
        "Maintenance request submitted"
    );

    notify(
        &state,
        principal.email(),
        format!("Maintenance request #{} received", request_number),
        format!(
            "Your maintenance request \"{}\" was submitted and is awaiting review.",
            created.title
        ),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(RequestResponse {
            success: true,
            request: created,
            work_order_id: None,
        }),
    ))
}

pub async fn get_request(
    State(state): State<AppState>,
    principal: Principal,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestResponse>> {
    let repo = Repository::new(state.db.clone());

    let request = repo
        .find_request_by_id(request_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Request",
            id: request_id.to_string(),
        })?;

    principal.scope().check(request.store_id)?;

    let work_order_id = request.work_order_id;
    Ok(Json(RequestResponse {
        success: true,
        request,
        work_order_id,
    }))
}

/// Review a request. `Converted` spawns the linked work order.
pub async fn update_request(
    State(state): State<AppState>,
    principal: Principal,
    Path(request_id): Path<Uuid>,
    Json(update): Json<UpdateRequestRequest>,
) -> Result<Json<RequestResponse>> {
    principal.require_admin_like()?;

    let repo = Repository::new(state.db.clone());
    let existing = repo
        .find_request_by_id(request_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Request",
            id: request_id.to_string(),
        })?;
    principal.scope().check(existing.store_id)?;

    let raw = update.status.ok_or_else(|| AppError::MissingField {
        field: "status".to_string(),
    })?;
    let to = RequestStatus::parse(&raw).ok_or_else(|| AppError::Validation {
        message: format!("Invalid request status: {}", raw),
        field: Some("status".to_string()),
    })?;

    let from = existing.request_status();
    if !from.can_transition(to) {
        return Err(AppError::InvalidTransition {
            entity: "request",
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        });
    }

    // Conversion creates exactly one work order and links it back
    let work_order_id = if to == RequestStatus::Converted {
        let priority =
            Priority::parse(&existing.priority).unwrap_or(Priority::Medium);
        let work_order = repo
            .create_work_order(
                existing.title.clone(),
                Some(existing.description.clone()),
                WorkOrderStatus::Open,
                priority,
                existing.asset_id,
                existing.store_id,
                None,
                Some(existing.created_by.clone()),
                None,
            )
            .await?;
        record_work_order_created("request");
        tracing::info!(
            request_id = %request_id,
            work_order_id = %work_order.id,
            "Request converted to work order"
        );
        Some(work_order.id)
    } else {
        None
    };

    let updated = repo.set_request_status(request_id, to, work_order_id).await?;

    notify(
        &state,
        &updated.created_by,
        format!(
            "Maintenance request #{} {}",
            updated.request_number,
            to.as_str().to_lowercase()
        ),
        format!(
            "Your maintenance request \"{}\" is now {}.",
            updated.title,
            to.as_str()
        ),
    )
    .await;

    let work_order_id = updated.work_order_id;
    Ok(Json(RequestResponse {
        success: true,
        request: updated,
        work_order_id,
    }))
}
