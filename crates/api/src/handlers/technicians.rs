//! Technician handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::handlers::assets::ListQuery;
use crate::AppState;
use storekeep_common::auth::Principal;
use storekeep_common::db::models::Technician;
use storekeep_common::db::Repository;
use storekeep_common::errors::{AppError, Result};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTechnicianRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(email)]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub store_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct TechnicianResponse {
    pub success: bool,
    pub technician: Technician,
}

#[derive(Serialize)]
pub struct ListTechniciansResponse {
    pub success: bool,
    pub technicians: Vec<Technician>,
}

/// List technicians in scope. Fails soft on read errors.
pub async fn list_technicians(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> Json<ListTechniciansResponse> {
    let repo = Repository::new(state.db.clone());
    let scope = principal.scope().narrowed(query.store_id);

    let technicians = match repo.list_technicians(&scope).await {
        Ok(technicians) => technicians,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list technicians, returning empty");
            Vec::new()
        }
    };

    Json(ListTechniciansResponse {
        success: true,
        technicians,
    })
}

pub async fn create_technician(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateTechnicianRequest>,
) -> Result<(StatusCode, Json<TechnicianResponse>)> {
    principal.require_admin_like()?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let store_id = principal.scope().target_store(request.store_id)?;

    let technician = repo
        .create_technician(store_id, request.name, request.email, request.phone)
        .await?;

    tracing::info!(
        technician_id = %technician.id,
        store_id = %store_id,
        "Technician created"
    );

    Ok((
        StatusCode::CREATED,
        Json(TechnicianResponse {
            success: true,
            technician,
        }),
    ))
}

pub async fn delete_technician(
    State(state): State<AppState>,
    principal: Principal,
    Path(technician_id): Path<Uuid>,
) -> Result<StatusCode> {
    principal.require_admin_like()?;

    let repo = Repository::new(state.db.clone());
    let technician = repo
        .find_technician_by_id(technician_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Technician",
            id: technician_id.to_string(),
        })?;
    principal.scope().check(Some(technician.store_id))?;

    repo.delete_technician(technician_id).await?;

    tracing::info!(technician_id = %technician_id, "Technician deleted");
    Ok(StatusCode::NO_CONTENT)
}
