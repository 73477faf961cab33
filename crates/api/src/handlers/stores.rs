//! Store management handlers

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use storekeep_common::auth::{self, Principal, Role};
use storekeep_common::db::models::Store;
use storekeep_common::db::repository::StoreUpdate;
use storekeep_common::db::Repository;
use storekeep_common::errors::{AppError, Result};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStoreRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    pub code: Option<String>,

    pub district_id: Option<Uuid>,

    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStoreRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub district_id: Option<Option<Uuid>>,
    pub categories: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct StoreResponse {
    pub success: bool,
    pub store: Store,
}

#[derive(Serialize)]
pub struct ListStoresResponse {
    pub success: bool,
    pub stores: Vec<Store>,
}

/// List stores visible to the caller. Fails soft: a read error logs a
/// warning and renders as an empty list.
pub async fn list_stores(
    State(state): State<AppState>,
    principal: Principal,
) -> Json<ListStoresResponse> {
    let repo = Repository::new(state.db.clone());

    let stores = match repo.list_stores(&principal.scope()).await {
        Ok(stores) => stores,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list stores, returning empty");
            Vec::new()
        }
    };

    Json(ListStoresResponse {
        success: true,
        stores,
    })
}

/// Create a store. Only MASTER_ADMIN can add tenants.
pub async fn create_store(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<StoreResponse>)> {
    if principal.role() != Role::MasterAdmin {
        return Err(AppError::Forbidden {
            message: "Only a master administrator can create stores".to_string(),
        });
    }

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let store = repo
        .create_store(
            request.name,
            request.code,
            request.district_id,
            serde_json::json!(request.categories),
        )
        .await?;

    tracing::info!(store_id = %store.id, name = %store.name, "Store created");

    Ok((
        StatusCode::CREATED,
        Json(StoreResponse {
            success: true,
            store,
        }),
    ))
}

pub async fn get_store(
    State(state): State<AppState>,
    principal: Principal,
    Path(store_id): Path<Uuid>,
) -> Result<Json<StoreResponse>> {
    let repo = Repository::new(state.db.clone());

    let store = repo
        .find_store_by_id(store_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Store",
            id: store_id.to_string(),
        })?;

    principal.scope().check(Some(store.id))?;

    Ok(Json(StoreResponse {
        success: true,
        store,
    }))
}

pub async fn update_store(
    State(state): State<AppState>,
    principal: Principal,
    Path(store_id): Path<Uuid>,
    Json(request): Json<UpdateStoreRequest>,
) -> Result<Json<StoreResponse>> {
    principal.require_admin_like()?;
    principal.scope().check(Some(store_id))?;

    let repo = Repository::new(state.db.clone());
    let store = repo
        .update_store(
            store_id,
            StoreUpdate {
                name: request.name,
                code: request.code,
                district_id: request.district_id,
                categories: request.categories.map(|c| serde_json::json!(c)),
            },
        )
        .await?;

    tracing::info!(store_id = %store.id, "Store updated");

    Ok(Json(StoreResponse {
        success: true,
        store,
    }))
}

pub async fn delete_store(
    State(state): State<AppState>,
    principal: Principal,
    Path(store_id): Path<Uuid>,
) -> Result<StatusCode> {
    if principal.role() != Role::MasterAdmin {
        return Err(AppError::Forbidden {
            message: "Only a master administrator can delete stores".to_string(),
        });
    }

    let repo = Repository::new(state.db.clone());
    let deleted = repo.delete_store(store_id).await?;
    if !deleted {
        return Err(AppError::NotFound {
            resource: "Store",
            id: store_id.to_string(),
        });
    }

    tracing::info!(store_id = %store_id, "Store deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Generate (once) and return the store's public intake QR code as SVG.
/// The underlying token is stable after first assignment.
pub async fn store_qr(
    State(state): State<AppState>,
    principal: Principal,
    Path(store_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    principal.require_admin_like()?;
    principal.scope().check(Some(store_id))?;

    let repo = Repository::new(state.db.clone());
    let store = repo
        .ensure_store_qr_code(store_id, auth::generate_qr_token())
        .await?;

    let qr_code = store.qr_code.ok_or_else(|| AppError::Internal {
        message: "Store QR token missing after assignment".to_string(),
    })?;

    let intake_url = state.config.public_intake_url(&qr_code);

    let code = qrcode::QrCode::new(intake_url.as_bytes()).map_err(|e| AppError::Internal {
        message: format!("Failed to render QR code: {}", e),
    })?;
    let svg = code
        .render::<qrcode::render::svg::Color>()
        .min_dimensions(256, 256)
        .build();

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}
