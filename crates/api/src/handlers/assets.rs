//! Asset management handlers

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::services::import::{self, ImportReport};
use crate::AppState;
use storekeep_common::auth::Principal;
use storekeep_common::db::models::{Asset, AssetStatus};
use storekeep_common::db::repository::AssetUpdate;
use storekeep_common::db::Repository;
use storekeep_common::errors::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Optional narrowing for unrestricted callers; ignored for scoped ones
    pub store_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssetRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    pub status: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub serial_number: Option<String>,
    pub store_id: Option<Uuid>,
    pub parent_asset_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAssetRequest {
    pub name: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub serial_number: Option<String>,
    pub parent_asset_id: Option<Option<Uuid>>,
}

#[derive(Serialize)]
pub struct AssetResponse {
    pub success: bool,
    pub asset: Asset,
}

#[derive(Serialize)]
pub struct ListAssetsResponse {
    pub success: bool,
    pub assets: Vec<Asset>,
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub success_count: usize,
    pub failed_count: usize,
    pub errors: Vec<String>,
}

impl From<ImportReport> for ImportResponse {
    fn from(report: ImportReport) -> Self {
        Self {
            success: true,
            success_count: report.success_count,
            failed_count: report.failed_count,
            errors: report.errors,
        }
    }
}

fn parse_status(raw: &str) -> Result<AssetStatus> {
    AssetStatus::parse(raw).ok_or_else(|| AppError::Validation {
        message: format!("Invalid asset status: {}", raw),
        field: Some("status".to_string()),
    })
}

/// List assets in scope. Fails soft on read errors.
pub async fn list_assets(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> Json<ListAssetsResponse> {
    let repo = Repository::new(state.db.clone());
    let scope = principal.scope().narrowed(query.store_id);

    let assets = match repo.list_assets(&scope).await {
        Ok(assets) => assets,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list assets, returning empty");
            Vec::new()
        }
    };

    Json(ListAssetsResponse {
        success: true,
        assets,
    })
}

/// Create an asset with a per-store sequential asset number
pub async fn create_asset(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateAssetRequest>,
) -> Result<(StatusCode, Json<AssetResponse>)> {
    principal.require_admin_like()?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let status = match request.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => AssetStatus::Active,
    };

    let repo = Repository::new(state.db.clone());
    let store_id = principal.scope().target_store(request.store_id)?;

    let asset_no = repo.next_asset_no(store_id).await?;
    let asset = repo
        .create_asset(
            store_id,
            asset_no,
            request.name,
            status,
            request.category,
            request.location,
            request.serial_number,
            request.parent_asset_id,
        )
        .await?;

    tracing::info!(asset_id = %asset.id, store_id = %store_id, asset_no, "Asset created");

    Ok((
        StatusCode::CREATED,
        Json(AssetResponse {
            success: true,
            asset,
        }),
    ))
}

pub async fn get_asset(
    State(state): State<AppState>,
    principal: Principal,
    Path(asset_id): Path<Uuid>,
) -> Result<Json<AssetResponse>> {
    let repo = Repository::new(state.db.clone());

    let asset = repo
        .find_asset_by_id(asset_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Asset",
            id: asset_id.to_string(),
        })?;

    principal.scope().check(Some(asset.store_id))?;

    Ok(Json(AssetResponse {
        success: true,
        asset,
    }))
}

pub async fn update_asset(
    State(state): State<AppState>,
    principal: Principal,
    Path(asset_id): Path<Uuid>,
    Json(request): Json<UpdateAssetRequest>,
) -> Result<Json<AssetResponse>> {
    principal.require_admin_like()?;

    let repo = Repository::new(state.db.clone());
    let existing = repo
        .find_asset_by_id(asset_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Asset",
            id: asset_id.to_string(),
        })?;
    principal.scope().check(Some(existing.store_id))?;

    let status = request.status.as_deref().map(parse_status).transpose()?;

    let asset = repo
        .update_asset(
            asset_id,
            AssetUpdate {
                name: request.name,
                status,
                category: request.category,
                location: request.location,
                serial_number: request.serial_number,
                parent_asset_id: request.parent_asset_id,
            },
        )
        .await?;

    tracing::info!(asset_id = %asset.id, "Asset updated");

    Ok(Json(AssetResponse {
        success: true,
        asset,
    }))
}

pub async fn delete_asset(
    State(state): State<AppState>,
    principal: Principal,
    Path(asset_id): Path<Uuid>,
) -> Result<StatusCode> {
    principal.require_admin_like()?;

    let repo = Repository::new(state.db.clone());
    let asset = repo
        .find_asset_by_id(asset_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Asset",
            id: asset_id.to_string(),
        })?;
    principal.scope().check(Some(asset.store_id))?;

    repo.delete_asset(asset_id).await?;

    tracing::info!(asset_id = %asset_id, "Asset deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Spreadsheet import: xlsx or csv chosen by the uploaded file's name.
/// Row failures never abort the batch; the report carries per-row errors.
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
    let report = import::import_assets(&repo, store_id, &file_name, &bytes).await?;

    storekeep_common::metrics::record_import_rows(
        "assets",
        report.success_count,
        report.failed_count,
    );
    tracing::info!(
        store_id = %store_id,
        imported = report.success_count,
        failed = report.failed_count,
        "Asset import finished"
    );

    Ok(Json(report.into()))
}
