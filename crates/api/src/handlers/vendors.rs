//! Vendor handlers

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
use storekeep_common::db::models::Vendor;
use storekeep_common::db::Repository;
use storekeep_common::errors::{AppError, Result};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVendorRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(email)]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub category: Option<String>,
    pub store_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct VendorResponse {
    pub success: bool,
    pub vendor: Vendor,
}

#[derive(Serialize)]
pub struct ListVendorsResponse {
    pub success: bool,
    pub vendors: Vec<Vendor>,
}

/// List vendors in scope. Fails soft on read errors.
pub async fn list_vendors(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> Json<ListVendorsResponse> {
    let repo = Repository::new(state.db.clone());
    let scope = principal.scope().narrowed(query.store_id);

    let vendors = match repo.list_vendors(&scope).await {
        Ok(vendors) => vendors,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list vendors, returning empty");
            Vec::new()
        }
    };

    Json(ListVendorsResponse {
        success: true,
        vendors,
    })
}

pub async fn create_vendor(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateVendorRequest>,
) -> Result<(StatusCode, Json<VendorResponse>)> {
    principal.require_admin_like()?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());

    // Email is the vendor natural key when present
    if let Some(ref email) = request.email {
        if repo.find_vendor_by_email(email).await?.is_some() {
            return Err(AppError::Duplicate {
                message: format!("A vendor with email {} already exists", email),
            });
        }
    }

    let store_id = principal.scope().optional_target_store(request.store_id)?;

    let vendor = repo
        .create_vendor(
            store_id,
            request.name,
            request.email,
            request.phone,
            request.category,
        )
        .await?;

    tracing::info!(vendor_id = %vendor.id, "Vendor created");

    Ok((
        StatusCode::CREATED,
        Json(VendorResponse {
            success: true,
            vendor,
        }),
    ))
}

pub async fn delete_vendor(
    State(state): State<AppState>,
    principal: Principal,
    Path(vendor_id): Path<Uuid>,
) -> Result<StatusCode> {
    principal.require_admin_like()?;

    let repo = Repository::new(state.db.clone());
    let vendor = repo
        .find_vendor_by_id(vendor_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Vendor",
            id: vendor_id.to_string(),
        })?;

    if let Some(store_id) = vendor.store_id {
        principal.scope().check(Some(store_id))?;
    } else {
        principal.require_admin_like()?;
    }

    repo.delete_vendor(vendor_id).await?;

    tracing::info!(vendor_id = %vendor_id, "Vendor deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// XML vendor import. Row failures never abort the batch.
pub async fn import_vendors(
    State(state): State<AppState>,
    principal: Principal,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>> {
    principal.require_admin_like()?;

    let mut bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::ImportParse {
            message: format!("Malformed multipart body: {}", e),
        }
    })? {
        if field.name() == Some("file") {
            let data = field.bytes().await.map_err(|e| AppError::ImportParse {
                message: format!("Failed to read upload: {}", e),
            })?;
            bytes = Some(data.to_vec());
        }
    }

    let bytes = bytes.ok_or_else(|| AppError::MissingField {
        field: "file".to_string(),
    })?;
    let store_id = principal.scope().optional_target_store(None)?;

    let repo = Repository::new(state.db.clone());
    let report = import::import_vendors(&repo, store_id, &bytes).await?;

    storekeep_common::metrics::record_import_rows(
        "vendors",
        report.success_count,
        report.failed_count,
    );
    tracing::info!(
        imported = report.success_count,
        failed = report.failed_count,
        "Vendor import finished"
    );

    Ok(Json(report.into()))
}
