//! File upload handlers
//!
//! Multipart uploads are written under the configured storage directory and
//! recorded as attachment rows. The public variant is keyed by a store's QR
//! intake token instead of a session.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use storekeep_common::auth::Principal;
use storekeep_common::db::models::Attachment;
use storekeep_common::db::Repository;
use storekeep_common::errors::{AppError, Result};

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub attachment: Attachment,
    pub url: String,
}

struct UploadedFile {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
    qr_token: Option<String>,
}

/// Strip any path components a client smuggles into the file name
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    if base.is_empty() {
        "upload.bin".to_string()
    } else {
        base.to_string()
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<UploadedFile> {
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut qr_token = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::Validation {
            message: format!("Malformed multipart body: {}", e),
            field: None,
        }
    })? {
        match field.name() {
            Some("file") => {
                let file_name = sanitize_file_name(field.file_name().unwrap_or("upload.bin"));
                let content_type = field.content_type().map(|c| c.to_string());
                let bytes = field.bytes().await.map_err(|e| AppError::Storage {
                    message: format!("Failed to read upload: {}", e),
                })?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            Some("store") => {
                qr_token = Some(field.text().await.map_err(|e| AppError::Validation {
                    message: format!("Failed to read store field: {}", e),
                    field: Some("store".to_string()),
                })?);
            }
            _ => {}
        }
    }

    let (file_name, content_type, bytes) = file.ok_or_else(|| AppError::MissingField {
        field: "file".to_string(),
    })?;

    Ok(UploadedFile {
        file_name,
        content_type,
        bytes,
        qr_token,
    })
}

async fn store_file(
    state: &AppState,
    upload: &UploadedFile,
    store_id: Option<Uuid>,
    uploaded_by: Option<String>,
) -> Result<Attachment> {
    if upload.bytes.len() > state.config.storage.max_upload_bytes {
        return Err(AppError::Validation {
            message: format!(
                "File exceeds the {} byte upload limit",
                state.config.storage.max_upload_bytes
            ),
            field: Some("file".to_string()),
        });
    }

    let stored_path = format!("{}-{}", Uuid::new_v4(), upload.file_name);
    let dir = std::path::Path::new(&state.config.storage.upload_dir);

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Storage {
            message: format!("Failed to create upload directory: {}", e),
        })?;
    tokio::fs::write(dir.join(&stored_path), &upload.bytes)
        .await
        .map_err(|e| AppError::Storage {
            message: format!("Failed to write upload: {}", e),
        })?;

    let repo = Repository::new(state.db.clone());
    repo.create_attachment(
        upload.file_name.clone(),
        stored_path,
        upload.content_type.clone(),
        upload.bytes.len() as i64,
        store_id,
        uploaded_by,
    )
    .await
}

fn attachment_url(state: &AppState, attachment: &Attachment) -> String {
    format!(
        "{}/uploads/{}",
        state.config.server.public_base_url.trim_end_matches('/'),
        attachment.stored_path
    )
}

/// Authenticated upload, recorded against the caller's store
pub async fn upload(
    State(state): State<AppState>,
    principal: Principal,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let file = read_multipart(multipart).await?;

    let attachment = store_file(
        &state,
        &file,
        principal.scope().optional_target_store(None)?,
        Some(principal.email().to_string()),
    )
    .await?;

    tracing::info!(
        attachment_id = %attachment.id,
        size_bytes = attachment.size_bytes,
        "File uploaded"
    );

    let url = attachment_url(&state, &attachment);
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            success: true,
            attachment,
            url,
        }),
    ))
}

/// Anonymous upload keyed by a store's QR intake token
pub async fn upload_public(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let file = read_multipart(multipart).await?;

    let qr_token = file.qr_token.clone().ok_or_else(|| AppError::MissingField {
        field: "store".to_string(),
    })?;

    let repo = Repository::new(state.db.clone());
    let store = repo
        .find_store_by_qr_code(&qr_token)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Store",
            id: qr_token,
        })?;

    let attachment = store_file(&state, &file, Some(store.id), None).await?;

    tracing::info!(
        attachment_id = %attachment.id,
        store_id = %store.id,
        "Public file uploaded"
    );

    let url = attachment_url(&state, &attachment);
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            success: true,
            attachment,
            url,
        }),
    ))
}
