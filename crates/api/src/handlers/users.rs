//! User account handlers

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::handlers::assets::ListQuery;
use crate::AppState;
use storekeep_common::auth::{self, Principal, Role};
use storekeep_common::db::models::User;
use storekeep_common::db::Repository;
use storekeep_common::errors::{AppError, Result};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    pub role: String,
    pub store_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Serialize)]
pub struct ListUsersResponse {
    pub success: bool,
    pub users: Vec<User>,
}

/// List accounts in scope. Fails soft on read errors.
pub async fn list_users(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListUsersResponse>> {
    principal.require_admin_like()?;

    let repo = Repository::new(state.db.clone());
    let scope = principal.scope().narrowed(query.store_id);

    let users = match repo.list_users(&scope).await {
        Ok(users) => users,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list users, returning empty");
            Vec::new()
        }
    };

    Ok(Json(ListUsersResponse {
        success: true,
        users,
    }))
}

/// Create an account. Scoped admins can only create accounts in their own
/// store, and only a master admin can mint another master admin.
pub async fn create_user(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    principal.require_admin_like()?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let role = Role::parse(&request.role).ok_or_else(|| AppError::Validation {
        message: format!("Invalid role: {}", request.role),
        field: Some("role".to_string()),
    })?;

    if role == Role::MasterAdmin && principal.role() != Role::MasterAdmin {
        return Err(AppError::Forbidden {
            message: "Only a master administrator can create master administrators".to_string(),
        });
    }

    let store_id = if role == Role::MasterAdmin {
        None
    } else {
        Some(principal.scope().target_store(request.store_id)?)
    };

    match role {
        Role::Technician if request.technician_id.is_none() => {
            return Err(AppError::MissingField {
                field: "technician_id".to_string(),
            });
        }
        Role::Vendor if request.vendor_id.is_none() => {
            return Err(AppError::MissingField {
                field: "vendor_id".to_string(),
            });
        }
        _ => {}
    }

    let repo = Repository::new(state.db.clone());

    if repo.find_user_by_email(&request.email).await?.is_some() {
        return Err(AppError::Duplicate {
            message: format!("An account with email {} already exists", request.email),
        });
    }

    let password_hash = auth::hash_password(&request.password)?;
    let user = repo
        .create_user(
            request.email,
            password_hash,
            role.as_str().to_string(),
            store_id,
            request.technician_id,
            request.vendor_id,
        )
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User account created");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            success: true,
            user,
        }),
    ))
}
