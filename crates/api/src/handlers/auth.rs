//! Authentication handlers

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use storekeep_common::auth::{self, Role, TokenIdentity};
use storekeep_common::db::Repository;
use storekeep_common::errors::{AppError, Result};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: UserSummary,
}

#[derive(Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<Uuid>,
}

async fn authenticate(state: &AppState, request: &LoginRequest) -> Result<TokenIdentity> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());

    let user = repo
        .find_user_by_email(&request.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !auth::verify_password(&request.password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let role = Role::parse(&user.role).ok_or_else(|| AppError::Unauthorized {
        message: format!("Account has unknown role: {}", user.role),
    })?;

    Ok(TokenIdentity {
        user_id: user.id,
        email: user.email,
        role,
        store_id: user.store_id,
        technician_id: user.technician_id,
        vendor_id: user.vendor_id,
    })
}

/// Web session login: email + password exchanged for a short-lived JWT
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let identity = authenticate(&state, &request).await?;
    let token = state.jwt.generate_token(&identity)?;

    tracing::info!(user_id = %identity.user_id, role = %identity.role.as_str(), "User logged in");

    Ok(Json(LoginResponse {
        success: true,
        token,
        user: UserSummary {
            id: identity.user_id,
            email: identity.email,
            role: identity.role.as_str().to_string(),
            store_id: identity.store_id,
        },
    }))
}

/// Mobile login: long-lived bearer token for USER-role clients only
pub async fn mobile_auth(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let identity = authenticate(&state, &request).await?;

    if identity.role != Role::User {
        return Err(AppError::Forbidden {
            message: "Mobile tokens are only issued to USER accounts".to_string(),
        });
    }

    let token = state.jwt.generate_mobile_token(&identity)?;

    tracing::info!(user_id = %identity.user_id, "Mobile token issued");

    Ok(Json(LoginResponse {
        success: true,
        token,
        user: UserSummary {
            id: identity.user_id,
            email: identity.email,
            role: identity.role.as_str().to_string(),
            store_id: identity.store_id,
        },
    }))
}
