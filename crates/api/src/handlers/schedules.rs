//! PM schedule handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::handlers::assets::ListQuery;
use crate::services::pm;
use crate::AppState;
use storekeep_common::auth::Principal;
use storekeep_common::db::models::PmSchedule;
use storekeep_common::db::repository::PmScheduleUpdate;
use storekeep_common::db::Repository;
use storekeep_common::errors::{AppError, Result};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,

    pub asset_id: Uuid,

    #[validate(range(min = 1))]
    pub frequency_days: i32,

    pub next_due_date: chrono::NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    pub title: Option<String>,
    pub frequency_days: Option<i32>,
    pub next_due_date: Option<chrono::NaiveDate>,
    pub active: Option<bool>,
}

#[derive(Serialize)]
pub struct ScheduleResponse {
    pub success: bool,
    pub schedule: PmSchedule,
}

#[derive(Serialize)]
pub struct ListSchedulesResponse {
    pub success: bool,
    pub schedules: Vec<PmSchedule>,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub processed: usize,
    pub created: usize,
}

/// List PM schedules in scope. Fails soft on read errors.
pub async fn list_schedules(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> Json<ListSchedulesResponse> {
    let repo = Repository::new(state.db.clone());
    let scope = principal.scope().narrowed(query.store_id);

    let schedules = match repo.list_pm_schedules(&scope).await {
        Ok(schedules) => schedules,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list PM schedules, returning empty");
            Vec::new()
        }
    };

    Json(ListSchedulesResponse {
        success: true,
        schedules,
    })
}

pub async fn create_schedule(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleResponse>)> {
    principal.require_admin_like()?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let asset = repo
        .find_asset_by_id(request.asset_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Asset",
            id: request.asset_id.to_string(),
        })?;
    principal.scope().check(Some(asset.store_id))?;

    let schedule = repo
        .create_pm_schedule(
            request.title,
            asset.id,
            Some(asset.store_id),
            request.frequency_days,
            request.next_due_date,
        )
        .await?;

    tracing::info!(
        schedule_id = %schedule.id,
        asset_id = %asset.id,
        frequency_days = schedule.frequency_days,
        "PM schedule created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ScheduleResponse {
            success: true,
            schedule,
        }),
    ))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    principal: Principal,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<ScheduleResponse>> {
    let repo = Repository::new(state.db.clone());

    let schedule = repo
        .find_pm_schedule_by_id(schedule_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "PM schedule",
            id: schedule_id.to_string(),
        })?;

    principal.scope().check(schedule.store_id)?;

    Ok(Json(ScheduleResponse {
        success: true,
        schedule,
    }))
}

pub async fn update_schedule(
    State(state): State<AppState>,
    principal: Principal,
    Path(schedule_id): Path<Uuid>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<ScheduleResponse>> {
    principal.require_admin_like()?;

    if let Some(frequency_days) = request.frequency_days {
        if frequency_days < 1 {
            return Err(AppError::Validation {
                message: "frequency_days must be at least 1".to_string(),
                field: Some("frequency_days".to_string()),
            });
        }
    }

    let repo = Repository::new(state.db.clone());
    let existing = repo
        .find_pm_schedule_by_id(schedule_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "PM schedule",
            id: schedule_id.to_string(),
        })?;
    principal.scope().check(existing.store_id)?;

    let schedule = repo
        .update_pm_schedule(
            schedule_id,
            PmScheduleUpdate {
                title: request.title,
                frequency_days: request.frequency_days,
                next_due_date: request.next_due_date,
                active: request.active,
            },
        )
        .await?;

    tracing::info!(schedule_id = %schedule.id, "PM schedule updated");

    Ok(Json(ScheduleResponse {
        success: true,
        schedule,
    }))
}

pub async fn delete_schedule(
    State(state): State<AppState>,
    principal: Principal,
    Path(schedule_id): Path<Uuid>,
) -> Result<StatusCode> {
    principal.require_admin_like()?;

    let repo = Repository::new(state.db.clone());
    let schedule = repo
        .find_pm_schedule_by_id(schedule_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "PM schedule",
            id: schedule_id.to_string(),
        })?;
    principal.scope().check(schedule.store_id)?;

    repo.delete_pm_schedule(schedule_id).await?;

    tracing::info!(schedule_id = %schedule_id, "PM schedule deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Trigger the PM due-date roller. There is no built-in scheduler; an
/// external cron (or an admin) posts here.
pub async fn generate(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<GenerateResponse>> {
    principal.require_admin_like()?;

    let repo = Repository::new(state.db.clone());
    let today = chrono::Utc::now().date_naive();

    let outcome = pm::run_roller(&repo, &principal.scope(), today).await?;

    storekeep_common::metrics::record_pm_generation(
        outcome.created,
        outcome.processed - outcome.created,
    );
    tracing::info!(
        processed = outcome.processed,
        created = outcome.created,
        "PM roller finished"
    );

    Ok(Json(GenerateResponse {
        success: true,
        processed: outcome.processed,
        created: outcome.created,
    }))
}
