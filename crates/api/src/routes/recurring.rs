//! Recurring schedule routes and the scheduler trigger.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{post, put},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{AppState, error::ApiResult, extract::{AppJson, AppPath}, middleware::AuthUser};
use procura_core::recurring::{SchedulePatch, ScheduleParams};
use procura_db::entities::recurring_schedules;
use procura_db::{RecurringRepository, TickReport};

/// Creates the recurring routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/requests/{request_id}/recurring", post(attach))
        .route("/recurring/tick", post(tick))
        .route(
            "/recurring/{schedule_id}",
            put(update_schedule).delete(delete_schedule),
        )
        .route("/recurring/{schedule_id}/pause", post(pause))
        .route("/recurring/{schedule_id}/resume", post(resume))
}

fn repo(state: &AppState) -> RecurringRepository {
    RecurringRepository::new(state.engine.clone())
}

async fn attach(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(params): AppJson<ScheduleParams>,
) -> ApiResult<(StatusCode, Json<recurring_schedules::Model>)> {
    let schedule = repo(&state).attach(&actor, request_id, params).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

async fn update_schedule(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(schedule_id): AppPath<Uuid>,
    AppJson(patch): AppJson<SchedulePatch>,
) -> ApiResult<Json<recurring_schedules::Model>> {
    Ok(Json(repo(&state).update(&actor, schedule_id, patch).await?))
}

async fn delete_schedule(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(schedule_id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    repo(&state).delete(&actor, schedule_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn pause(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(schedule_id): AppPath<Uuid>,
) -> ApiResult<Json<recurring_schedules::Model>> {
    Ok(Json(repo(&state).pause(&actor, schedule_id).await?))
}

async fn resume(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(schedule_id): AppPath<Uuid>,
) -> ApiResult<Json<recurring_schedules::Model>> {
    Ok(Json(repo(&state).resume(&actor, schedule_id).await?))
}

async fn tick(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<TickReport>> {
    Ok(Json(repo(&state).tick(&actor, Utc::now()).await?))
}
