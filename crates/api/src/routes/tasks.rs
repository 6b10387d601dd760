//! Deferred task routes.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{AppState, error::ApiResult, extract::AppPath, middleware::AuthUser};
use procura_db::entities::scheduled_tasks;
use procura_db::{TaskReport, TaskRepository};

/// Creates the task routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(pending))
        .route("/tasks/run", post(run_due))
        .route("/tasks/{task_id}/run", post(run_now))
}

async fn pending(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<Vec<scheduled_tasks::Model>>> {
    Ok(Json(
        TaskRepository::new(state.engine.clone())
            .pending(&actor)
            .await?,
    ))
}

async fn run_due(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<TaskReport>> {
    Ok(Json(
        TaskRepository::new(state.engine.clone())
            .run_due(&actor, Utc::now())
            .await?,
    ))
}

async fn run_now(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(task_id): AppPath<Uuid>,
) -> ApiResult<Json<scheduled_tasks::Model>> {
    Ok(Json(
        TaskRepository::new(state.engine.clone())
            .run_now(&actor, task_id)
            .await?,
    ))
}
