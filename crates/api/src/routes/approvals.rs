//! Approval chain routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiResult,
    extract::{AppJson, AppPath, AppQuery},
    middleware::AuthUser,
};
use procura_core::approval::{ApprovalDecision, ApprovalStatus, ApproverSpec};
use procura_db::ApprovalRepository;
use procura_db::entities::approvals;

/// Creates the approval routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/requests/{request_id}/approvals",
            post(create_chain).get(list_for_request),
        )
        .route("/approvals", get(list_inbox))
        .route("/approvals/{approval_id}", put(decide))
}

/// Request body for submitting a request for approval.
#[derive(Debug, Deserialize)]
pub struct CreateChainRequest {
    /// Approvers in step order.
    pub approvers: Vec<ApproverSpec>,
}

/// Request body for deciding an approval step.
#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    /// `approve` or `reject`.
    pub decision: ApprovalDecision,
    /// Optional comments.
    pub comments: Option<String>,
}

/// Query parameters for the approver's inbox.
#[derive(Debug, Deserialize)]
pub struct InboxQuery {
    /// Only steps in this status.
    pub status: Option<ApprovalStatus>,
}

async fn create_chain(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(payload): AppJson<CreateChainRequest>,
) -> ApiResult<(StatusCode, Json<Vec<approvals::Model>>)> {
    let chain = ApprovalRepository::new(state.engine.clone())
        .create_chain(&actor, request_id, &payload.approvers)
        .await?;
    Ok((StatusCode::CREATED, Json(chain)))
}

async fn list_for_request(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(request_id): AppPath<Uuid>,
) -> ApiResult<Json<Vec<approvals::Model>>> {
    let chain = ApprovalRepository::new(state.engine.clone())
        .list_for_request(&actor, request_id)
        .await?;
    Ok(Json(chain))
}

async fn list_inbox(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppQuery(query): AppQuery<InboxQuery>,
) -> ApiResult<Json<Vec<approvals::Model>>> {
    let inbox = ApprovalRepository::new(state.engine.clone())
        .list_for_approver(&actor, query.status)
        .await?;
    Ok(Json(inbox))
}

async fn decide(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(approval_id): AppPath<Uuid>,
    AppJson(payload): AppJson<DecideRequest>,
) -> ApiResult<Json<approvals::Model>> {
    let decided = ApprovalRepository::new(state.engine.clone())
        .decide(&actor, approval_id, payload.decision, payload.comments)
        .await?;
    Ok(Json(decided))
}
