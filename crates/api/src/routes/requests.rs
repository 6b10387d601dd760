//! Procurement request routes: drafting, directives, conversation, attachments.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiResult,
    extract::{AppJson, AppPath, AppQuery},
    middleware::AuthUser,
};
use procura_core::request::{Directive, NewRequest, RequestPatch, RequestStatus};
use procura_db::entities::{attachments, requests};
use procura_db::{DirectiveOutcome, MessageOutcome, NewAttachment, RequestDetail, RequestRepository};
use procura_shared::types::ListLimit;

/// Creates the request routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/requests", get(list_requests).post(create_request))
        .route(
            "/requests/{request_id}",
            get(get_request).put(update_request).delete(delete_request),
        )
        .route("/requests/{request_id}/directives", post(apply_directive))
        .route("/requests/{request_id}/messages", post(post_message))
        .route("/messages", post(start_conversation))
        .route("/requests/{request_id}/cancel", post(cancel_request))
        .route("/requests/{request_id}/attachments", post(add_attachment))
}

/// Query parameters for listing the caller's requests.
#[derive(Debug, Deserialize)]
pub struct ListRequestsQuery {
    /// Only requests in this status.
    pub status: Option<RequestStatus>,
    /// Maximum rows.
    pub limit: Option<u64>,
}

/// Body of a conversational message.
#[derive(Debug, Deserialize)]
pub struct MessageBody {
    /// Free text from the requester.
    pub text: String,
}

fn repo(state: &AppState) -> RequestRepository {
    RequestRepository::new(state.engine.clone())
}

async fn list_requests(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppQuery(query): AppQuery<ListRequestsQuery>,
) -> ApiResult<Json<Vec<requests::Model>>> {
    let rows = repo(&state)
        .list_for_owner(&actor, query.status, ListLimit::from_query(query.limit))
        .await?;
    Ok(Json(rows))
}

async fn create_request(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppJson(payload): AppJson<NewRequest>,
) -> ApiResult<(StatusCode, Json<requests::Model>)> {
    let request = repo(&state).create_draft(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn get_request(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(request_id): AppPath<Uuid>,
) -> ApiResult<Json<RequestDetail>> {
    Ok(Json(repo(&state).detail(&actor, request_id).await?))
}

async fn update_request(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(patch): AppJson<RequestPatch>,
) -> ApiResult<Json<requests::Model>> {
    Ok(Json(
        repo(&state).update_fields(&actor, request_id, patch).await?,
    ))
}

async fn delete_request(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(request_id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    repo(&state).delete(&actor, request_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn apply_directive(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(directive): AppJson<Directive>,
) -> ApiResult<Json<DirectiveOutcome>> {
    Ok(Json(
        repo(&state)
            .apply_directive(&actor, request_id, directive)
            .await?,
    ))
}

async fn post_message(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(body): AppJson<MessageBody>,
) -> ApiResult<Json<MessageOutcome>> {
    let outcome = repo(&state)
        .process_message(&actor, Some(request_id), &body.text, state.extractor.as_ref())
        .await?;
    Ok(Json(outcome))
}

async fn start_conversation(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppJson(body): AppJson<MessageBody>,
) -> ApiResult<(StatusCode, Json<MessageOutcome>)> {
    let outcome = repo(&state)
        .process_message(&actor, None, &body.text, state.extractor.as_ref())
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn cancel_request(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(request_id): AppPath<Uuid>,
) -> ApiResult<Json<requests::Model>> {
    Ok(Json(repo(&state).cancel(&actor, request_id).await?))
}

async fn add_attachment(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(payload): AppJson<NewAttachment>,
) -> ApiResult<(StatusCode, Json<attachments::Model>)> {
    let attachment = repo(&state)
        .add_attachment(&actor, request_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(attachment)))
}
