//! Negotiation routes.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiResult, extract::{AppJson, AppPath}, middleware::AuthUser};
use procura_db::{NegotiationDetail, NegotiationRepository};

/// Creates the negotiation routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/negotiations/{negotiation_id}", get(get_negotiation))
        .route("/negotiations/{negotiation_id}/counter", post(counter))
        .route("/negotiations/{negotiation_id}/accept", post(accept))
        .route("/negotiations/{negotiation_id}/reject", post(reject))
}

/// Request body for recording a vendor counter-offer.
#[derive(Debug, Deserialize)]
pub struct CounterRequest {
    /// Price the vendor came back with.
    pub vendor_counter: Decimal,
    /// Our next offer, if any.
    pub our_offer: Option<Decimal>,
    /// Note kept with the round.
    pub message: Option<String>,
}

fn repo(state: &AppState) -> NegotiationRepository {
    NegotiationRepository::new(state.engine.clone())
}

async fn get_negotiation(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(negotiation_id): AppPath<Uuid>,
) -> ApiResult<Json<NegotiationDetail>> {
    Ok(Json(repo(&state).get(&actor, negotiation_id).await?))
}

async fn counter(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(negotiation_id): AppPath<Uuid>,
    AppJson(payload): AppJson<CounterRequest>,
) -> ApiResult<Json<NegotiationDetail>> {
    let detail = repo(&state)
        .record_counter(
            &actor,
            negotiation_id,
            payload.vendor_counter,
            payload.our_offer,
            payload.message,
        )
        .await?;
    Ok(Json(detail))
}

async fn accept(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(negotiation_id): AppPath<Uuid>,
) -> ApiResult<Json<NegotiationDetail>> {
    Ok(Json(repo(&state).accept(&actor, negotiation_id).await?))
}

async fn reject(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(negotiation_id): AppPath<Uuid>,
) -> ApiResult<Json<NegotiationDetail>> {
    Ok(Json(repo(&state).reject(&actor, negotiation_id).await?))
}
