//! Invoice reconciliation routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiResult,
    extract::{AppJson, AppPath, AppQuery},
    middleware::AuthUser,
};
use procura_core::reconciliation::{InvoiceAction, NewInvoice};
use procura_db::entities::invoices;
use procura_db::{InvoiceFilter, InvoiceRepository};

/// Creates the invoice routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(submit_invoice))
        .route(
            "/invoices/{invoice_id}",
            get(get_invoice).put(decide_invoice),
        )
}

/// Request body for recording a vendor invoice against an order.
#[derive(Debug, Deserialize)]
pub struct SubmitInvoiceRequest {
    /// Purchase order being billed.
    pub po_id: Uuid,
    /// Invoice fields.
    pub invoice: NewInvoice,
}

fn repo(state: &AppState) -> InvoiceRepository {
    InvoiceRepository::new(state.engine.clone())
}

async fn list_invoices(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppQuery(filter): AppQuery<InvoiceFilter>,
) -> ApiResult<Json<Vec<invoices::Model>>> {
    Ok(Json(repo(&state).list(&actor, filter).await?))
}

async fn submit_invoice(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppJson(payload): AppJson<SubmitInvoiceRequest>,
) -> ApiResult<(StatusCode, Json<invoices::Model>)> {
    let invoice = repo(&state)
        .submit(&actor, payload.po_id, payload.invoice)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

async fn get_invoice(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(invoice_id): AppPath<Uuid>,
) -> ApiResult<Json<invoices::Model>> {
    Ok(Json(repo(&state).get(&actor, invoice_id).await?))
}

async fn decide_invoice(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(invoice_id): AppPath<Uuid>,
    AppJson(action): AppJson<InvoiceAction>,
) -> ApiResult<Json<invoices::Model>> {
    Ok(Json(repo(&state).decide(&actor, invoice_id, action).await?))
}
