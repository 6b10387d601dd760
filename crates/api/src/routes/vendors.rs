//! Vendor administration routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use crate::{AppState, error::ApiResult, extract::{AppJson, AppQuery}, middleware::AuthUser};
use procura_db::entities::vendors;
use procura_db::{NewVendor, VendorFilter, VendorRepository};

/// Creates the vendor routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/vendors", get(list_vendors).post(create_vendor))
}

async fn list_vendors(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    AppQuery(filter): AppQuery<VendorFilter>,
) -> ApiResult<Json<Vec<vendors::Model>>> {
    Ok(Json(
        VendorRepository::new(state.engine.clone())
            .list(filter)
            .await?,
    ))
}

async fn create_vendor(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppJson(payload): AppJson<NewVendor>,
) -> ApiResult<(StatusCode, Json<vendors::Model>)> {
    let vendor = VendorRepository::new(state.engine.clone())
        .create(&actor, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(vendor)))
}
