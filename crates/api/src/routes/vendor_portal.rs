//! Vendor portal routes. Callers authenticate with vendor-realm tokens.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{AppState, error::ApiResult, extract::{AppJson, AppPath}, middleware::AuthVendor};
use procura_core::order::OrderAction;
use procura_db::entities::{purchase_orders, quotes, requests};
use procura_db::{QuoteSubmission, VendorRepository};

/// Creates the portal routes (requires vendor auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vendor-portal/rfqs", get(open_rfqs))
        .route("/vendor-portal/rfqs/{request_id}/quotes", post(submit_quote))
        .route("/vendor-portal/orders", get(orders))
        .route("/vendor-portal/orders/{po_id}", put(update_order))
}

fn repo(state: &AppState) -> VendorRepository {
    VendorRepository::new(state.engine.clone())
}

async fn open_rfqs(
    State(state): State<AppState>,
    AuthVendor(vendor): AuthVendor,
) -> ApiResult<Json<Vec<requests::Model>>> {
    Ok(Json(repo(&state).open_rfqs(vendor).await?))
}

async fn submit_quote(
    State(state): State<AppState>,
    AuthVendor(vendor): AuthVendor,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(payload): AppJson<QuoteSubmission>,
) -> ApiResult<(StatusCode, Json<quotes::Model>)> {
    let quote = repo(&state)
        .submit_quote(vendor, request_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

async fn orders(
    State(state): State<AppState>,
    AuthVendor(vendor): AuthVendor,
) -> ApiResult<Json<Vec<purchase_orders::Model>>> {
    Ok(Json(repo(&state).orders(vendor).await?))
}

async fn update_order(
    State(state): State<AppState>,
    AuthVendor(vendor): AuthVendor,
    AppPath(po_id): AppPath<Uuid>,
    AppJson(action): AppJson<OrderAction>,
) -> ApiResult<Json<purchase_orders::Model>> {
    Ok(Json(repo(&state).update_order(vendor, po_id, action).await?))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn test_portal_rejects_internal_tokens() {
        let app = TestApp::new().await;
        let admin = app.token(Uuid::new_v4(), "admin");
        let (status, body) = app
            .send("GET", "/api/v1/vendor-portal/rfqs", Some(&admin), None)
            .await;
        assert_eq!(status, 401);
        assert_eq!(body["error"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_vendor_quotes_through_the_portal() {
        let app = TestApp::new().await;
        let admin = app.token(Uuid::new_v4(), "admin");
        let requester = app.token(Uuid::new_v4(), "requester");

        let (_, created) = app
            .send(
                "POST",
                "/api/v1/requests",
                Some(&requester),
                Some(json!({ "title": "Chairs", "category": "chairs", "quantity": 3 })),
            )
            .await;
        let request_id = created["id"].as_str().unwrap().to_string();
        for directive in ["advance_to_sourcing", "issue_rfq"] {
            let (status, _) = app
                .send(
                    "POST",
                    &format!("/api/v1/requests/{request_id}/directives"),
                    Some(&requester),
                    Some(json!({ "directive": directive })),
                )
                .await;
            assert_eq!(status, 200);
        }

        let (status, vendor) = app
            .send(
                "POST",
                "/api/v1/vendors",
                Some(&admin),
                Some(json!({
                    "name": "Seatco",
                    "categories": ["chairs"],
                    "rating": "4.0",
                    "verified": true
                })),
            )
            .await;
        assert_eq!(status, 201);
        let vendor_id: Uuid = vendor["id"].as_str().unwrap().parse().unwrap();
        let portal = app.vendor_token(vendor_id);

        let (status, rfqs) = app
            .send("GET", "/api/v1/vendor-portal/rfqs", Some(&portal), None)
            .await;
        assert_eq!(status, 200);
        assert_eq!(rfqs.as_array().unwrap().len(), 1);

        let (status, quote) = app
            .send(
                "POST",
                &format!("/api/v1/vendor-portal/rfqs/{request_id}/quotes"),
                Some(&portal),
                Some(json!({ "unit_price": "120", "delivery_days": 5 })),
            )
            .await;
        assert_eq!(status, 201);
        assert_eq!(quote["quantity"], 3);

        let (status, body) = app
            .send(
                "POST",
                &format!("/api/v1/vendor-portal/rfqs/{request_id}/quotes"),
                Some(&portal),
                Some(json!({ "unit_price": "110", "delivery_days": 5 })),
            )
            .await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "VALIDATION_ERROR");

        let (status, orders) = app
            .send("GET", "/api/v1/vendor-portal/orders", Some(&portal), None)
            .await;
        assert_eq!(status, 200);
        assert!(orders.as_array().unwrap().is_empty());
    }
}
