//! Audit trail routes.

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

use crate::{AppState, error::ApiResult, extract::AppQuery, middleware::AuthUser};
use procura_db::entities::audit_logs;
use procura_db::{AuditFilter, AuditRepository};

/// Creates the audit routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/audit", get(list_entries))
}

async fn list_entries(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppQuery(filter): AppQuery<AuditFilter>,
) -> ApiResult<Json<Vec<audit_logs::Model>>> {
    Ok(Json(
        AuditRepository::new(state.engine.clone())
            .list(&actor, filter)
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn test_audit_trail_filters_by_request() {
        let app = TestApp::new().await;
        let requester = app.token(Uuid::new_v4(), "requester");
        let manager = app.token(Uuid::new_v4(), "manager");
        let (_, created) = app
            .send(
                "POST",
                "/api/v1/requests",
                Some(&requester),
                Some(json!({ "title": "Toner" })),
            )
            .await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = app
            .send("GET", "/api/v1/audit", Some(&requester), None)
            .await;
        assert_eq!(status, 403);

        let (status, entries) = app
            .send(
                "GET",
                &format!("/api/v1/audit?request_id={id}&action=CREATE"),
                Some(&manager),
                None,
            )
            .await;
        assert_eq!(status, 200);
        let entries = entries.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["entity_id"], id.as_str());
    }
}
