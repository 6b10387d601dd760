//! Budget management routes.

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
use procura_core::budget::{BudgetPatch, NewBudget};
use procura_db::{BudgetRepository, BudgetView};

/// Creates the budget routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgets", get(list_budgets).post(create_budget))
        .route("/budgets/{budget_id}", get(get_budget).put(update_budget))
}

/// Query parameters for listing budgets.
#[derive(Debug, Deserialize)]
pub struct ListBudgetsQuery {
    /// Department filter; ignored for roles limited to their own.
    pub department: Option<String>,
}

async fn list_budgets(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppQuery(query): AppQuery<ListBudgetsQuery>,
) -> ApiResult<Json<Vec<BudgetView>>> {
    let budgets = BudgetRepository::new(state.engine.clone())
        .list(&actor, query.department)
        .await?;
    Ok(Json(budgets))
}

async fn create_budget(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppJson(payload): AppJson<NewBudget>,
) -> ApiResult<(StatusCode, Json<BudgetView>)> {
    let view = BudgetRepository::new(state.engine.clone())
        .create(&actor, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_budget(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(budget_id): AppPath<Uuid>,
) -> ApiResult<Json<BudgetView>> {
    Ok(Json(
        BudgetRepository::new(state.engine.clone())
            .get(&actor, budget_id)
            .await?,
    ))
}

async fn update_budget(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppPath(budget_id): AppPath<Uuid>,
    AppJson(patch): AppJson<BudgetPatch>,
) -> ApiResult<Json<BudgetView>> {
    Ok(Json(
        BudgetRepository::new(state.engine.clone())
            .update(&actor, budget_id, patch)
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use serde_json::{Value, json};
    use uuid::Uuid;

    use crate::test_support::TestApp;

    fn decimal(value: &Value) -> Decimal {
        Decimal::from_str(value.as_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_budget_figures_are_computed() {
        let app = TestApp::new().await;
        let finance = app.token(Uuid::new_v4(), "finance");

        let (status, created) = app
            .send(
                "POST",
                "/api/v1/budgets",
                Some(&finance),
                Some(json!({
                    "department": "Engineering",
                    "fiscal_year": 2026,
                    "total_amount": "150000"
                })),
            )
            .await;
        assert_eq!(status, 201);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, updated) = app
            .send(
                "PUT",
                &format!("/api/v1/budgets/{id}"),
                Some(&finance),
                Some(json!({ "spent_amount": "45000", "committed_amount": "25000" })),
            )
            .await;
        assert_eq!(status, 200);
        assert_eq!(decimal(&updated["utilization"]), Decimal::new(4667, 2));
        assert_eq!(decimal(&updated["remaining"]), Decimal::from(80_000));
    }

    #[tokio::test]
    async fn test_requesters_cannot_create_budgets() {
        let app = TestApp::new().await;
        let requester = app.token(Uuid::new_v4(), "requester");
        let (status, body) = app
            .send(
                "POST",
                "/api/v1/budgets",
                Some(&requester),
                Some(json!({
                    "department": "Engineering",
                    "fiscal_year": 2026,
                    "total_amount": "1000"
                })),
            )
            .await;
        assert_eq!(status, 403);
        assert_eq!(body["error"], "FORBIDDEN");
    }
}
