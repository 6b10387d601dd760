//! Spend analytics routes, scoped by the caller's role.

use axum::{Json, Router, extract::State, routing::get};
use chrono::Utc;
use serde::Deserialize;

use crate::{AppState, error::ApiResult, extract::AppQuery, middleware::AuthUser};
use procura_core::analytics::{DashboardStats, SpendOverview, SpendWindow};
use procura_core::negotiation::SavingsSummary;
use procura_db::{AnalyticsRepository, NegotiationRepository};

/// Creates the analytics routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/overview", get(overview))
        .route("/analytics/stats", get(stats))
        .route("/analytics/savings", get(savings))
}

/// Query parameters for the overview.
#[derive(Debug, Deserialize)]
pub struct OverviewQuery {
    /// Look-back in days; defaults to 90.
    pub days: Option<u32>,
}

fn repo(state: &AppState) -> AnalyticsRepository {
    AnalyticsRepository::new(state.engine.clone())
}

async fn overview(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    AppQuery(query): AppQuery<OverviewQuery>,
) -> ApiResult<Json<SpendOverview>> {
    let window = SpendWindow::from_query(query.days);
    Ok(Json(repo(&state).overview(&actor, window, Utc::now()).await?))
}

async fn stats(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(repo(&state).dashboard(&actor, Utc::now()).await?))
}

async fn savings(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<SavingsSummary>> {
    Ok(Json(
        NegotiationRepository::new(state.engine.clone())
            .savings_summary(&actor)
            .await?,
    ))
}
