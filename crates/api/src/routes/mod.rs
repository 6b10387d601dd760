//! API route definitions.

use axum::{Router, middleware};

use crate::{
    AppState,
    middleware::{auth_middleware, vendor_auth_middleware},
};

pub mod analytics;
pub mod approvals;
pub mod audit;
pub mod budgets;
pub mod health;
pub mod invoices;
pub mod negotiations;
pub mod recurring;
pub mod requests;
pub mod tasks;
pub mod vendor_portal;
pub mod vendors;

/// Creates the API router; protected routes need state for their middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Internal realm
    let internal = Router::new()
        .merge(requests::routes())
        .merge(approvals::routes())
        .merge(budgets::routes())
        .merge(negotiations::routes())
        .merge(analytics::routes())
        .merge(invoices::routes())
        .merge(recurring::routes())
        .merge(tasks::routes())
        .merge(audit::routes())
        .merge(vendors::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Vendor realm
    let portal = vendor_portal::routes().layer(middleware::from_fn_with_state(
        state,
        vendor_auth_middleware,
    ));

    Router::new()
        .merge(health::routes())
        .merge(internal)
        .merge(portal)
}
