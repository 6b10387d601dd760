//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for internal users and the vendor portal
//! - Bearer-token middleware for both authentication realms
//! - The JSON error envelope and extractors that reject with it

pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use procura_core::intent::IntentExtractor;
use procura_db::EngineContext;
use procura_shared::jwt::JwtService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Connection, notifier and procurement settings for repositories.
    pub engine: EngineContext,
    /// Token verification for both realms.
    pub jwt_service: Arc<JwtService>,
    /// Turns conversational messages into directives.
    pub extractor: Arc<dyn IntentExtractor>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine)
            .field("jwt_service", &self.jwt_service)
            .finish_non_exhaustive()
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
