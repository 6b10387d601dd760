//! Procura API Server
//!
//! Main entry point for the procurement workflow service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use procura_api::{AppState, create_router};
use procura_core::intent::CommandIntentExtractor;
use procura_db::{EngineContext, TracingNotifier, connect_pool, migrate};
use procura_shared::AppConfig;
use procura_shared::jwt::JwtService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "procura=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect and bring the schema up to date
    let db = connect_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("Connected to database");
    migrate(&db).await?;
    info!("Migrations applied");

    info!(
        approval_sla_hours = config.procurement.approval_sla_hours,
        rfq_batch_size = config.procurement.rfq_batch_size,
        match_tolerance_percent = %config.procurement.match_tolerance_percent,
        "Procurement policy loaded"
    );

    let state = AppState {
        engine: EngineContext::new(db, Arc::new(TracingNotifier), config.procurement.clone()),
        jwt_service: Arc::new(JwtService::new(&config.jwt.secret, config.jwt.leeway_secs)),
        extractor: Arc::new(CommandIntentExtractor),
    };

    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
