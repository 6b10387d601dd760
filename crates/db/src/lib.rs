//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repositories that run each engine operation in one transaction
//! - Database migrations

pub mod context;
pub mod entities;
pub mod migration;
pub mod repositories;

pub use context::{EngineContext, TracingNotifier};
pub use repositories::{
    AnalyticsRepository, ApprovalRepository, AuditFilter, AuditRepository, BudgetRepository,
    BudgetView, DirectiveOutcome, InvoiceFilter, InvoiceRepository, LedgerStep, MessageOutcome,
    NegotiationDetail, NegotiationRepository, NewAttachment, NewVendor, QuoteSubmission,
    RecurringRepository, RequestDetail, RequestRepository, TaskFailure, TaskReport,
    TaskRepository, TickFailure, TickReport, VendorFilter, VendorRepository,
};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use procura_shared::AppError;

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection with explicit pool bounds.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_pool(
    database_url: &str,
    max_connections: u32,
    min_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(max_connections)
        .min_connections(min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}

/// Applies all pending migrations.
///
/// # Errors
///
/// Returns an error if a migration fails.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    migration::Migrator::up(db, None).await
}

/// Maps a `SeaORM` error into the application taxonomy.
pub(crate) fn db_err(err: DbErr) -> AppError {
    AppError::Database(err.to_string())
}
