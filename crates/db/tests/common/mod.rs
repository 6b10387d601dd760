//! Shared harness for repository integration tests.
//!
//! Every test gets its own SQLite database, in memory unless a test asks for
//! a file, migrated with the real migration and a notifier that records what
//! it was asked to send.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database};
use uuid::Uuid;

use procura_core::budget::NewBudget;
use procura_core::notification::{Notification, NotificationKind, Notifier, NotifyError};
use procura_core::policy::{Actor, Role};
use procura_core::request::{Directive, NewRequest};
use procura_db::entities::{purchase_orders, requests, vendors};
use procura_db::{
    BudgetRepository, BudgetView, EngineContext, NewVendor, RequestRepository, VendorRepository,
};
use procura_shared::ProcurementConfig;

/// Notifier that keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn of_kind(&self, kind: NotificationKind) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|n| n.kind == kind)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Notifier whose deliveries always fail.
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        Err(NotifyError("smtp unreachable".to_string()))
    }
}

pub struct Harness {
    pub ctx: EngineContext,
    pub notifier: Arc<RecordingNotifier>,
    pub admin: Actor,
    pub finance: Actor,
    pub manager: Actor,
    pub requester: Actor,
}

pub async fn setup() -> Harness {
    setup_at("sqlite::memory:", 1).await
}

/// Harness over `url` with a pool of `max_connections`.
pub async fn setup_at(url: &str, max_connections: u32) -> Harness {
    let mut options = ConnectOptions::new(url);
    options
        .max_connections(max_connections)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open database");
    procura_db::migrate(&db).await.expect("Failed to migrate");

    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = EngineContext::new(db, notifier.clone(), ProcurementConfig::default());
    Harness {
        ctx,
        notifier,
        admin: Actor::new(Uuid::new_v4(), Role::Admin),
        finance: Actor::new(Uuid::new_v4(), Role::Finance),
        manager: Actor::new(Uuid::new_v4(), Role::Manager),
        requester: Actor::new(Uuid::new_v4(), Role::Requester).with_department("Engineering"),
    }
}

impl Harness {
    pub fn requests(&self) -> RequestRepository {
        RequestRepository::new(self.ctx.clone())
    }

    pub fn budgets(&self) -> BudgetRepository {
        BudgetRepository::new(self.ctx.clone())
    }

    pub fn vendors(&self) -> VendorRepository {
        VendorRepository::new(self.ctx.clone())
    }

    pub async fn vendor(&self, name: &str, category: &str, rating: Decimal) -> vendors::Model {
        self.vendors()
            .create(
                &self.admin,
                NewVendor {
                    name: name.to_string(),
                    email: Some(format!("{}@vendors.test", name.to_lowercase())),
                    categories: vec![category.to_string()],
                    rating,
                    verified: true,
                },
            )
            .await
            .expect("Failed to create vendor")
    }

    pub async fn budget(&self, department: &str, total: Decimal) -> BudgetView {
        self.budgets()
            .create(
                &self.finance,
                NewBudget {
                    department: department.to_string(),
                    fiscal_year: 2026,
                    quarter: None,
                    total_amount: total,
                    alert_threshold: None,
                    manager_id: Some(self.manager.id),
                },
            )
            .await
            .expect("Failed to create budget")
    }

    pub async fn draft(
        &self,
        category: &str,
        quantity: i32,
        estimate: Decimal,
        budget_id: Option<Uuid>,
    ) -> requests::Model {
        self.requests()
            .create_draft(
                &self.requester,
                NewRequest {
                    title: Some(format!("{quantity} x {category}")),
                    category: Some(category.to_string()),
                    description: Some(format!("{category} for the new office")),
                    quantity: Some(quantity),
                    budget_estimate: Some(estimate),
                    budget_id,
                    ..Default::default()
                },
            )
            .await
            .expect("Failed to create draft")
    }

    pub async fn direct(&self, request_id: Uuid, directive: Directive) {
        self.requests()
            .apply_directive(&self.requester, request_id, directive)
            .await
            .expect("Directive failed");
    }

    /// Drives a request from DRAFT to QUOTING with synthesized quotes.
    pub async fn quoted(&self, request_id: Uuid) {
        self.direct(request_id, Directive::AdvanceToSourcing).await;
        self.direct(request_id, Directive::IssueRfq).await;
    }

    /// Drives a request from DRAFT to PO_GENERATED, skipping approvals.
    pub async fn ordered(&self, request_id: Uuid) -> purchase_orders::Model {
        self.quoted(request_id).await;
        self.direct(request_id, Directive::StartNegotiation { quote_id: None })
            .await;
        self.direct(request_id, Directive::GenerateContract).await;
        self.requests()
            .apply_directive(&self.requester, request_id, Directive::GeneratePo)
            .await
            .expect("Failed to generate PO")
            .purchase_order
            .expect("PO missing from outcome")
    }
}
