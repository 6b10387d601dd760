//! Database seeder for Procura development and testing.
//!
//! Seeds vendors, department budgets and a sample request through the
//! repositories, then prints development tokens for the seeded users.
//!
//! Usage: cargo run --bin seeder

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use rust_decimal::Decimal;
use uuid::Uuid;

use procura_core::budget::{BudgetPatch, NewBudget};
use procura_core::policy::{Actor, Role};
use procura_core::request::{Directive, NewRequest, Urgency};
use procura_db::{
    BudgetRepository, EngineContext, NewVendor, RequestRepository, TracingNotifier, VendorFilter,
    VendorRepository,
};
use procura_shared::AppConfig;
use procura_shared::jwt::JwtService;

const ADMIN_ID: Uuid = Uuid::from_u128(1);
const REQUESTER_ID: Uuid = Uuid::from_u128(2);
const MANAGER_ID: Uuid = Uuid::from_u128(3);
const FINANCE_ID: Uuid = Uuid::from_u128(4);

/// (name, email, rating, categories)
const VENDORS: [(&str, &str, &str, &[&str]); 5] = [
    ("Steelcase Direct", "sales@steelcase.example", "4.7", &["furniture", "desks", "chairs"]),
    ("HON Office", "business@hon.example", "4.3", &["furniture", "desks", "chairs"]),
    ("Herman Miller", "enterprise@hermanmiller.example", "4.9", &["furniture", "ergonomic", "chairs"]),
    ("Dell Technologies", "business@dell.example", "4.5", &["it", "laptops", "monitors"]),
    ("Lenovo Enterprise", "enterprise@lenovo.example", "4.4", &["it", "laptops", "workstations"]),
];

/// (department, total, spent, committed, alert threshold)
const BUDGETS: [(&str, i64, i64, i64, i64); 2] = [
    ("Engineering", 150_000, 45_000, 25_000, 80),
    ("IT", 200_000, 78_000, 42_000, 75),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "procura=info".into()),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = procura_db::connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    procura_db::migrate(&db).await.context("Failed to migrate")?;

    let ctx = EngineContext::new(db, Arc::new(TracingNotifier), config.procurement.clone());
    let admin = Actor::new(ADMIN_ID, Role::Admin);
    let requester = Actor::new(REQUESTER_ID, Role::Requester).with_department("Engineering");

    println!("Seeding vendors...");
    seed_vendors(&ctx, &admin).await?;

    println!("Seeding budgets...");
    let engineering = seed_budgets(&ctx, &admin, MANAGER_ID).await?;

    println!("Seeding sample request...");
    seed_request(&ctx, &requester, engineering).await?;

    print_tokens(&config)?;
    println!("Seeding complete!");
    Ok(())
}

async fn seed_vendors(ctx: &EngineContext, admin: &Actor) -> anyhow::Result<()> {
    let repo = VendorRepository::new(ctx.clone());
    let existing = repo.list(VendorFilter::default()).await?;

    let mut inserted = 0;
    for (name, email, rating, categories) in VENDORS {
        if existing.iter().any(|v| v.name == name) {
            continue;
        }
        repo.create(
            admin,
            NewVendor {
                name: name.to_string(),
                email: Some(email.to_string()),
                categories: categories.iter().map(ToString::to_string).collect(),
                rating: Decimal::from_str(rating)?,
                verified: true,
            },
        )
        .await?;
        inserted += 1;
    }
    println!("  Inserted {inserted} vendors");
    Ok(())
}

/// Returns the Engineering budget id.
async fn seed_budgets(
    ctx: &EngineContext,
    admin: &Actor,
    manager_id: Uuid,
) -> anyhow::Result<Option<Uuid>> {
    let repo = BudgetRepository::new(ctx.clone());
    let mut engineering = None;

    for (department, total, spent, committed, threshold) in BUDGETS {
        let existing = repo.list(admin, Some(department.to_string())).await?;
        let budget_id = if let Some(view) = existing.first() {
            println!("  {department} budget already exists, skipping...");
            view.budget.id
        } else {
            let created = repo
                .create(
                    admin,
                    NewBudget {
                        department: department.to_string(),
                        fiscal_year: 2026,
                        quarter: None,
                        total_amount: Decimal::from(total),
                        alert_threshold: Some(Decimal::from(threshold)),
                        manager_id: Some(manager_id),
                    },
                )
                .await?;
            let view = repo
                .update(
                    admin,
                    created.budget.id,
                    BudgetPatch {
                        spent_amount: Some(Decimal::from(spent)),
                        committed_amount: Some(Decimal::from(committed)),
                        ..Default::default()
                    },
                )
                .await?;
            println!(
                "  Created {department} budget at {}% utilization",
                view.standing.utilization
            );
            view.budget.id
        };
        if department == "Engineering" {
            engineering = Some(budget_id);
        }
    }
    Ok(engineering)
}

async fn seed_request(
    ctx: &EngineContext,
    requester: &Actor,
    budget_id: Option<Uuid>,
) -> anyhow::Result<()> {
    let repo = RequestRepository::new(ctx.clone());
    let existing = repo
        .list_for_owner(requester, None, procura_shared::types::ListLimit::DEFAULT)
        .await?;
    if !existing.is_empty() {
        println!("  Sample request already exists, skipping...");
        return Ok(());
    }

    let draft = repo
        .create_draft(
            requester,
            NewRequest {
                title: Some("40 Standing Desks".to_string()),
                category: Some("furniture".to_string()),
                description: Some("Height-adjustable desks for the new floor".to_string()),
                quantity: Some(40),
                budget_estimate: Some(Decimal::from(18_000)),
                urgency: Some(Urgency::Medium),
                budget_id,
                ..Default::default()
            },
        )
        .await?;
    repo.apply_directive(requester, draft.id, Directive::AdvanceToSourcing)
        .await?;
    let outcome = repo
        .apply_directive(requester, draft.id, Directive::IssueRfq)
        .await?;
    println!(
        "  Created {} with {} quotes",
        draft.request_number,
        outcome.quotes.len()
    );
    Ok(())
}

fn print_tokens(config: &AppConfig) -> anyhow::Result<()> {
    let jwt = JwtService::new(&config.jwt.secret, config.jwt.leeway_secs);
    println!("Development tokens (valid 24h):");
    for (label, user_id, role, department) in [
        ("admin", ADMIN_ID, "admin", None),
        ("requester", REQUESTER_ID, "requester", Some("Engineering")),
        ("manager", MANAGER_ID, "manager", Some("Engineering")),
        ("finance", FINANCE_ID, "finance", None),
    ] {
        let token = jwt.issue_internal(user_id, role, department.map(str::to_string), 24)?;
        println!("  {label}: {token}");
    }
    Ok(())
}
