//! Integration tests for role-scoped spend analytics.

mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{Harness, setup};
use procura_core::analytics::SpendWindow;
use procura_core::order::OrderAction;
use procura_core::policy::{Actor, Role, VendorActor};
use procura_core::request::{Directive, NewRequest};
use procura_db::AnalyticsRepository;
use procura_db::entities::purchase_orders;

/// Drives a new request owned by `owner` to PO_GENERATED.
async fn order_as(
    h: &Harness,
    owner: &Actor,
    category: &str,
    quantity: i32,
    estimate: Decimal,
) -> purchase_orders::Model {
    let repo = h.requests();
    let draft = repo
        .create_draft(
            owner,
            NewRequest {
                title: Some(format!("{quantity} x {category}")),
                category: Some(category.to_string()),
                description: Some(format!("{category} for the new office")),
                quantity: Some(quantity),
                budget_estimate: Some(estimate),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to create draft");
    for directive in [
        Directive::AdvanceToSourcing,
        Directive::IssueRfq,
        Directive::StartNegotiation { quote_id: None },
        Directive::GenerateContract,
    ] {
        repo.apply_directive(owner, draft.id, directive)
            .await
            .expect("Directive failed");
    }
    repo.apply_directive(owner, draft.id, Directive::GeneratePo)
        .await
        .expect("Failed to generate PO")
        .purchase_order
        .expect("PO missing from outcome")
}

#[tokio::test]
async fn test_overview_is_scoped_by_role() {
    let h = setup().await;
    h.vendor("Ergo", "furniture", dec!(4.5)).await;
    h.vendor("Dell", "it", dec!(4.4)).await;
    let other = Actor::new(Uuid::new_v4(), Role::Requester);
    order_as(&h, &h.requester, "furniture", 10, dec!(5000)).await;
    order_as(&h, &other, "it", 5, dec!(2000)).await;
    // Never ordered, so it contributes no spend.
    h.draft("furniture", 3, dec!(900), None).await;

    let analytics = AnalyticsRepository::new(h.ctx.clone());
    let now = Utc::now();
    let window = SpendWindow::from_query(Some(30));

    let everyone = analytics.overview(&h.finance, window, now).await.unwrap();
    assert_eq!(everyone.window_days, 30);
    assert_eq!(everyone.spend_by_category.len(), 2);
    assert_eq!(everyone.spend_by_category[0].category, "furniture");
    assert_eq!(everyone.spend_by_category[0].amount, dec!(4500));
    assert_eq!(everyone.spend_by_category[1].category, "it");
    assert_eq!(everyone.spend_by_category[1].amount, dec!(1800));
    assert_eq!(everyone.spend_by_month.len(), 1);
    assert_eq!(everyone.spend_by_month[0].amount, dec!(6300));
    assert_eq!(everyone.vendor_performance.len(), 2);
    assert_eq!(everyone.vendor_performance[0].vendor, "Ergo");
    assert_eq!(everyone.vendor_performance[0].orders, 1);
    assert_eq!(everyone.savings.count, 2);
    assert_eq!(everyone.top_items[0].description, "furniture for the new office");
    assert_eq!(everyone.top_items[0].quantity, 10);

    let own = analytics.overview(&h.requester, window, now).await.unwrap();
    assert_eq!(own.spend_by_category.len(), 1);
    assert_eq!(own.spend_by_category[0].category, "furniture");
    assert_eq!(own.vendor_performance.len(), 1);
    assert_eq!(own.savings.count, 1);

    // Managers are not spend viewers and own nothing here.
    let manager = analytics.overview(&h.manager, window, now).await.unwrap();
    assert!(manager.spend_by_category.is_empty());
    assert!(manager.top_items.is_empty());
    assert_eq!(manager.savings.count, 0);

    // A window that ends before the orders existed is empty.
    let earlier = analytics
        .overview(&h.finance, window, now - Duration::days(60))
        .await
        .unwrap();
    assert!(earlier.spend_by_category.is_empty());
}

#[tokio::test]
async fn test_dashboard_follows_delivery() {
    let h = setup().await;
    h.vendor("Ergo", "furniture", dec!(4.5)).await;
    let order = order_as(&h, &h.requester, "furniture", 10, dec!(5000)).await;
    h.draft("furniture", 3, dec!(900), None).await;

    let analytics = AnalyticsRepository::new(h.ctx.clone());
    let stats = analytics.dashboard(&h.requester, Utc::now()).await.unwrap();
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.pending_approvals, 0);
    assert_eq!(stats.active_orders, 1);
    assert_eq!(stats.total_spend, Decimal::ZERO);
    assert_eq!(stats.monthly_spend, dec!(4500));

    let vendor = VendorActor {
        vendor_id: order.vendor_id,
    };
    for action in [
        OrderAction::Acknowledge,
        OrderAction::Ship {
            tracking_number: None,
            carrier: None,
        },
        OrderAction::Deliver { partial: false },
    ] {
        h.vendors().update_order(vendor, order.id, action).await.unwrap();
    }

    let stats = analytics.dashboard(&h.requester, Utc::now()).await.unwrap();
    assert_eq!(stats.active_orders, 0);
    assert_eq!(stats.total_spend, dec!(4500));

    let overview = analytics
        .overview(&h.requester, SpendWindow::default(), Utc::now())
        .await
        .unwrap();
    let ergo = &overview.vendor_performance[0];
    assert_eq!(ergo.delivered, 1);
    assert_eq!(ergo.on_time_rate, Some(dec!(100)));
    assert!(ergo.average_delivery_days.is_some());

    let stranger = Actor::new(Uuid::new_v4(), Role::Requester);
    let empty = analytics.dashboard(&stranger, Utc::now()).await.unwrap();
    assert_eq!(empty.total_requests, 0);
    assert_eq!(empty.total_spend, Decimal::ZERO);

    let admin = analytics.dashboard(&h.admin, Utc::now()).await.unwrap();
    assert_eq!(admin.total_requests, 2);
}
