//! Integration tests for negotiation rounds, savings and deferred counters.

mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{Harness, setup};
use procura_core::policy::{Actor, Role};
use procura_core::request::Directive;
use procura_core::tasks::TaskStatus;
use procura_db::entities::negotiations;
use procura_db::{AuditFilter, AuditRepository, NegotiationRepository, TaskRepository};
use procura_shared::AppError;

async fn negotiating(h: &Harness) -> negotiations::Model {
    let draft = h.draft("furniture", 10, dec!(5000), None).await;
    h.quoted(draft.id).await;
    h.requests()
        .apply_directive(
            &h.requester,
            draft.id,
            Directive::StartNegotiation { quote_id: None },
        )
        .await
        .expect("Failed to start negotiation")
        .negotiation
        .expect("negotiation missing from outcome")
}

async fn settle_at(h: &Harness, price: Decimal) {
    let repo = NegotiationRepository::new(h.ctx.clone());
    let negotiation = negotiating(h).await;
    repo.record_counter(&h.requester, negotiation.id, price, None, None)
        .await
        .unwrap();
    repo.accept(&h.requester, negotiation.id).await.unwrap();
}

#[tokio::test]
async fn test_opening_round_uses_default_strategy() {
    let h = setup().await;
    h.vendor("Ergo", "furniture", dec!(4.5)).await;
    let negotiation = negotiating(&h).await;

    assert_eq!(negotiation.original_price, dec!(4500));
    assert_eq!(negotiation.current_price, dec!(4500));
    assert_eq!(negotiation.target_price, dec!(3825));
    assert_eq!(negotiation.status, "OPEN");

    let detail = NegotiationRepository::new(h.ctx.clone())
        .get(&h.requester, negotiation.id)
        .await
        .unwrap();
    assert_eq!(detail.rounds.len(), 1);
    assert_eq!(detail.rounds[0].our_offer, Some(dec!(3600)));
}

#[tokio::test]
async fn test_counters_append_rounds_until_closed() {
    let h = setup().await;
    h.vendor("Ergo", "furniture", dec!(4.5)).await;
    let negotiation = negotiating(&h).await;
    let repo = NegotiationRepository::new(h.ctx.clone());

    let countered = repo
        .record_counter(
            &h.requester,
            negotiation.id,
            dec!(4200),
            Some(dec!(3900)),
            Some("Can meet you at 4200".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(countered.negotiation.status, "COUNTERED");
    assert_eq!(countered.negotiation.current_price, dec!(4200));
    assert_eq!(countered.rounds.len(), 2);
    assert_eq!(countered.rounds[1].round, 2);
    assert_eq!(countered.rounds[1].vendor_response, Some(dec!(4200)));

    let rejected = repo.reject(&h.requester, negotiation.id).await.unwrap();
    assert_eq!(rejected.negotiation.status, "REJECTED");

    let err = repo
        .record_counter(&h.requester, negotiation.id, dec!(4000), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    let err = repo.accept(&h.requester, negotiation.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    let err = h
        .requests()
        .apply_directive(&h.requester, negotiation.request_id, Directive::GenerateContract)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_savings_average_is_unweighted() {
    let h = setup().await;
    h.vendor("Ergo", "furniture", dec!(4.5)).await;
    settle_at(&h, dec!(4050)).await;
    settle_at(&h, dec!(3150)).await;
    // Rejected negotiations do not count.
    let abandoned = negotiating(&h).await;
    NegotiationRepository::new(h.ctx.clone())
        .reject(&h.requester, abandoned.id)
        .await
        .unwrap();

    let repo = NegotiationRepository::new(h.ctx.clone());
    for viewer in [&h.finance, &h.requester] {
        let summary = repo.savings_summary(viewer).await.unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_savings, dec!(1800));
        assert_eq!(summary.average_savings_percent, dec!(20));
    }

    // Managers and other requesters only see their own requests.
    let stranger = Actor::new(Uuid::new_v4(), Role::Requester);
    for viewer in [&h.manager, &stranger] {
        let summary = repo.savings_summary(viewer).await.unwrap();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.total_savings, Decimal::ZERO);
    }
}

#[tokio::test]
async fn test_deferred_counter_offer_runs_once() {
    let h = setup().await;
    h.vendor("Ergo", "furniture", dec!(4.5)).await;
    let negotiation = negotiating(&h).await;
    let tasks = TaskRepository::new(h.ctx.clone());

    let report = tasks.run_due(&h.admin, Utc::now() - Duration::hours(1)).await.unwrap();
    assert_eq!(report.executed, 0);

    let pending = tasks.pending(&h.admin).await.unwrap();
    assert_eq!(pending.len(), 1);
    let ran = tasks.run_now(&h.admin, pending[0].id).await.unwrap();
    assert_eq!(ran.status, TaskStatus::Done.as_str());
    assert_eq!(ran.attempts, 1);

    let detail = NegotiationRepository::new(h.ctx.clone())
        .get(&h.requester, negotiation.id)
        .await
        .unwrap();
    assert_eq!(detail.negotiation.current_price, dec!(4050));
    assert_eq!(detail.rounds.len(), 2);
    assert_eq!(detail.rounds[1].our_offer, Some(dec!(3825)));

    let err = tasks.run_now(&h.admin, pending[0].id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    let err = tasks.pending(&h.requester).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_counter_on_closed_negotiation_is_skipped() {
    let h = setup().await;
    h.vendor("Ergo", "furniture", dec!(4.5)).await;
    let negotiation = negotiating(&h).await;
    NegotiationRepository::new(h.ctx.clone())
        .accept(&h.requester, negotiation.id)
        .await
        .unwrap();
    let tasks = TaskRepository::new(h.ctx.clone());
    let task_id = tasks.pending(&h.admin).await.unwrap()[0].id;

    let report = tasks
        .run_due(&h.admin, Utc::now() + Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(report.executed, 0);
    assert_eq!(report.skipped, 1);
    assert!(report.failed.is_empty());

    assert!(tasks.pending(&h.admin).await.unwrap().is_empty());
    let err = tasks.run_now(&h.admin, task_id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    let detail = NegotiationRepository::new(h.ctx.clone())
        .get(&h.requester, negotiation.id)
        .await
        .unwrap();
    assert_eq!(detail.negotiation.status, "ACCEPTED");
    assert_eq!(detail.rounds.len(), 1);

    let trail = AuditRepository::new(h.ctx.clone())
        .list(
            &h.admin,
            AuditFilter {
                entity_type: Some("ScheduledTask".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].entity_id, task_id);
    assert_eq!(trail[0].after.as_ref().unwrap()["status"], TaskStatus::Skipped.as_str());
    assert_eq!(trail[0].after.as_ref().unwrap()["last_error"], serde_json::Value::Null);
}
