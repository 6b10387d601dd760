//! Integration tests for the budget ledger.

mod common;

use std::sync::Arc;

use rust_decimal_macros::dec;

use common::{FailingNotifier, setup};
use procura_core::budget::BudgetPatch;
use procura_core::notification::NotificationKind;
use procura_core::policy::{Actor, Role};
use procura_core::request::RequestPatch;
use procura_db::{BudgetRepository, EngineContext};
use procura_shared::{AppError, ProcurementConfig};

#[tokio::test]
async fn test_utilization_is_computed_on_read() {
    let h = setup().await;
    let created = h.budget("Engineering", dec!(150000)).await;
    let budgets = h.budgets();

    let view = budgets
        .update(
            &h.finance,
            created.budget.id,
            BudgetPatch {
                spent_amount: Some(dec!(45000)),
                committed_amount: Some(dec!(25000)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(view.standing.utilization, dec!(46.67));
    assert_eq!(view.standing.remaining, dec!(80000));
    assert!(!view.standing.is_over_threshold);
}

#[tokio::test]
async fn test_commit_over_threshold_alerts_manager_without_blocking() {
    let h = setup().await;
    let created = h.budget("IT", dec!(10000)).await;

    let view = h
        .budgets()
        .commit(&h.finance, created.budget.id, dec!(12000))
        .await
        .unwrap();

    assert_eq!(view.standing.utilization, dec!(120));
    assert_eq!(view.standing.remaining, dec!(-2000));
    assert!(view.standing.is_over_threshold);
    let alerts = h.notifier.of_kind(NotificationKind::BudgetAlert);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].recipient_id, h.manager.id);
}

#[tokio::test]
async fn test_decommit_floors_at_zero() {
    let h = setup().await;
    let created = h.budget("IT", dec!(10000)).await;
    let budgets = h.budgets();

    budgets
        .commit(&h.finance, created.budget.id, dec!(300))
        .await
        .unwrap();
    let view = budgets
        .decommit(&h.finance, created.budget.id, dec!(500))
        .await
        .unwrap();
    assert_eq!(view.budget.committed_amount, dec!(0));

    let err = budgets
        .commit(&h.finance, created.budget.id, dec!(-1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_moving_a_request_moves_its_commitment() {
    let h = setup().await;
    let engineering = h.budget("Engineering", dec!(100000)).await;
    let it = h.budget("IT", dec!(100000)).await;
    let draft = h
        .draft("furniture", 10, dec!(5000), Some(engineering.budget.id))
        .await;

    h.requests()
        .update_fields(
            &h.requester,
            draft.id,
            RequestPatch {
                budget_id: Some(Some(it.budget.id)),
                budget_estimate: Some(dec!(6000)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let budgets = h.budgets();
    let old = budgets.get(&h.finance, engineering.budget.id).await.unwrap();
    let new = budgets.get(&h.finance, it.budget.id).await.unwrap();
    assert_eq!(old.budget.committed_amount, dec!(0));
    assert_eq!(new.budget.committed_amount, dec!(6000));
}

#[tokio::test]
async fn test_failed_move_leaves_both_budgets_untouched() {
    let h = setup().await;
    let engineering = h.budget("Engineering", dec!(100000)).await;
    let draft = h
        .draft("furniture", 10, dec!(5000), Some(engineering.budget.id))
        .await;

    let err = h
        .requests()
        .update_fields(
            &h.requester,
            draft.id,
            RequestPatch {
                budget_id: Some(Some(uuid::Uuid::new_v4())),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let view = h
        .budgets()
        .get(&h.finance, engineering.budget.id)
        .await
        .unwrap();
    assert_eq!(view.budget.committed_amount, dec!(5000));
    let request = h.requests().get(&h.requester, draft.id).await.unwrap();
    assert_eq!(request.budget_id, Some(engineering.budget.id));
    assert_eq!(request.version, draft.version);
}

#[tokio::test]
async fn test_requesters_cannot_manage_budgets() {
    let h = setup().await;
    let created = h.budget("Engineering", dec!(100000)).await;

    let err = h
        .budgets()
        .commit(&h.requester, created.budget.id, dec!(10))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let own = h.budgets().list(&h.requester, None).await.unwrap();
    assert_eq!(own.len(), 1);
    let outsider = Actor::new(uuid::Uuid::new_v4(), Role::Requester).with_department("Legal");
    assert!(h.budgets().list(&outsider, None).await.unwrap().is_empty());
    let err = h
        .budgets()
        .get(&outsider, created.budget.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_notification_failure_does_not_undo_commit() {
    let h = setup().await;
    let created = h.budget("IT", dec!(1000)).await;
    let ctx = EngineContext::new(
        h.ctx.db.clone(),
        Arc::new(FailingNotifier),
        ProcurementConfig::default(),
    );

    let view = BudgetRepository::new(ctx)
        .commit(&h.finance, created.budget.id, dec!(900))
        .await
        .unwrap();
    assert!(view.standing.is_over_threshold);
    assert_eq!(view.budget.committed_amount, dec!(900));
}
