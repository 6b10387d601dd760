//! Integration tests for multi-step approval chains.

mod common;

use rust_decimal_macros::dec;

use common::{Harness, setup};
use procura_core::approval::{ApprovalDecision, ApprovalStatus, ApproverSpec};
use procura_core::notification::NotificationKind;
use procura_core::policy::Role;
use procura_core::request::RequestStatus;
use procura_db::ApprovalRepository;
use procura_db::entities::approvals;
use procura_shared::AppError;

fn chain_of(h: &Harness) -> Vec<ApproverSpec> {
    vec![
        ApproverSpec {
            user_id: h.manager.id,
            role: Role::Manager,
            threshold: None,
        },
        ApproverSpec {
            user_id: h.finance.id,
            role: Role::Finance,
            threshold: Some(dec!(5000)),
        },
    ]
}

async fn submitted(h: &Harness) -> (uuid::Uuid, Vec<approvals::Model>) {
    let draft = h.draft("furniture", 10, dec!(5000), None).await;
    let chain = ApprovalRepository::new(h.ctx.clone())
        .create_chain(&h.requester, draft.id, &chain_of(h))
        .await
        .expect("Failed to create chain");
    (draft.id, chain)
}

#[tokio::test]
async fn test_chain_notifies_only_the_first_approver() {
    let h = setup().await;
    let (request_id, chain) = submitted(&h).await;

    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].step, 1);
    assert_eq!(chain[1].step, 2);
    assert!(chain.iter().all(|a| a.status == "PENDING"));
    let request = h.requests().get(&h.requester, request_id).await.unwrap();
    assert_eq!(request.status, RequestStatus::PendingApproval.as_str());

    let asks = h.notifier.of_kind(NotificationKind::ApprovalRequired);
    assert_eq!(asks.len(), 1);
    assert_eq!(asks[0].recipient_id, h.manager.id);
}

#[tokio::test]
async fn test_last_approval_approves_the_request() {
    let h = setup().await;
    let (request_id, chain) = submitted(&h).await;
    let approvals = ApprovalRepository::new(h.ctx.clone());

    approvals
        .decide(&h.manager, chain[0].id, ApprovalDecision::Approve, None)
        .await
        .unwrap();
    let mid = h.requests().get(&h.requester, request_id).await.unwrap();
    assert_eq!(mid.status, RequestStatus::PendingApproval.as_str());
    let asks = h.notifier.of_kind(NotificationKind::ApprovalRequired);
    assert_eq!(asks.last().unwrap().recipient_id, h.finance.id);

    approvals
        .decide(&h.finance, chain[1].id, ApprovalDecision::Approve, None)
        .await
        .unwrap();
    let done = h.requests().get(&h.requester, request_id).await.unwrap();
    assert_eq!(done.status, RequestStatus::Approved.as_str());
    let completed = h.notifier.of_kind(NotificationKind::ApprovalCompleted);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].recipient_id, h.requester.id);
}

#[tokio::test]
async fn test_rejection_rejects_request_and_leaves_later_steps_pending() {
    let h = setup().await;
    let (request_id, chain) = submitted(&h).await;
    let approvals = ApprovalRepository::new(h.ctx.clone());

    let decided = approvals
        .decide(
            &h.manager,
            chain[0].id,
            ApprovalDecision::Reject,
            Some("Over spec".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(decided.status, ApprovalStatus::Rejected.as_str());
    assert_eq!(decided.comments.as_deref(), Some("Over spec"));

    let request = h.requests().get(&h.requester, request_id).await.unwrap();
    assert_eq!(request.status, RequestStatus::Rejected.as_str());
    let steps = approvals
        .list_for_request(&h.requester, request_id)
        .await
        .unwrap();
    assert_eq!(steps[1].status, ApprovalStatus::Pending.as_str());
}

#[tokio::test]
async fn test_only_the_assigned_approver_decides_once() {
    let h = setup().await;
    let (_, chain) = submitted(&h).await;
    let approvals = ApprovalRepository::new(h.ctx.clone());

    let err = approvals
        .decide(&h.finance, chain[0].id, ApprovalDecision::Approve, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    approvals
        .decide(&h.manager, chain[0].id, ApprovalDecision::Approve, None)
        .await
        .unwrap();
    let err = approvals
        .decide(&h.manager, chain[0].id, ApprovalDecision::Approve, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_later_approver_cannot_decide_before_earlier_step() {
    let h = setup().await;
    let (request_id, chain) = submitted(&h).await;
    let approvals = ApprovalRepository::new(h.ctx.clone());

    let err = approvals
        .decide(&h.finance, chain[1].id, ApprovalDecision::Approve, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    let request = h.requests().get(&h.requester, request_id).await.unwrap();
    assert_eq!(request.status, RequestStatus::PendingApproval.as_str());
    let steps = approvals
        .list_for_request(&h.requester, request_id)
        .await
        .unwrap();
    assert!(steps.iter().all(|a| a.status == ApprovalStatus::Pending.as_str()));

    approvals
        .decide(&h.manager, chain[0].id, ApprovalDecision::Approve, None)
        .await
        .unwrap();
    approvals
        .decide(&h.finance, chain[1].id, ApprovalDecision::Approve, None)
        .await
        .unwrap();
    let done = h.requests().get(&h.requester, request_id).await.unwrap();
    assert_eq!(done.status, RequestStatus::Approved.as_str());
}

#[tokio::test]
async fn test_chain_input_is_validated() {
    let h = setup().await;
    let draft = h.draft("furniture", 10, dec!(5000), None).await;
    let approvals = ApprovalRepository::new(h.ctx.clone());

    let err = approvals
        .create_chain(&h.requester, draft.id, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let twice = vec![chain_of(&h)[0].clone(), chain_of(&h)[0].clone()];
    let err = approvals
        .create_chain(&h.requester, draft.id, &twice)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let untouched = h.requests().get(&h.requester, draft.id).await.unwrap();
    assert_eq!(untouched.status, RequestStatus::Draft.as_str());
}

#[tokio::test]
async fn test_approver_inbox_lists_pending_steps() {
    let h = setup().await;
    submitted(&h).await;
    submitted(&h).await;
    let approvals = ApprovalRepository::new(h.ctx.clone());

    let inbox = approvals
        .list_for_approver(&h.finance, Some(ApprovalStatus::Pending))
        .await
        .unwrap();
    assert_eq!(inbox.len(), 2);
    assert!(
        approvals
            .list_for_approver(&h.requester, None)
            .await
            .unwrap()
            .is_empty()
    );
}
