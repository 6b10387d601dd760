//! Integration tests for invoice reconciliation against purchase orders.

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::setup;
use procura_core::notification::NotificationKind;
use procura_core::reconciliation::{InvoiceAction, InvoiceStatus, MatchStatus, NewInvoice};
use procura_core::request::RequestStatus;
use procura_db::{InvoiceFilter, InvoiceRepository};
use procura_shared::AppError;

fn invoice(number: &str, total: Decimal) -> NewInvoice {
    NewInvoice {
        invoice_number: number.to_string(),
        subtotal: total,
        tax: dec!(0),
        total,
        items: serde_json::json!([]),
        due_date: None,
    }
}

#[tokio::test]
async fn test_invoices_are_classified_against_the_order_total() {
    let h = setup().await;
    h.vendor("Ergo", "furniture", dec!(4.5)).await;
    let draft = h.draft("furniture", 10, dec!(5000), None).await;
    let order = h.ordered(draft.id).await;
    assert_eq!(order.total, dec!(4500));
    let invoices = InvoiceRepository::new(h.ctx.clone());

    let exact = invoices
        .submit(&h.requester, order.id, invoice("INV-1", dec!(4500)))
        .await
        .unwrap();
    assert_eq!(exact.match_status, MatchStatus::Matched.as_str());
    assert_eq!(exact.variance, dec!(0));
    assert_eq!(exact.status, InvoiceStatus::Received.as_str());

    let close = invoices
        .submit(&h.requester, order.id, invoice("INV-2", dec!(4600)))
        .await
        .unwrap();
    assert_eq!(close.match_status, MatchStatus::PartialMatch.as_str());
    assert_eq!(close.variance, dec!(100));
    assert!(h.notifier.of_kind(NotificationKind::InvoiceMismatch).is_empty());

    let far = invoices
        .submit(&h.requester, order.id, invoice("INV-3", dec!(5000)))
        .await
        .unwrap();
    assert_eq!(far.match_status, MatchStatus::Mismatch.as_str());
    assert!(far.variance_reason.is_some());
    let mismatches = h.notifier.of_kind(NotificationKind::InvoiceMismatch);
    assert_eq!(mismatches.len(), 1);
    assert!(mismatches[0].message.contains("11.1%"));

    let request = h.requests().get(&h.requester, draft.id).await.unwrap();
    assert_eq!(request.status, RequestStatus::Invoiced.as_str());

    let listed = invoices
        .list(
            &h.finance,
            InvoiceFilter {
                po_id: Some(order.id),
                match_status: Some(MatchStatus::Mismatch),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, far.id);
}

#[tokio::test]
async fn test_invoice_status_machine() {
    let h = setup().await;
    h.vendor("Ergo", "furniture", dec!(4.5)).await;
    let draft = h.draft("furniture", 10, dec!(5000), None).await;
    let order = h.ordered(draft.id).await;
    let invoices = InvoiceRepository::new(h.ctx.clone());
    let received = invoices
        .submit(&h.requester, order.id, invoice("INV-9", dec!(5000)))
        .await
        .unwrap();

    let err = invoices
        .decide(&h.manager, received.id, InvoiceAction::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = invoices
        .decide(
            &h.finance,
            received.id,
            InvoiceAction::Dispute {
                reason: "  ".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let disputed = invoices
        .decide(
            &h.finance,
            received.id,
            InvoiceAction::Dispute {
                reason: "Quantity short by two".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(disputed.status, InvoiceStatus::Disputed.as_str());
    assert_eq!(disputed.dispute_reason.as_deref(), Some("Quantity short by two"));

    let err = invoices
        .decide(
            &h.finance,
            received.id,
            InvoiceAction::Pay {
                amount: None,
                method: None,
                reference: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    let approved = invoices
        .decide(&h.finance, received.id, InvoiceAction::Approve)
        .await
        .unwrap();
    assert_eq!(approved.status, InvoiceStatus::Approved.as_str());
    assert_eq!(approved.match_status, MatchStatus::Matched.as_str());

    let paid = invoices
        .decide(
            &h.finance,
            received.id,
            InvoiceAction::Pay {
                amount: Some(dec!(4500)),
                method: Some("ACH".to_string()),
                reference: Some("TX-1".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid.as_str());
    assert_eq!(paid.paid_amount, Some(dec!(4500)));

    let vendor = h
        .vendors()
        .list(procura_db::VendorFilter::default())
        .await
        .unwrap()
        .into_iter()
        .find(|v| v.id == order.vendor_id)
        .unwrap();
    assert_eq!(vendor.total_orders, 1);
    assert_eq!(vendor.total_value, dec!(4500));

    let err = invoices
        .submit(&h.requester, order.id, invoice("INV-10", dec!(10)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let h = setup().await;
    let err = InvoiceRepository::new(h.ctx.clone())
        .submit(&h.requester, uuid::Uuid::new_v4(), invoice("INV-0", dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
