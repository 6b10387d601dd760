//! Outbound notification port.
//!
//! Delivery (email, push) lives outside the engine. Notifications are sent
//! after the owning transaction commits; a failure is logged by the caller
//! and never undoes the state change.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    /// An approval step is waiting.
    ApprovalRequired,
    /// Chain finished (approved or rejected).
    ApprovalCompleted,
    /// Budget crossed its alert threshold.
    BudgetAlert,
    /// Invoice outside tolerance.
    InvoiceMismatch,
    /// Recurring schedule spawned a request.
    RecurringOrder,
    /// Vendor submitted a quote.
    QuoteReceived,
    /// Order acknowledged, shipped or delivered.
    DeliveryUpdate,
    /// Purchase order issued to a vendor.
    PoIssued,
}

impl NotificationKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApprovalRequired => "APPROVAL_REQUIRED",
            Self::ApprovalCompleted => "APPROVAL_COMPLETED",
            Self::BudgetAlert => "BUDGET_ALERT",
            Self::InvoiceMismatch => "INVOICE_MISMATCH",
            Self::RecurringOrder => "RECURRING_ORDER",
            Self::QuoteReceived => "QUOTE_RECEIVED",
            Self::DeliveryUpdate => "DELIVERY_UPDATE",
            Self::PoIssued => "PO_ISSUED",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// User (or vendor) id.
    pub recipient_id: Uuid,
    /// Kind.
    pub kind: NotificationKind,
    /// Short title.
    pub title: String,
    /// Body.
    pub message: String,
    /// Deep link into the app.
    pub link: Option<String>,
}

impl Notification {
    /// Creates a notification.
    #[must_use]
    pub fn new(
        recipient_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id,
            kind,
            title: title.into(),
            message: message.into(),
            link: None,
        }
    }

    /// Adds a deep link.
    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Delivery failure.
#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Fire-and-forget notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers at most once; no retry is owed.
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}
