//! Request lifecycle domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::negotiation::NegotiationStatus;

/// Authoritative workflow state of a purchase request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Being described by the requester.
    Draft,
    /// Looking for vendors.
    Sourcing,
    /// RFQ issued, quotes arriving.
    Quoting,
    /// Price negotiation with one vendor.
    Negotiating,
    /// Contract drafted, under review.
    Reviewing,
    /// Approval chain running.
    PendingApproval,
    /// Approval chain completed.
    Approved,
    /// An approver rejected the request.
    Rejected,
    /// Purchase order issued.
    PoGenerated,
    /// Vendor acknowledged the order.
    Ordered,
    /// Goods shipped.
    Shipped,
    /// Part of the goods arrived.
    PartiallyDelivered,
    /// All goods arrived.
    Delivered,
    /// Vendor invoice received.
    Invoiced,
    /// Invoice paid.
    Paid,
    /// Closed by an operator.
    Closed,
    /// Finished.
    Completed,
    /// Abandoned.
    Cancelled,
}

impl RequestStatus {
    /// Every status, in workflow order.
    pub const ALL: [Self; 18] = [
        Self::Draft,
        Self::Sourcing,
        Self::Quoting,
        Self::Negotiating,
        Self::Reviewing,
        Self::PendingApproval,
        Self::Approved,
        Self::Rejected,
        Self::PoGenerated,
        Self::Ordered,
        Self::Shipped,
        Self::PartiallyDelivered,
        Self::Delivered,
        Self::Invoiced,
        Self::Paid,
        Self::Closed,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Sourcing => "SOURCING",
            Self::Quoting => "QUOTING",
            Self::Negotiating => "NEGOTIATING",
            Self::Reviewing => "REVIEWING",
            Self::PendingApproval => "PENDING_APPROVAL",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::PoGenerated => "PO_GENERATED",
            Self::Ordered => "ORDERED",
            Self::Shipped => "SHIPPED",
            Self::PartiallyDelivered => "PARTIALLY_DELIVERED",
            Self::Delivered => "DELIVERED",
            Self::Invoiced => "INVOICED",
            Self::Paid => "PAID",
            Self::Closed => "CLOSED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_uppercase();
        Self::ALL.into_iter().find(|status| status.as_str() == upper)
    }

    /// Statuses from which the request can still be cancelled.
    #[must_use]
    pub fn is_pre_order(&self) -> bool {
        matches!(
            self,
            Self::Draft
                | Self::Sourcing
                | Self::Quoting
                | Self::Negotiating
                | Self::Reviewing
                | Self::PendingApproval
                | Self::Approved
                | Self::Rejected
        )
    }

    /// Whether the request's estimate is still reserved against its budget.
    #[must_use]
    pub fn holds_commitment(&self) -> bool {
        !matches!(
            self,
            Self::Paid | Self::Closed | Self::Completed | Self::Cancelled
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Conversational progress marker, orthogonal to status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Nothing captured yet.
    Initial,
    /// Vendors being searched.
    VendorSearch,
    /// RFQ sent, no quotes yet.
    RfqSent,
    /// Quotes available.
    QuotesReceived,
    /// Negotiation in progress.
    Negotiating,
    /// Contract under review.
    ContractReview,
    /// Purchase order issued.
    Complete,
}

impl Stage {
    /// Returns the string representation of the stage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::VendorSearch => "vendor_search",
            Self::RfqSent => "rfq_sent",
            Self::QuotesReceived => "quotes_received",
            Self::Negotiating => "negotiating",
            Self::ContractReview => "contract_review",
            Self::Complete => "complete",
        }
    }

    /// Parses a stage from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "initial" => Some(Self::Initial),
            "vendor_search" => Some(Self::VendorSearch),
            "rfq_sent" => Some(Self::RfqSent),
            "quotes_received" => Some(Self::QuotesReceived),
            "negotiating" => Some(Self::Negotiating),
            "contract_review" => Some(Self::ContractReview),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    /// No rush.
    Low,
    /// Default.
    #[default]
    Medium,
    /// Soon.
    High,
    /// Blocking work.
    Critical,
}

impl Urgency {
    /// Returns the string representation of the urgency.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Parses an urgency from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// A lifecycle command, usually proposed by the intent extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum Directive {
    /// DRAFT → SOURCING.
    AdvanceToSourcing,
    /// SOURCING → QUOTING, soliciting a batch of quotes.
    IssueRfq,
    /// QUOTING/REVIEWING → NEGOTIATING.
    StartNegotiation {
        /// Quote chosen by the caller, if any.
        #[serde(default)]
        quote_id: Option<Uuid>,
    },
    /// NEGOTIATING → REVIEWING, drafting the contract.
    GenerateContract,
    /// REVIEWING/APPROVED → PO_GENERATED.
    GeneratePo,
}

impl Directive {
    /// Returns the wire name of the directive.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdvanceToSourcing => "advance_to_sourcing",
            Self::IssueRfq => "issue_rfq",
            Self::StartNegotiation { .. } => "start_negotiation",
            Self::GenerateContract => "generate_contract",
            Self::GeneratePo => "generate_po",
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fields captured when a request is first created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRequest {
    /// Title shown in lists.
    pub title: Option<String>,
    /// Goods category, e.g. "furniture".
    pub category: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Units requested.
    pub quantity: Option<i32>,
    /// Structured specifications.
    pub specifications: Option<serde_json::Value>,
    /// Estimated spend.
    pub budget_estimate: Option<Decimal>,
    /// Urgency, defaults to medium.
    pub urgency: Option<Urgency>,
    /// Where goods should arrive.
    pub delivery_location: Option<String>,
    /// Budget to commit the estimate against.
    pub budget_id: Option<Uuid>,
}

/// Manual correction of request fields.
///
/// `budget_id: Some(None)` unlinks the budget; `None` leaves it unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestPatch {
    /// New title.
    pub title: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New quantity.
    pub quantity: Option<i32>,
    /// New specifications.
    pub specifications: Option<serde_json::Value>,
    /// New spend estimate.
    pub budget_estimate: Option<Decimal>,
    /// New urgency.
    pub urgency: Option<Urgency>,
    /// New delivery location.
    pub delivery_location: Option<String>,
    /// Budget link change.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub budget_id: Option<Option<Uuid>>,
    /// Status correction.
    pub status: Option<RequestStatus>,
    /// Stage correction.
    pub stage: Option<Stage>,
}

impl RequestPatch {
    /// Whether the patch edits workflow state directly.
    #[must_use]
    pub fn touches_workflow_state(&self) -> bool {
        self.status.is_some() || self.stage.is_some()
    }
}

/// Facts about a request's children that directives depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFacts {
    /// A contract exists.
    pub has_contract: bool,
    /// Status of the active negotiation, if any.
    pub negotiation: Option<NegotiationStatus>,
}

/// A validated status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Status the request must still be in when the change commits.
    pub from: RequestStatus,
    /// Resulting status.
    pub to: RequestStatus,
    /// Resulting stage, `None` keeps the current one.
    pub stage: Option<Stage>,
}

impl Transition {
    /// Replaces the resulting stage.
    #[must_use]
    pub const fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }
}
