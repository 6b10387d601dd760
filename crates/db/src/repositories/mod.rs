//! Repository abstractions for data access.
//!
//! One repository per aggregate. Each public operation runs in a single
//! transaction; the `pub(crate)` helpers take the caller's connection so
//! operations spanning aggregates commit together.

pub mod analytics;
pub mod approval;
pub mod audit;
pub mod budget;
pub mod invoice;
pub mod negotiation;
pub mod recurring;
pub mod request;
mod sequence;
pub mod task;
pub mod vendor;

pub use analytics::AnalyticsRepository;
pub use approval::ApprovalRepository;
pub use audit::{AuditFilter, AuditRepository};
pub use budget::{BudgetRepository, BudgetView, LedgerStep};
pub use invoice::{InvoiceFilter, InvoiceRepository};
pub use negotiation::{NegotiationDetail, NegotiationRepository};
pub use recurring::{RecurringRepository, TickFailure, TickReport};
pub use request::{
    DirectiveOutcome, MessageOutcome, NewAttachment, RequestDetail, RequestRepository,
};
pub use task::{TaskFailure, TaskReport, TaskRepository};
pub use vendor::{NewVendor, QuoteSubmission, VendorFilter, VendorRepository};
