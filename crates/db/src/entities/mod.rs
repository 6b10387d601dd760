//! `SeaORM` entities.
//!
//! Status columns are stored as strings and parsed into the core enums by
//! accessor methods on the models.

pub mod approvals;
pub mod attachments;
pub mod audit_logs;
pub mod budgets;
pub mod contracts;
pub mod deliveries;
pub mod document_sequences;
pub mod invoices;
pub mod negotiation_rounds;
pub mod negotiations;
pub mod purchase_orders;
pub mod quotes;
pub mod recurring_schedules;
pub mod request_messages;
pub mod requests;
pub mod scheduled_tasks;
pub mod vendors;
