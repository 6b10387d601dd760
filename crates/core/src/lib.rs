//! Core procurement logic for Procura.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Each module validates a change and returns what to persist; the `procura-db`
//! crate applies it transactionally.
//!
//! # Modules
//!
//! - `request` - Request lifecycle state machine and directives
//! - `analytics` - Role-scoped spend aggregation
//! - `budget` - Budget commitment ledger
//! - `approval` - Multi-step approval chains
//! - `negotiation` - Negotiation rounds and savings
//! - `reconciliation` - Invoice three-way match
//! - `order` - Purchase-order shipping states
//! - `recurring` - Recurring schedule date arithmetic
//! - `sourcing` - Vendor selection and quote recommendation
//! - `policy` - Roles and capabilities
//! - `audit` - Audit records and diffs
//! - `notification` / `intent` - Ports to external collaborators
//! - `tasks` - Deferred task model

pub mod analytics;
pub mod approval;
pub mod audit;
pub mod budget;
pub mod contract;
pub mod intent;
pub mod negotiation;
pub mod notification;
pub mod numbering;
pub mod order;
pub mod policy;
pub mod reconciliation;
pub mod recurring;
pub mod request;
pub mod sourcing;
pub mod tasks;
