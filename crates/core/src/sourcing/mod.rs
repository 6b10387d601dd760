//! Vendor selection, quote synthesis, and quote recommendation.

pub mod service;
pub mod types;

pub use service::SourcingPolicy;
pub use types::{QuoteCandidate, QuoteDraft, VendorCandidate};
