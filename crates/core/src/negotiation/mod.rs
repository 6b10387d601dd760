//! Price negotiation rounds for one request/vendor pair.

pub mod error;
pub mod service;
pub mod types;

pub use error::NegotiationError;
pub use service::NegotiationTracker;
pub use types::{
    CounterPlan, NegotiationStatus, OpeningPlan, RoundPlan, RoundStatus, Savings, SavingsSummary,
    Strategy,
};
