//! Purchase-order shipping state machine.

pub mod service;
pub mod types;

pub use service::{OrderError, OrderService};
pub use types::{OrderAction, PoStatus};
