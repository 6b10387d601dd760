//! Request lifecycle: the central state machine.
//!
//! # Modules
//!
//! - `types` - Status, stage, directive and patch types
//! - `error` - Lifecycle errors
//! - `service` - Directive validation and transition planning

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::LifecycleError;
pub use service::LifecycleService;
pub use types::{
    Directive, NewRequest, RequestFacts, RequestPatch, RequestStatus, Stage, Transition, Urgency,
};
