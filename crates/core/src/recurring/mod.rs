//! Recurring order schedules.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::{RecurringScheduler, ScheduleError};
pub use types::{Frequency, ScheduleParams, SchedulePatch};
