//! Shared types, errors, and configuration for Procura.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error taxonomy
//! - Configuration management, including procurement policy knobs
//! - JWT claims for the internal and vendor authentication realms
//! - List limits for read endpoints

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use config::{AppConfig, ProcurementConfig};
pub use error::{AppError, AppResult};
