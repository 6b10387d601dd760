//! Request middleware.

pub mod auth;

pub use auth::{AuthUser, AuthVendor, auth_middleware, vendor_auth_middleware};
