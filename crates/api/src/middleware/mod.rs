//! Request middleware: the auth guard and rate limiting.

pub mod auth;
pub mod rate_limit;

pub use auth::{CurrentUser, authorize};
