//! Petal Core - Shared types library.
//!
//! This crate provides common types used across all Petal components:
//! - `api` - The e-commerce REST service
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and emails, plus the
//!   closed domain enums (roles, product categories, order/payment statuses)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
