//! Core types for Petal.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod email;
pub mod id;
pub mod order;
pub mod role;

pub use catalog::Category;
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{OrderStatus, PaymentMethod, PaymentStatus};
pub use role::Role;
