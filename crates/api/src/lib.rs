//! Petal API - e-commerce backend library.
//!
//! The binary in `main.rs` wires this together; the CLI and the integration
//! tests link against this crate directly.
//!
//! # Architecture
//!
//! - Axum handlers in [`routes`], returning `Result<_, AppError>`
//! - Business sequencing in [`services`] (checkout workflow, auth, email,
//!   payment gateway, OAuth, images)
//! - `PostgreSQL` repositories in [`db`]; redis read-through decorator in
//!   [`cache`]
//! - Bearer-token guard and role allow-list checks in [`middleware`]
//!
//! All shared clients (pool, cache, gateway, mailer) are constructed once at
//! startup and carried in [`state::AppState`]; nothing is a global.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
