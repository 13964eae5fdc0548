//! Database access for the Petal API.
//!
//! # Tables
//!
//! - `users` (+ `wishlist_items`) - Accounts, credentials, wishlist
//! - `products` - Seller-owned catalog entries with stock and rating aggregates
//! - `carts` / `cart_items` - One mutable cart per user
//! - `orders` / `order_items` - Immutable checkout snapshots
//! - `payments` - One per card order
//! - `ratings` - One per (product, user)
//!
//! Repositories use runtime-checked queries (`query_as`) so the workspace
//! builds without a live database. Referenced products are attached to cart
//! and order line items with explicit JOINs at the call site; there is no
//! implicit populate-on-read machinery.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p petal-cli -- migrate
//! ```

pub mod carts;
pub mod orders;
pub mod payments;
pub mod products;
pub mod ratings;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors from the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The requested row does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value failed to round-trip into its domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

impl RepositoryError {
    /// Map a sqlx error, turning unique violations into `Conflict`.
    pub(crate) fn from_unique_violation(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
