//! Integration tests for Petal.
//!
//! # Running Tests
//!
//! ```bash
//! # Logic-level tests (no services needed)
//! cargo test -p petal-integration-tests
//!
//! # Live HTTP tests (require a running server + database + redis)
//! cargo run -p petal-cli -- migrate
//! cargo run -p petal-api &
//! cargo test -p petal-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `order_lifecycle` - Order state machine and checkout invariants
//! - `auth_tokens` - Bearer-token issue/verify and staleness rules
//! - `cache_keys` - Cache interceptor key determinism
//! - `api_live` - End-to-end HTTP tests against a running server (`--ignored`)

/// Base URL for the API under test (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("PETAL_API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}
