//! HTTP route handlers for the API.
//!
//! # Route Structure (all under `/api/v1`)
//!
//! ```text
//! # Users & auth
//! POST   /users/signup                      - Register a customer account
//! POST   /users/seller-signup               - Register a seller (admin only)
//! POST   /users/login                       - Login with email/password
//! GET    /users/re-open                     - Re-validate a stored token
//! POST   /users/forgot-password             - Email a password-reset link
//! PATCH  /users/reset-password/{token}      - Reset password with the link token
//! PATCH  /users/update-my-password          - Rotate password (logged in)
//! GET    /users/auth/google                 - Redirect to the identity provider
//! GET    /users/auth/google/callback        - OAuth callback -> local token
//! GET    /users                             - List active users (admin only)
//! GET    /users/me                          - Current profile
//! PATCH  /users/update-me                   - Update profile (multipart photo)
//! DELETE /users/delete-me                   - Soft-delete the account
//! GET    /users/wishlist                    - List wishlist products
//! POST   /users/wishlist/{product_id}       - Add to wishlist
//! DELETE /users/wishlist/{product_id}       - Remove from wishlist
//!
//! # Catalog
//! POST   /products                          - Create product (seller/admin)
//! GET    /products                          - Full catalog (cached)
//! GET    /products/{id}                     - Product + ratings (cached read)
//! GET    /products/category/{category}      - Category page (cached)
//! GET    /products/name/{name}              - Name search (cached)
//!
//! # Cart
//! GET    /cart                              - Current cart
//! POST   /cart/add-to-cart/{product_id}     - Merge one unit into the cart
//! PATCH  /cart/{product_id}                 - Set a line's quantity
//! DELETE /cart/{product_id}                 - Remove a line
//! PATCH  /cart                              - Clear the cart
//! DELETE /cart                              - Delete the cart document
//!
//! # Orders
//! POST   /orders/make-order                 - Checkout workflow
//! GET    /orders/my-orders                  - Caller's orders, bucketed by status
//! GET    /orders/{id}                       - One order (owner scoped)
//! PATCH  /orders/{id}/cancel                - Cancel a pending order
//! PATCH  /orders/{id}/status                - Advance status (seller/admin)
//!
//! # Payments
//! GET    /payments/success                  - Gateway success redirect
//!
//! # Ratings
//! POST   /ratings/rate-product              - Rate a delivered product
//! ```

pub mod auth;
pub mod cart;
pub mod orders;
pub mod payments;
pub mod products;
pub mod ratings;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::middleware::rate_limit;
use crate::state::AppState;

/// Create the user + auth routes router.
pub fn user_routes() -> Router<AppState> {
    // Credential endpoints sit behind the stricter limiter.
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/seller-signup", post(auth::seller_signup))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password/{token}", patch(auth::reset_password))
        .layer(rate_limit::auth_rate_limiter());

    Router::new()
        .merge(auth_routes)
        .route("/", get(users::list))
        .route("/re-open", get(auth::reopen))
        .route("/update-my-password", patch(auth::update_password))
        .route("/auth/google", get(auth::google_login))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/me", get(users::me))
        .route("/update-me", patch(users::update_me))
        .route("/delete-me", delete(users::delete_me))
        .route("/wishlist", get(users::wishlist))
        .route(
            "/wishlist/{product_id}",
            post(users::wishlist_add).delete(users::wishlist_remove),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/{id}", get(products::show))
        .route("/category/{category}", get(products::by_category))
        .route("/name/{name}", get(products::by_name))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).patch(cart::clear).delete(cart::destroy))
        .route("/add-to-cart/{product_id}", post(cart::add))
        .route("/{product_id}", patch(cart::update).delete(cart::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/make-order", post(orders::make_order))
        .route("/my-orders", get(orders::my_orders))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", patch(orders::cancel))
        .route("/{id}/status", patch(orders::set_status))
}

/// Create all routes for the API, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/users", user_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .route("/payments/success", get(payments::success))
        .route("/ratings/rate-product", post(ratings::rate_product))
        .layer(rate_limit::api_rate_limiter());

    Router::new().nest("/api/v1", api)
}
