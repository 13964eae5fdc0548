//! Domain models backing the API.
//!
//! Each model derives `sqlx::FromRow` for the repository layer and `serde`
//! for the JSON surface (and for the cache interceptor, which round-trips
//! models through serialized form). Credential material lives in
//! [`user::AuthUser`], which is deliberately not serializable.

pub mod cart;
pub mod order;
pub mod payment;
pub mod product;
pub mod rating;
pub mod user;

pub use cart::{Cart, CartItem};
pub use order::{Order, OrderItem};
pub use payment::Payment;
pub use product::Product;
pub use rating::{ProductRating, Rating};
pub use user::{AuthUser, User};
