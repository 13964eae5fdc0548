//! Product rating models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use petal_core::{ProductId, RatingId, UserId};

/// A single rating of a product by a user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Rating {
    pub id: RatingId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: i16,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A rating with its author attached (name and photo JOINed from `users`).
///
/// This is the shape product detail pages render review lists from.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductRating {
    pub id: RatingId,
    pub rating: i16,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author_name: String,
    pub author_photo: String,
}
