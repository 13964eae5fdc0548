//! Catalog entry model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use petal_core::{Category, ProductId, UserId};

/// A seller-owned catalog entry.
///
/// `in_stock` never goes negative: it is decremented only by the checkout
/// batch update (which is conditional on sufficient stock) and restored only
/// by order cancellation. `rating_count`/`rating_avg` are maintained by the
/// rating aggregation pass.
///
/// Derives `Deserialize` as well because catalog reads round-trip through
/// the cache interceptor's serialized form.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: String,
    pub category: Category,
    pub in_stock: i32,
    pub sold_count: i32,
    pub rating_count: i32,
    pub rating_avg: Decimal,
    pub seller_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether any units are left to sell.
    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        self.in_stock > 0
    }
}
