//! Order models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use petal_core::{OrderId, OrderStatus, PaymentMethod, ProductId, UserId};

/// An order line item with its referenced product attached.
///
/// The quantity is the immutable snapshot taken at checkout; `name`, `price`
/// and `image` reflect the product as it reads today (weak reference).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub name: String,
    pub price: Decimal,
    pub image: String,
}

/// An order: the immutable snapshot of a cart at checkout time.
///
/// Created once by the checkout workflow; afterwards only the status fields
/// (`status`, `is_paid`, `delivered_at`) change, via the lifecycle
/// transitions.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub shipping_address: String,
    pub shipping_city: String,
    pub phone_number: String,
    pub payment_method: PaymentMethod,
    pub total_price: Decimal,
    pub is_paid: bool,
    pub status: OrderStatus,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Attached by the repository after the row fetch.
    #[sqlx(skip)]
    #[serde(default)]
    pub items: Vec<OrderItem>,
}
