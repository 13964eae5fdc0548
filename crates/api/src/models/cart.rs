//! Shopping cart models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use petal_core::{CartId, ProductId, UserId};

/// A cart line item with its referenced product attached.
///
/// `name`, `price` and `image` come from the product JOIN at read time; the
/// product itself is referenced, never owned.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub name: String,
    pub price: Decimal,
    pub image: String,
}

impl CartItem {
    /// Price contribution of this line (`quantity x unit price`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A user's cart with attached line items.
///
/// Invariant: `total_price == sum(line.quantity * product.price)` after any
/// mutation. Add-to-cart increments the total by the unit price; remove and
/// update-quantity recompute it from scratch so drift cannot accumulate.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let item = CartItem {
            product_id: ProductId::generate(),
            quantity: 3,
            name: "Rose Lip Tint".to_string(),
            price: Decimal::new(1250, 2),
            image: "lip-tint.jpeg".to_string(),
        };
        assert_eq!(item.line_total(), Decimal::new(3750, 2));
    }
}
