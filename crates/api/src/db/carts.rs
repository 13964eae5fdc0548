//! Cart repository for database operations.
//!
//! Every operation is scoped to the cart owned by one user; there is no way
//! to address another user's cart through this interface. Totals follow the
//! invariant `total_price == sum(quantity * price)`: add-to-cart increments
//! by the unit price, every other mutation recomputes the sum from scratch
//! so rounding drift cannot accumulate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use petal_core::{CartId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartItem};

/// Cart row without its line items.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    total_price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the caller's cart with product data attached to each line item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, total_price, created_at, updated_at
             FROM carts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(self.attach_items(row).await?))
    }

    /// Explicit fetch-and-attach of line items and their referenced products.
    async fn attach_items(&self, row: CartRow) -> Result<Cart, RepositoryError> {
        let items = sqlx::query_as::<_, CartItem>(
            "SELECT ci.product_id, ci.quantity, p.name, p.price, p.image
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.cart_id = $1
             ORDER BY ci.created_at",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?;

        Ok(Cart {
            id: row.id,
            user_id: row.user_id,
            items,
            total_price: row.total_price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    /// Lazily create the user's cart with its first line item.
    ///
    /// Two concurrent creates race to the unique constraint on `user_id`;
    /// the loser gets `Conflict` instead of a duplicate cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has a cart.
    pub async fn create_with_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        unit_price: Decimal,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CartRow>(
            "INSERT INTO carts (user_id, total_price)
             VALUES ($1, $2)
             RETURNING id, user_id, total_price, created_at, updated_at",
        )
        .bind(user_id)
        .bind(unit_price)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "cart already exists"))?;

        sqlx::query("INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, 1)")
            .bind(row.id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let row_id = row.id;
        self.attach_items(row).await.map_err(|e| {
            tracing::warn!(cart_id = %row_id, "failed to re-read cart after create");
            e
        })
    }

    /// Merge one unit of a product into the cart: bump the quantity if the
    /// line exists, append a quantity-1 line otherwise. The total grows by
    /// the unit price either way.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        unit_price: Decimal,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, quantity)
             VALUES ($1, $2, 1)
             ON CONFLICT (cart_id, product_id)
             DO UPDATE SET quantity = cart_items.quantity + 1",
        )
        .bind(cart_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE carts SET total_price = total_price + $2, updated_at = now() WHERE id = $1",
        )
        .bind(cart_id)
        .bind(unit_price)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Remove a line item, then recompute the total from scratch.
    ///
    /// # Returns
    ///
    /// `true` if the line existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn remove_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        self.recompute_total(cart_id).await?;
        Ok(true)
    }

    /// Set a line item's quantity, then recompute the total from scratch.
    ///
    /// # Returns
    ///
    /// `true` if the line existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn set_item_quantity(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $3 WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        self.recompute_total(cart_id).await?;
        Ok(true)
    }

    /// Recompute `total_price` as `SUM(quantity * price)` over the remaining
    /// line items (0 for an empty cart).
    async fn recompute_total(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE carts
             SET total_price = COALESCE((
                     SELECT SUM(ci.quantity * p.price)
                     FROM cart_items ci
                     JOIN products p ON p.id = ci.product_id
                     WHERE ci.cart_id = carts.id
                 ), 0),
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(cart_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Empty the cart: delete all line items and zero the total.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE carts SET total_price = 0, updated_at = now() WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete the user's cart document entirely (items cascade).
    ///
    /// # Returns
    ///
    /// `true` if a cart was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_by_user(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
