//! Order repository for database operations.

use std::collections::HashMap;

use sqlx::PgPool;

use petal_core::{OrderId, OrderStatus, PaymentMethod, ProductId, UserId};

use super::RepositoryError;
use super::products::ProductRepository;
use crate::models::{Cart, Order, OrderItem};

/// Line-item row carrying its order id, for batch attachment.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    name: String,
    price: rust_decimal::Decimal,
    image: String,
}

impl OrderItemRow {
    fn into_item(self) -> OrderItem {
        OrderItem {
            product_id: self.product_id,
            quantity: self.quantity,
            name: self.name,
            price: self.price,
            image: self.image,
        }
    }
}

/// Details the checkout workflow validated before creating an order.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub shipping_address: &'a str,
    pub shipping_city: &'a str,
    pub phone_number: &'a str,
    pub payment_method: PaymentMethod,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Snapshot a cart into a new `Pending` order and apply the stock
    /// decrement, all in one transaction.
    ///
    /// The decrement is a single conditional batch statement over every line
    /// item; if any product lacks stock the whole transaction rolls back, so
    /// stock never goes negative and no half-applied order is left behind.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if stock ran out for any line.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_from_cart(
        &self,
        user_id: UserId,
        cart: &Cart,
        details: NewOrder<'_>,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut order = sqlx::query_as::<_, Order>(
            "INSERT INTO orders
                 (user_id, shipping_address, shipping_city, phone_number, payment_method, total_price)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(user_id)
        .bind(details.shipping_address)
        .bind(details.shipping_city)
        .bind(details.phone_number)
        .bind(details.payment_method)
        .bind(cart.total_price)
        .fetch_one(&mut *tx)
        .await?;

        let (product_ids, quantities): (Vec<uuid::Uuid>, Vec<i32>) = cart
            .items
            .iter()
            .map(|item| (item.product_id.as_uuid(), item.quantity))
            .unzip();

        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity)
             SELECT $1, product_id, quantity
             FROM UNNEST($2::uuid[], $3::int4[]) AS t (product_id, quantity)",
        )
        .bind(order.id)
        .bind(&product_ids)
        .bind(&quantities)
        .execute(&mut *tx)
        .await?;

        let line_items: Vec<(ProductId, i32)> = cart
            .items
            .iter()
            .map(|item| (item.product_id, item.quantity))
            .collect();
        let updated = ProductRepository::decrement_stock_batch(&mut *tx, &line_items).await?;

        if updated != line_items.len() as u64 {
            tx.rollback().await?;
            return Err(RepositoryError::Conflict(
                "insufficient stock for one or more items".to_owned(),
            ));
        }

        tx.commit().await?;

        // The snapshot mirrors the cart lines it was created from.
        order.items = cart
            .items
            .iter()
            .map(|item| OrderItem {
                product_id: item.product_id,
                quantity: item.quantity,
                name: item.name.clone(),
                price: item.price,
                image: item.image.clone(),
            })
            .collect();

        Ok(order)
    }

    /// Get an order (with items attached) by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        let Some(order) = order else {
            return Ok(None);
        };

        let mut orders = self.attach_items(vec![order]).await?;
        Ok(orders.pop())
    }

    /// Get an order by id, scoped to its owner.
    ///
    /// A non-owner gets `None`, indistinguishable from a missing order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_by_id_for_user(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order =
            sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;

        let Some(order) = order else {
            return Ok(None);
        };

        let mut orders = self.attach_items(vec![order]).await?;
        Ok(orders.pop())
    }

    /// List a user's orders (with items attached), newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(orders).await
    }

    /// Explicit fetch-and-attach of line items for a batch of orders.
    async fn attach_items(&self, mut orders: Vec<Order>) -> Result<Vec<Order>, RepositoryError> {
        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<uuid::Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();

        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT oi.order_id, oi.product_id, oi.quantity, p.name, p.price, p.image
             FROM order_items oi
             JOIN products p ON p.id = oi.product_id
             WHERE oi.order_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            by_order
                .entry(row.order_id)
                .or_default()
                .push(row.into_item());
        }

        for order in &mut orders {
            order.items = by_order.remove(&order.id).unwrap_or_default();
        }

        Ok(orders)
    }

    /// Move an order to a new status, stamping `delivered_at` on delivery.
    ///
    /// The caller is responsible for checking the state machine first; this
    /// is the raw write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders
             SET status = $2,
                 delivered_at = CASE WHEN $2 = 'delivered'::order_status THEN now() ELSE delivered_at END,
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Flip the paid flag on an order.
    ///
    /// # Returns
    ///
    /// `true` if the order existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_paid(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE orders SET is_paid = TRUE, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether the user has a `Delivered` order containing the product.
    ///
    /// Gates rating creation: only buyers who received the product may rate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_delivered_order_with_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT 1
             FROM orders o
             JOIN order_items oi ON oi.order_id = o.id
             WHERE o.user_id = $1
               AND oi.product_id = $2
               AND o.status = 'delivered'::order_status
             LIMIT 1",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.is_some())
    }
}
