//! Payment repository for database operations.

use rust_decimal::Decimal;
use sqlx::PgPool;

use petal_core::{OrderId, PaymentMethod, UserId};

use super::RepositoryError;
use crate::models::Payment;

/// Repository for payment database operations.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a pending card payment against an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a payment already exists for
    /// this (user, order) pair.
    pub async fn create(
        &self,
        user_id: UserId,
        order_id: OrderId,
        method: PaymentMethod,
        amount: Decimal,
        checkout_session_id: Option<&str>,
    ) -> Result<Payment, RepositoryError> {
        sqlx::query_as::<_, Payment>(
            "INSERT INTO payments (user_id, order_id, method, amount, checkout_session_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(user_id)
        .bind(order_id)
        .bind(method)
        .bind(amount)
        .bind(checkout_session_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "payment already recorded"))
    }

    /// Mark the payment for (user, order) as paid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_paid(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Payment>, RepositoryError> {
        Ok(sqlx::query_as::<_, Payment>(
            "UPDATE payments
             SET status = 'paid'::payment_status, updated_at = now()
             WHERE user_id = $1 AND order_id = $2
             RETURNING *",
        )
        .bind(user_id)
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?)
    }
}
