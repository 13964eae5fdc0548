//! Rating repository for database operations.

use rust_decimal::Decimal;
use sqlx::PgPool;

use petal_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::{ProductRating, Rating};

/// Aggregate over a product's ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingAggregate {
    pub count: i32,
    pub average: Decimal,
}

impl RatingAggregate {
    /// Aggregate applied to a product with no ratings at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            count: 0,
            average: Decimal::new(45, 1),
        }
    }
}

/// Repository for rating database operations.
pub struct RatingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RatingRepository<'a> {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already rated this
    /// product.
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        rating: i16,
        review: Option<&str>,
    ) -> Result<Rating, RepositoryError> {
        sqlx::query_as::<_, Rating>(
            "INSERT INTO ratings (product_id, user_id, rating, review)
             VALUES ($1, $2, $3, $4)
             RETURNING id, product_id, user_id, rating, review, created_at",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(rating)
        .bind(review)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "product already rated"))
    }

    /// List a product's ratings with their authors attached, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductRating>, RepositoryError> {
        Ok(sqlx::query_as::<_, ProductRating>(
            "SELECT r.id, r.rating, r.review, r.created_at,
                    u.name AS author_name, u.photo AS author_photo
             FROM ratings r
             JOIN users u ON u.id = r.user_id
             WHERE r.product_id = $1
             ORDER BY r.created_at DESC",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?)
    }

    /// Aggregate a product's ratings: count and arithmetic mean.
    ///
    /// Returns [`RatingAggregate::empty`] (count 0, average 4.5) when the
    /// product has no ratings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn aggregate_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<RatingAggregate, RepositoryError> {
        let row: Option<(i64, Option<Decimal>)> = sqlx::query_as(
            "SELECT COUNT(*), AVG(rating)
             FROM ratings
             WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some((count, Some(average))) if count > 0 => Ok(RatingAggregate {
                count: i32::try_from(count).unwrap_or(i32::MAX),
                average: average.round_dp(2),
            }),
            _ => Ok(RatingAggregate::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_aggregate_resets_to_default() {
        let aggregate = RatingAggregate::empty();
        assert_eq!(aggregate.count, 0);
        assert_eq!(aggregate.average, Decimal::new(45, 1));
    }
}
