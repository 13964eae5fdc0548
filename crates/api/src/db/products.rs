//! Product repository for database operations.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use petal_core::{Category, ProductId, UserId};

use super::RepositoryError;
use crate::models::Product;

/// Sort orders the catalog listing endpoints accept.
///
/// A closed set mapped to fixed SQL so client input never reaches the query
/// text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductOrder {
    /// Newest arrivals first.
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    RatingDesc,
    BestSelling,
}

impl ProductOrder {
    const fn to_sql(self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC",
            Self::PriceAsc => "price ASC",
            Self::PriceDesc => "price DESC",
            Self::RatingDesc => "rating_avg DESC",
            Self::BestSelling => "sold_count DESC",
        }
    }
}

impl std::str::FromStr for ProductOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "price" => Ok(Self::PriceAsc),
            "-price" => Ok(Self::PriceDesc),
            "rating" => Ok(Self::RatingDesc),
            "best-selling" => Ok(Self::BestSelling),
            _ => Err(format!("invalid sort order: {s}")),
        }
    }
}

/// Pagination and ordering for catalog listings.
#[derive(Debug, Clone, Copy)]
pub struct ListOptions {
    pub order: ProductOrder,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            order: ProductOrder::Newest,
            limit: 50,
            offset: 0,
        }
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a catalog entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if (name, category) already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        price: Decimal,
        image: &str,
        category: Category,
        in_stock: i32,
        seller_id: UserId,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(
            "INSERT INTO products (name, description, price, image, category, in_stock, seller_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(image)
        .bind(category)
        .bind(in_stock)
        .bind(seller_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::from_unique_violation(e, "product already exists in this category")
        })
    }

    /// List the whole catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(
            sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC")
                .fetch_all(self.pool)
                .await?,
        )
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// List one category page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_category(
        &self,
        category: Category,
        options: ListOptions,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT * FROM products WHERE category = $1 ORDER BY {} LIMIT $2 OFFSET $3",
            options.order.to_sql()
        );
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(category)
            .bind(options.limit)
            .bind(options.offset)
            .fetch_all(self.pool)
            .await?)
    }

    /// Case-insensitive contains search on the product name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search_by_name(
        &self,
        name: &str,
        options: ListOptions,
    ) -> Result<Vec<Product>, RepositoryError> {
        let pattern = format!("%{}%", name.replace('%', "\\%").replace('_', "\\_"));
        let sql = format!(
            "SELECT * FROM products WHERE name ILIKE $1 ORDER BY {} LIMIT $2 OFFSET $3",
            options.order.to_sql()
        );
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(pattern)
            .bind(options.limit)
            .bind(options.offset)
            .fetch_all(self.pool)
            .await?)
    }

    /// Decrement stock and bump sold counts for every line item of an order,
    /// as one conditional batch statement.
    ///
    /// Rows with insufficient stock are skipped by the `in_stock >=` guard,
    /// so the returned count can be less than `items.len()`; the caller
    /// decides whether that aborts its transaction. Stock can never go
    /// negative.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn decrement_stock_batch(
        conn: &mut PgConnection,
        items: &[(ProductId, i32)],
    ) -> Result<u64, RepositoryError> {
        let (ids, quantities): (Vec<uuid::Uuid>, Vec<i32>) = items
            .iter()
            .map(|(id, quantity)| (id.as_uuid(), *quantity))
            .unzip();

        let result = sqlx::query(
            "UPDATE products AS p
             SET in_stock = p.in_stock - v.quantity,
                 sold_count = p.sold_count + v.quantity,
                 updated_at = now()
             FROM (SELECT UNNEST($1::uuid[]) AS product_id, UNNEST($2::int4[]) AS quantity) AS v
             WHERE p.id = v.product_id
               AND p.in_stock >= v.quantity",
        )
        .bind(ids)
        .bind(quantities)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Put an order's units back on the shelf (cancellation compensation).
    ///
    /// Unconditional reverse of [`Self::decrement_stock_batch`], again as a
    /// single batch statement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn restock_batch(
        &self,
        items: &[(ProductId, i32)],
    ) -> Result<(), RepositoryError> {
        let (ids, quantities): (Vec<uuid::Uuid>, Vec<i32>) = items
            .iter()
            .map(|(id, quantity)| (id.as_uuid(), *quantity))
            .unzip();

        sqlx::query(
            "UPDATE products AS p
             SET in_stock = p.in_stock + v.quantity,
                 sold_count = p.sold_count - v.quantity,
                 updated_at = now()
             FROM (SELECT UNNEST($1::uuid[]) AS product_id, UNNEST($2::int4[]) AS quantity) AS v
             WHERE p.id = v.product_id",
        )
        .bind(ids)
        .bind(quantities)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Overwrite a product's rating aggregate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update_rating_aggregate(
        &self,
        id: ProductId,
        rating_count: i32,
        rating_avg: Decimal,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products
             SET rating_count = $2, rating_avg = $3, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(rating_count)
        .bind(rating_avg)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_order_parse() {
        assert_eq!("price".parse::<ProductOrder>().unwrap(), ProductOrder::PriceAsc);
        assert_eq!("-price".parse::<ProductOrder>().unwrap(), ProductOrder::PriceDesc);
        assert_eq!("rating".parse::<ProductOrder>().unwrap(), ProductOrder::RatingDesc);
        assert!("; DROP TABLE products".parse::<ProductOrder>().is_err());
    }

    #[test]
    fn test_product_order_sql_is_fixed() {
        // Order clauses come from a closed set, never from client input.
        assert_eq!(ProductOrder::Newest.to_sql(), "created_at DESC");
        assert_eq!(ProductOrder::BestSelling.to_sql(), "sold_count DESC");
    }
}
