//! Catalog route handlers.
//!
//! The read endpoints opt into the cache interceptor: each builds a
//! [`CacheKey`] from its filter and wraps the repository call in
//! `read_through`. Writes do not invalidate, so a listing can be up to one
//! TTL stale after a product changes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use petal_core::{Category, ProductId, Role};

use crate::cache::{CacheKey, DEFAULT_TTL};
use crate::db::products::{ListOptions, ProductOrder, ProductRepository};
use crate::db::ratings::RatingRepository;
use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, authorize};
use crate::models::Product;
use crate::state::AppState;

/// Roles allowed to create catalog entries.
const ALLOWED_CREATE_PRODUCT: &[Role] = &[Role::Seller, Role::Admin];

/// Hard ceiling on page size.
const MAX_PAGE_SIZE: u32 = 100;

/// Create-product form.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: String,
    pub category: Category,
    pub in_stock: Option<i32>,
}

/// Listing query parameters: `?sort=price&page=2&limit=20`.
#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListQuery {
    /// Parse into repository options, rejecting unknown sort orders.
    fn into_options(self) -> Result<ListOptions> {
        let order = match self.sort.as_deref() {
            Some(sort) => sort
                .parse::<ProductOrder>()
                .map_err(AppError::Validation)?,
            None => ProductOrder::default(),
        };

        let limit = self.limit.unwrap_or(50).clamp(1, MAX_PAGE_SIZE);
        let page = self.page.unwrap_or(1).max(1);

        Ok(ListOptions {
            order,
            limit: i64::from(limit),
            offset: i64::from((page - 1) * limit),
        })
    }

    /// The filter fragment this query contributes to a cache key.
    fn filter_fragment(&self) -> serde_json::Value {
        serde_json::json!({
            "sort": self.sort,
            "page": self.page.unwrap_or(1),
            "limit": self.limit.unwrap_or(50),
        })
    }
}

fn products_envelope(products: &[Product]) -> serde_json::Value {
    serde_json::json!({
        "status": "success",
        "results": products.len(),
        "data": { "products": products },
    })
}

/// Create a catalog entry (seller/admin).
#[instrument(skip(state, user, request), fields(seller_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    authorize(&user, ALLOWED_CREATE_PRODUCT)?;

    if request.price < Decimal::ZERO {
        return Err(AppError::Validation(
            "a product price must not be negative".to_string(),
        ));
    }

    let product = ProductRepository::new(state.pool())
        .create(
            &request.name,
            &request.description,
            request.price,
            &request.image,
            request.category,
            request.in_stock.unwrap_or(0).max(0),
            user.id,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": { "product": product },
        })),
    ))
}

/// The full catalog (cached).
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let key = CacheKey::new("products", &serde_json::json!({ "all": true }));
    let products: Vec<Product> = state
        .cache()
        .read_through(&key, DEFAULT_TTL, || async {
            ProductRepository::new(state.pool()).list_all().await
        })
        .await?;

    Ok(Json(products_envelope(&products)))
}

/// One product with its ratings attached (product read is cached).
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<serde_json::Value>> {
    let key = CacheKey::new("products", &serde_json::json!({ "id": id.to_string() }));
    let product: Option<Product> = state
        .cache()
        .read_through(&key, DEFAULT_TTL, || async {
            ProductRepository::new(state.pool()).find_by_id(id).await
        })
        .await?;

    let product =
        product.ok_or_else(|| AppError::NotFound("no product found with that id".to_string()))?;

    let ratings = RatingRepository::new(state.pool())
        .list_for_product(id)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "product": product, "ratings": ratings },
    })))
}

/// One category page (cached).
#[instrument(skip(state, query))]
pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>> {
    let category: Category = category
        .parse()
        .map_err(|e: String| AppError::Validation(e))?;

    let key = CacheKey::new(
        "products",
        &serde_json::json!({
            "category": category.to_string(),
            "query": query.filter_fragment(),
        }),
    );
    let options = query.into_options()?;

    let products: Vec<Product> = state
        .cache()
        .read_through(&key, DEFAULT_TTL, || async {
            ProductRepository::new(state.pool())
                .list_by_category(category, options)
                .await
        })
        .await?;

    Ok(Json(products_envelope(&products)))
}

/// Name search (cached).
#[instrument(skip(state, query))]
pub async fn by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("please provide a name".to_string()));
    }

    let key = CacheKey::new(
        "products",
        &serde_json::json!({
            "name": name,
            "query": query.filter_fragment(),
        }),
    );
    let options = query.into_options()?;

    let products: Vec<Product> = state
        .cache()
        .read_through(&key, DEFAULT_TTL, || async {
            ProductRepository::new(state.pool())
                .search_by_name(&name, options)
                .await
        })
        .await?;

    Ok(Json(products_envelope(&products)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let options = ListQuery::default().into_options().unwrap();
        assert_eq!(options.order, ProductOrder::Newest);
        assert_eq!(options.limit, 50);
        assert_eq!(options.offset, 0);
    }

    #[test]
    fn test_list_query_pagination() {
        let query = ListQuery {
            sort: Some("-price".to_string()),
            page: Some(3),
            limit: Some(20),
        };
        let options = query.into_options().unwrap();
        assert_eq!(options.order, ProductOrder::PriceDesc);
        assert_eq!(options.limit, 20);
        assert_eq!(options.offset, 40);
    }

    #[test]
    fn test_list_query_clamps_page_size() {
        let query = ListQuery {
            sort: None,
            page: Some(1),
            limit: Some(10_000),
        };
        let options = query.into_options().unwrap();
        assert_eq!(options.limit, i64::from(MAX_PAGE_SIZE));
    }

    #[test]
    fn test_list_query_rejects_unknown_sort() {
        let query = ListQuery {
            sort: Some("cheapest".to_string()),
            page: None,
            limit: None,
        };
        assert!(query.into_options().is_err());
    }
}
