//! Rating route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use petal_core::ProductId;

use crate::db::RepositoryError;
use crate::db::orders::OrderRepository;
use crate::db::products::ProductRepository;
use crate::db::ratings::RatingRepository;
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Rate-product form.
#[derive(Debug, Deserialize)]
pub struct RateProductRequest {
    pub product_id: ProductId,
    pub rating: i16,
    pub review: Option<String>,
}

/// Rate a product the caller has ordered and received.
///
/// Gated on a `Delivered` order containing the product; one rating per
/// (product, user). Every insert recomputes the product's aggregate count
/// and mean (an empty aggregate resets to 0 / 4.5).
#[instrument(skip(state, user, request), fields(user_id = %user.id, product_id = %request.product_id))]
pub async fn rate_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<RateProductRequest>,
) -> Result<Json<serde_json::Value>> {
    if !(1..=5).contains(&request.rating) {
        return Err(AppError::Validation(
            "please provide a rating between 1 and 5".to_string(),
        ));
    }

    let delivered = OrderRepository::new(state.pool())
        .has_delivered_order_with_product(user.id, request.product_id)
        .await?;
    if !delivered {
        return Err(AppError::Validation(
            "you can only rate products you have ordered and received".to_string(),
        ));
    }

    let ratings = RatingRepository::new(state.pool());

    let rating = ratings
        .create(
            request.product_id,
            user.id,
            request.rating,
            request.review.as_deref(),
        )
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                AppError::Conflict("you have already rated this product".to_string())
            }
            other => AppError::Database(other),
        })?;

    // Recompute the product's aggregate from all of its ratings.
    let aggregate = ratings.aggregate_for_product(request.product_id).await?;
    ProductRepository::new(state.pool())
        .update_rating_aggregate(request.product_id, aggregate.count, aggregate.average)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "rating": rating },
    })))
}
