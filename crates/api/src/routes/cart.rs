//! Cart route handlers.
//!
//! Every handler operates on the single cart owned by the authenticated
//! caller. Requests naming another user's cart cannot be expressed; requests
//! for a cart that doesn't exist get a 404 that never reveals whether some
//! other user has one.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use petal_core::ProductId;

use crate::db::carts::CartRepository;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::Cart;
use crate::state::AppState;

/// Update-quantity form.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

fn cart_envelope(cart: &Cart) -> serde_json::Value {
    serde_json::json!({
        "status": "success",
        "data": { "cart": cart },
    })
}

fn no_cart() -> AppError {
    AppError::NotFound("no cart found".to_string())
}

/// The caller's cart.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>> {
    let cart = CartRepository::new(state.pool())
        .find_by_user(user.id)
        .await?
        .ok_or_else(no_cart)?;

    Ok(Json(cart_envelope(&cart)))
}

/// Merge one unit of a product into the cart.
///
/// Creates the cart lazily on first add. Two concurrent first-adds race to
/// the unique constraint on the owner; the loser gets a conflict rather
/// than a second cart.
#[instrument(skip(state, user))]
pub async fn add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<ProductId>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let product = ProductRepository::new(state.pool())
        .find_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("no product found with that id".to_string()))?;

    if !product.is_in_stock() {
        return Err(AppError::Validation(
            "the product is currently out of stock".to_string(),
        ));
    }

    let carts = CartRepository::new(state.pool());

    let cart = match carts.find_by_user(user.id).await? {
        None => carts
            .create_with_item(user.id, product.id, product.price)
            .await?,
        Some(cart) => {
            carts.add_item(cart.id, product.id, product.price).await?;
            carts
                .find_by_user(user.id)
                .await?
                .ok_or_else(no_cart)?
        }
    };

    Ok((StatusCode::CREATED, Json(cart_envelope(&cart))))
}

/// Set a line item's quantity (bounded by the product's stock).
#[instrument(skip(state, user, request))]
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<ProductId>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<serde_json::Value>> {
    if request.quantity < 1 {
        return Err(AppError::Validation(
            "please provide a valid quantity".to_string(),
        ));
    }

    let carts = CartRepository::new(state.pool());
    let cart = carts.find_by_user(user.id).await?.ok_or_else(no_cart)?;

    let product = ProductRepository::new(state.pool())
        .find_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("no product found with that id".to_string()))?;

    if request.quantity > product.in_stock {
        return Err(AppError::Validation(
            "the quantity you provided is not available".to_string(),
        ));
    }

    let updated = carts
        .set_item_quantity(cart.id, product_id, request.quantity)
        .await?;
    if !updated {
        return Err(AppError::NotFound(
            "no product found in the cart with that id".to_string(),
        ));
    }

    let cart = carts.find_by_user(user.id).await?.ok_or_else(no_cart)?;
    Ok(Json(cart_envelope(&cart)))
}

/// Remove a line item.
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<serde_json::Value>> {
    let carts = CartRepository::new(state.pool());
    let cart = carts.find_by_user(user.id).await?.ok_or_else(no_cart)?;

    let removed = carts.remove_item(cart.id, product_id).await?;
    if !removed {
        return Err(AppError::NotFound(
            "no product found in the cart with that id".to_string(),
        ));
    }

    let cart = carts.find_by_user(user.id).await?.ok_or_else(no_cart)?;
    Ok(Json(cart_envelope(&cart)))
}

/// Empty the cart (items removed, total reset to zero).
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>> {
    let carts = CartRepository::new(state.pool());
    let cart = carts.find_by_user(user.id).await?.ok_or_else(no_cart)?;

    carts.clear(cart.id).await?;

    let cart = carts.find_by_user(user.id).await?.ok_or_else(no_cart)?;
    Ok(Json(cart_envelope(&cart)))
}

/// Delete the cart document entirely.
#[instrument(skip_all)]
pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode> {
    let deleted = CartRepository::new(state.pool())
        .delete_by_user(user.id)
        .await?;

    if !deleted {
        return Err(no_cart());
    }

    Ok(StatusCode::NO_CONTENT)
}
