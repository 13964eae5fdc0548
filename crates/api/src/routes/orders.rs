//! Order route handlers: checkout, history, lifecycle transitions.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use petal_core::{OrderId, OrderStatus, Role};

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, authorize};
use crate::models::Order;
use crate::services::checkout::{CheckoutService, PlaceOrder};
use crate::state::AppState;

/// Roles allowed to move orders along the fulfilment pipeline.
const ALLOWED_SET_STATUS: &[Role] = &[Role::Seller, Role::Admin];

/// Status-transition form.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: OrderStatus,
}

/// Place an order from the caller's cart (the checkout workflow).
///
/// Card orders additionally return the hosted payment page URL.
#[instrument(skip_all)]
pub async fn make_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<PlaceOrder>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let outcome = CheckoutService::new(
        state.pool(),
        state.payments(),
        state.mailer(),
        &state.config().base_url,
    )
    .place_order(&user, request)
    .await?;

    let mut data = serde_json::json!({ "order": outcome.order });
    if let Some(url) = outcome.payment_url
        && let Some(map) = data.as_object_mut()
    {
        map.insert("session_url".to_string(), serde_json::Value::String(url));
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "status": "success", "data": data })),
    ))
}

/// The caller's orders, bucketed by lifecycle status.
#[instrument(skip_all)]
pub async fn my_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>> {
    let orders = OrderRepository::new(state.pool())
        .list_by_user(user.id)
        .await?;

    let results = orders.len();

    let mut buckets: Vec<(OrderStatus, Vec<Order>)> = OrderStatus::ALL
        .into_iter()
        .map(|status| (status, Vec::new()))
        .collect();
    for order in orders {
        if let Some((_, bucket)) = buckets.iter_mut().find(|(status, _)| *status == order.status)
        {
            bucket.push(order);
        }
    }

    let mut data = serde_json::Map::new();
    for (status, bucket) in buckets {
        data.insert(status.to_string(), serde_json::to_value(bucket).unwrap_or_default());
    }

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": results,
        "data": data,
    })))
}

/// One order, scoped to its owner.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<Json<serde_json::Value>> {
    let order = OrderRepository::new(state.pool())
        .find_by_id_for_user(id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "order": order },
    })))
}

/// Cancel a pending order, restoring its line items' stock.
#[instrument(skip(state, user))]
pub async fn cancel(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<Json<serde_json::Value>> {
    let order = CheckoutService::new(
        state.pool(),
        state.payments(),
        state.mailer(),
        &state.config().base_url,
    )
    .cancel_order(user.id, id)
    .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "order": order },
    })))
}

/// Advance an order along the state machine (seller/admin).
#[instrument(skip(state, user, request))]
pub async fn set_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<OrderId>,
    Json(request): Json<SetStatusRequest>,
) -> Result<Json<serde_json::Value>> {
    authorize(&user, ALLOWED_SET_STATUS)?;

    let order = CheckoutService::new(
        state.pool(),
        state.payments(),
        state.mailer(),
        &state.config().base_url,
    )
    .advance_status(id, request.status)
    .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "order": order },
    })))
}
