//! Payment route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use petal_core::{OrderId, UserId};

use crate::error::Result;
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

/// Query delivered by the gateway's success redirect.
#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub order: OrderId,
    pub user: UserId,
}

/// Confirm a payment after the gateway redirects back.
///
/// Marks the order paid, then the payment record. The two writes share no
/// transaction; the second failing after the first succeeded is the
/// documented reconciliation gap.
#[instrument(skip(state))]
pub async fn success(
    State(state): State<AppState>,
    Query(query): Query<SuccessQuery>,
) -> Result<Json<serde_json::Value>> {
    let payment = CheckoutService::new(
        state.pool(),
        state.payments(),
        state.mailer(),
        &state.config().base_url,
    )
    .confirm_payment(query.user, query.order)
    .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "payment": payment },
    })))
}
