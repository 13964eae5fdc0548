//! Payment record model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use petal_core::{OrderId, PaymentId, PaymentMethod, PaymentStatus, UserId};

/// A payment record, one-to-one with a card order.
///
/// Created at checkout-session time with status `Pending`; flipped to `Paid`
/// by the gateway's success redirect.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub checkout_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
