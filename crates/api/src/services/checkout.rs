//! Order checkout workflow and lifecycle transitions.
//!
//! The place-order sequence is fixed: validate, snapshot the cart into a
//! `Pending` order together with the batch stock decrement, resolve the
//! payment branch, then notify and clear the cart. The payment session is
//! requested *before* the confirmation email goes out and before the cart is
//! cleared; reorderings of those steps (emailing before the session
//! resolves, clearing the cart before payment success is known) are a latent
//! bug class, not supported behavior.
//!
//! Known, deliberate gaps (documented rather than masked):
//! - A payment-session failure after the stock decrement committed does NOT
//!   restock; the decrement stands until the order is cancelled.
//! - Payment confirmation is two independent writes (order paid flag, then
//!   payment status); a crash between them leaves state for manual
//!   reconciliation.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use petal_core::{OrderId, OrderStatus, PaymentMethod, UserId};

use crate::db::RepositoryError;
use crate::db::carts::CartRepository;
use crate::db::orders::{NewOrder, OrderRepository};
use crate::db::payments::PaymentRepository;
use crate::db::products::ProductRepository;
use crate::models::{Order, Payment, User};
use crate::services::email::{EmailService, send_detached};
use crate::services::payments::{CheckoutLineItem, PaymentClient, PaymentError};

/// Errors from the checkout workflow and order lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// Missing or malformed checkout input.
    #[error("{0}")]
    Validation(String),

    /// The caller has no cart (or an already-emptied one).
    #[error("cart is empty")]
    EmptyCart,

    /// A line item could not be covered by the available stock.
    #[error("insufficient stock for one or more items")]
    InsufficientStock,

    /// The payment gateway refused or failed to create a session.
    #[error("failed to create payment session")]
    PaymentSession(#[source] PaymentError),

    /// The order does not exist (or belongs to someone else).
    #[error("order not found")]
    OrderNotFound,

    /// No payment is recorded for this (user, order) pair.
    #[error("payment not found")]
    PaymentNotFound,

    /// The requested status change is not allowed from the current state.
    #[error("order cannot move from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Database failure underneath.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// What the caller asked for at checkout, already shape-checked by serde.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PlaceOrder {
    pub shipping_address: Option<String>,
    pub city: Option<String>,
    pub phone_number: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

/// Result of a successful checkout.
#[derive(Debug)]
pub struct CheckoutOutcome {
    pub order: Order,
    /// Hosted payment page, present for card orders only.
    pub payment_url: Option<String>,
}

/// The checkout workflow service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    payments: &'a PaymentClient,
    mailer: &'a EmailService,
    base_url: &'a str,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        payments: &'a PaymentClient,
        mailer: &'a EmailService,
        base_url: &'a str,
    ) -> Self {
        Self {
            pool,
            payments,
            mailer,
            base_url,
        }
    }

    /// Place an order from the caller's cart.
    ///
    /// # Errors
    ///
    /// - `Validation` for missing address/city/phone/payment method
    /// - `EmptyCart` if the caller has no cart or it holds no items
    /// - `InsufficientStock` if the batch decrement could not cover a line
    /// - `PaymentSession` if the gateway call fails (card orders)
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn place_order(
        &self,
        user: &User,
        request: PlaceOrder,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        // 1. Validate the checkout details.
        let shipping_address = require_field(request.shipping_address, "shipping address")?;
        let city = require_field(request.city, "city")?;
        let phone_number = require_field(request.phone_number, "phone number")?;
        let payment_method = request
            .payment_method
            .ok_or_else(|| CheckoutError::Validation("please provide a payment method".into()))?;

        // 2. Load the caller's cart.
        let cart = CartRepository::new(self.pool)
            .find_by_user(user.id)
            .await?
            .ok_or(CheckoutError::EmptyCart)?;
        if cart.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // 3+4. Snapshot the cart into a Pending order and apply the batch
        // stock decrement, atomically.
        let order = OrderRepository::new(self.pool)
            .create_from_cart(
                user.id,
                &cart,
                NewOrder {
                    shipping_address: &shipping_address,
                    shipping_city: &city,
                    phone_number: &phone_number,
                    payment_method,
                },
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => CheckoutError::InsufficientStock,
                other => CheckoutError::Repository(other),
            })?;

        // 5. Payment branch. A gateway failure here leaves the stock
        // decrement in place (see module docs).
        let payment_url = match payment_method {
            PaymentMethod::CashOnDelivery => None,
            PaymentMethod::Card => Some(self.open_payment_session(user, &order).await?),
        };

        // 6. Best-effort confirmation email; never blocks the response.
        let mailer = self.mailer.clone();
        let to = user.email.to_string();
        let name = user.name.clone();
        let order_id = order.id.to_string();
        let total = order.total_price.round_dp(2).to_string();
        send_detached("order-confirmation", async move {
            mailer
                .send_order_confirmation(&to, &name, &order_id, &total)
                .await
        });

        // 7. Clear the cart.
        CartRepository::new(self.pool).clear(cart.id).await?;

        info!(order_id = %order.id, method = ?payment_method, "order placed");
        Ok(CheckoutOutcome { order, payment_url })
    }

    /// Create the hosted checkout session and record the pending payment.
    async fn open_payment_session(
        &self,
        user: &User,
        order: &Order,
    ) -> Result<String, CheckoutError> {
        let line_items: Vec<CheckoutLineItem> = order
            .items
            .iter()
            .map(|item| CheckoutLineItem::new(&item.name, item.price, item.quantity))
            .collect::<Result<_, _>>()
            .map_err(CheckoutError::PaymentSession)?;

        let success_url = format!(
            "{}/api/v1/payments/success?order={}&user={}",
            self.base_url, order.id, user.id
        );
        let cancel_url = format!("{}/api/v1/orders/my-orders", self.base_url);

        let session = self
            .payments
            .create_checkout_session(
                &line_items,
                user.email.as_str(),
                &order.id.to_string(),
                &success_url,
                &cancel_url,
            )
            .await
            .map_err(CheckoutError::PaymentSession)?;

        PaymentRepository::new(self.pool)
            .create(
                user.id,
                order.id,
                PaymentMethod::Card,
                Decimal::new(session.amount_total_cents, 2),
                Some(&session.id),
            )
            .await?;

        Ok(session.url)
    }

    /// Cancel a `Pending` order, restocking every line item.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if the order doesn't exist or isn't the caller's
    ///   (deliberately indistinguishable)
    /// - `InvalidTransition` from any state but `Pending`
    #[instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Order, CheckoutError> {
        let orders = OrderRepository::new(self.pool);

        let order = orders
            .find_by_id_for_user(order_id, user_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        if !order.status.is_cancellable() {
            return Err(CheckoutError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        // Compensate the checkout decrement, then flip the status.
        let line_items: Vec<_> = order
            .items
            .iter()
            .map(|item| (item.product_id, item.quantity))
            .collect();
        ProductRepository::new(self.pool)
            .restock_batch(&line_items)
            .await?;

        orders.set_status(order.id, OrderStatus::Cancelled).await?;

        info!(order_id = %order.id, "order cancelled, stock restored");
        orders
            .find_by_id(order.id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)
    }

    /// Move an order along the fulfilment state machine (seller/admin).
    ///
    /// Cancellation through this path restocks exactly like owner
    /// cancellation does.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if the order doesn't exist
    /// - `InvalidTransition` if the state machine forbids the move
    #[instrument(skip(self))]
    pub async fn advance_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, CheckoutError> {
        let orders = OrderRepository::new(self.pool);

        let order = orders
            .find_by_id(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        if !order.status.can_transition_to(next) {
            return Err(CheckoutError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }

        if next == OrderStatus::Cancelled {
            let line_items: Vec<_> = order
                .items
                .iter()
                .map(|item| (item.product_id, item.quantity))
                .collect();
            ProductRepository::new(self.pool)
                .restock_batch(&line_items)
                .await?;
        }

        orders.set_status(order.id, next).await?;

        orders
            .find_by_id(order.id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)
    }

    /// Handle the gateway's success redirect: mark the order paid, then the
    /// payment record.
    ///
    /// Two independent writes with no shared transaction; a failure after
    /// the first write leaves the order paid with a pending payment record
    /// (the documented reconciliation gap).
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if the order lookup fails
    /// - `PaymentNotFound` if the payment lookup fails
    #[instrument(skip(self))]
    pub async fn confirm_payment(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Payment, CheckoutError> {
        let marked = OrderRepository::new(self.pool).mark_paid(order_id).await?;
        if !marked {
            return Err(CheckoutError::OrderNotFound);
        }

        let payment = PaymentRepository::new(self.pool)
            .mark_paid(user_id, order_id)
            .await?
            .ok_or_else(|| {
                warn!(%order_id, "order marked paid but no payment record matched");
                CheckoutError::PaymentNotFound
            })?;

        info!(%order_id, "payment confirmed");
        Ok(payment)
    }
}

/// Require a non-empty checkout field.
fn require_field(value: Option<String>, label: &str) -> Result<String, CheckoutError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CheckoutError::Validation(format!("please provide a {label}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_field() {
        assert!(require_field(Some("10 Rose St".into()), "shipping address").is_ok());
        assert!(matches!(
            require_field(Some("   ".into()), "city"),
            Err(CheckoutError::Validation(_))
        ));
        assert!(matches!(
            require_field(None, "phone number"),
            Err(CheckoutError::Validation(_))
        ));
    }

    #[test]
    fn test_place_order_rejects_missing_method() {
        let request: PlaceOrder = serde_json::from_str(
            r#"{"shipping_address":"10 Rose St","city":"Cairo","phone_number":"01012345678"}"#,
        )
        .expect("valid json");
        assert!(request.payment_method.is_none());
    }

    #[test]
    fn test_payment_method_parses_closed_set() {
        let request: PlaceOrder = serde_json::from_str(
            r#"{"shipping_address":"a","city":"b","phone_number":"c","payment_method":"cash_on_delivery"}"#,
        )
        .expect("valid json");
        assert_eq!(request.payment_method, Some(PaymentMethod::CashOnDelivery));

        let bad = serde_json::from_str::<PlaceOrder>(
            r#"{"shipping_address":"a","city":"b","phone_number":"c","payment_method":"bitcoin"}"#,
        );
        assert!(bad.is_err());
    }
}
