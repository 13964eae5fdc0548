//! Payment gateway client.
//!
//! Talks to the hosted-checkout REST API (Stripe-compatible): an order's
//! line items become a time-boxed checkout session with a hosted payment
//! page. The system only ever sees the session's id and URL; the gateway
//! calls back via the success redirect handled in `routes::payments`.

use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::PaymentGatewayConfig;

/// Errors that can occur when interacting with the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned an error response.
    #[error("gateway error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),

    /// A line item's amount could not be expressed in cents.
    #[error("invalid amount for line item: {0}")]
    InvalidAmount(String),
}

/// One line of a checkout session, in the gateway's unit (cents).
#[derive(Debug, Clone)]
pub struct CheckoutLineItem {
    pub name: String,
    pub unit_amount_cents: i64,
    pub quantity: i64,
}

impl CheckoutLineItem {
    /// Build a line item from a product name, decimal unit price and quantity.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidAmount` if the price doesn't convert to
    /// a whole number of cents.
    pub fn new(name: &str, unit_price: Decimal, quantity: i32) -> Result<Self, PaymentError> {
        let cents = (unit_price * Decimal::from(100))
            .round()
            .to_i64()
            .ok_or_else(|| PaymentError::InvalidAmount(name.to_owned()))?;

        Ok(Self {
            name: name.to_owned(),
            unit_amount_cents: cents,
            quantity: i64::from(quantity),
        })
    }
}

/// A created checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Opaque session id, echoed back on the success redirect.
    pub id: String,
    /// Hosted payment page the client is redirected to.
    pub url: String,
    /// Total the gateway will collect, in cents.
    pub amount_total_cents: i64,
}

#[derive(Debug, Deserialize)]
struct ApiSession {
    id: String,
    url: Option<String>,
    amount_total: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Client for the hosted-checkout payment gateway.
#[derive(Clone)]
pub struct PaymentClient {
    client: reqwest::Client,
    api_base: String,
}

impl PaymentClient {
    /// Create a new payment gateway client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PaymentGatewayConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| PaymentError::Parse(format!("invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
        })
    }

    /// Create a hosted checkout session for an order.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Api` on a non-success status and
    /// `PaymentError::Parse` if the gateway answer is malformed.
    pub async fn create_checkout_session(
        &self,
        line_items: &[CheckoutLineItem],
        customer_email: &str,
        reference_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.api_base);

        let mut params: Vec<(String, String)> = vec![
            ("mode".to_owned(), "payment".to_owned()),
            ("payment_method_types[0]".to_owned(), "card".to_owned()),
            ("success_url".to_owned(), success_url.to_owned()),
            ("cancel_url".to_owned(), cancel_url.to_owned()),
            ("customer_email".to_owned(), customer_email.to_owned()),
            ("client_reference_id".to_owned(), reference_id.to_owned()),
        ];

        for (i, item) in line_items.iter().enumerate() {
            params.push((
                format!("line_items[{i}][price_data][currency]"),
                "usd".to_owned(),
            ));
            params.push((
                format!("line_items[{i}][price_data][unit_amount]"),
                item.unit_amount_cents.to_string(),
            ));
            params.push((
                format!("line_items[{i}][price_data][product_data][name]"),
                item.name.clone(),
            ));
            params.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
        }

        let response = self.client.post(&url).form(&params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| body.chars().take(200).collect());
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: ApiSession = serde_json::from_str(&body)
            .map_err(|e| PaymentError::Parse(format!("bad session payload: {e}")))?;

        let hosted_url = session
            .url
            .ok_or_else(|| PaymentError::Parse("session has no hosted URL".to_owned()))?;

        Ok(CheckoutSession {
            id: session.id,
            url: hosted_url,
            amount_total_cents: session.amount_total.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_converts_to_cents() {
        let item = CheckoutLineItem::new("Rose Lip Tint", Decimal::new(1250, 2), 3).unwrap();
        assert_eq!(item.unit_amount_cents, 1250);
        assert_eq!(item.quantity, 3);
    }

    #[test]
    fn test_line_item_rounds_sub_cent_amounts() {
        // 9.999 -> 999.9 cents -> rounds to 1000
        let item = CheckoutLineItem::new("Sample", Decimal::new(9999, 3), 1).unwrap();
        assert_eq!(item.unit_amount_cents, 1000);
    }

    #[test]
    fn test_session_payload_parses() {
        let body = r#"{"id":"cs_test_123","url":"https://pay.example/cs_test_123","amount_total":5000}"#;
        let session: ApiSession = serde_json::from_str(body).unwrap();
        assert_eq!(session.id, "cs_test_123");
        assert_eq!(session.amount_total, Some(5000));
    }
}
