//! Unified error handling with Sentry integration.
//!
//! Every route handler returns `Result<T, AppError>`. The taxonomy maps to
//! HTTP statuses in one place here: validation failures are 400, the auth
//! ladder is 401, role mismatches 403, missing-or-not-yours entities 404
//! (never revealing which), uniqueness conflicts 409 and upstream/payment
//! failures 5xx. Server-side errors are captured to Sentry and redacted
//! from the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::services::images::ImageError;
use crate::services::oauth::OauthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication or authorization failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout workflow or order lifecycle failure.
    #[error("checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// Photo upload processing failed.
    #[error("image error: {0}")]
    Image(#[from] ImageError),

    /// OAuth identity provider failure.
    #[error("oauth error: {0}")]
    Oauth(#[from] OauthError),

    /// Malformed or missing input.
    #[error("bad request: {0}")]
    Validation(String),

    /// Role not in the operation's allow-list.
    #[error("you do not have permission to perform this action")]
    Forbidden,

    /// Resource not found (also used for other users' resources).
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness rule rejected the request.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(err) => match err {
                AuthError::MissingToken
                | AuthError::InvalidToken
                | AuthError::UserNotFound
                | AuthError::AccountDisabled
                | AuthError::StaleCredential
                | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::InvalidEmail(_)
                | AuthError::InvalidPhoneNumber
                | AuthError::WeakPassword(_)
                | AuthError::PasswordMismatch
                | AuthError::ResetTokenInvalid => StatusCode::BAD_REQUEST,
                AuthError::PasswordHash | AuthError::TokenCreation | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::Validation(_)
                | CheckoutError::EmptyCart
                | CheckoutError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
                CheckoutError::InsufficientStock => StatusCode::CONFLICT,
                CheckoutError::OrderNotFound | CheckoutError::PaymentNotFound => {
                    StatusCode::NOT_FOUND
                }
                CheckoutError::PaymentSession(_) | CheckoutError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Image(err) => match err {
                ImageError::TooLarge | ImageError::Decode(_) => StatusCode::BAD_REQUEST,
                ImageError::Io(_) | ImageError::TaskFailed => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Oauth(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; server-side detail stays in the logs.
    fn client_message(&self) -> String {
        if self.status_code().is_server_error() {
            return match self {
                Self::Checkout(CheckoutError::PaymentSession(_)) => {
                    "failed to create payment session".to_string()
                }
                _ => "internal server error".to_string(),
            };
        }

        match self {
            Self::Auth(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Database(RepositoryError::NotFound) => "not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Image(err) => err.to_string(),
            Self::Oauth(_) => "identity provider error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // JSend-style envelope: "fail" for client errors, "error" for ours.
        let body = serde_json::json!({
            "status": if status.is_server_error() { "error" } else { "fail" },
            "message": self.client_message(),
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.status_code()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("order".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Validation("bad input".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(AppError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(AppError::Conflict("duplicate".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_ladder_is_401() {
        for err in [
            AuthError::MissingToken,
            AuthError::InvalidToken,
            AuthError::UserNotFound,
            AuthError::AccountDisabled,
            AuthError::StaleCredential,
        ] {
            assert_eq!(get_status(AppError::Auth(err)), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_checkout_statuses() {
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::EmptyCart)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::InsufficientStock)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::OrderNotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::InvalidTransition {
                from: petal_core::OrderStatus::Shipped,
                to: petal_core::OrderStatus::Cancelled,
            })),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_server_errors_are_redacted() {
        let err = AppError::Internal("connection pool exhausted at 10.0.0.3".to_string());
        assert_eq!(err.client_message(), "internal server error");

        let err = AppError::Database(RepositoryError::DataCorruption("bad row".to_string()));
        assert_eq!(err.client_message(), "internal server error");
    }

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = AppError::Validation("please provide a city".to_string());
        assert_eq!(err.client_message(), "bad request: please provide a city");

        let err = AppError::Checkout(CheckoutError::EmptyCart);
        assert_eq!(err.client_message(), "cart is empty");
    }
}
