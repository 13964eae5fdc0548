//! Authentication guard and role authorization.
//!
//! [`CurrentUser`] is an extractor: declaring it on a handler makes the
//! route require a valid bearer token. The failure ladder is fixed:
//! missing credential, bad signature/expiry, vanished account, soft-deleted
//! account, then credential-older-than-last-password-change. All five are
//! 401s with distinct messages.
//!
//! Role checks are separate and declarative: each protected operation
//! declares a `const` allow-list of [`Role`]s and calls [`authorize`] -
//! a plain enum comparison, not dynamic dispatch.
//!
//! # Example
//!
//! ```rust,ignore
//! const ALLOWED: &[Role] = &[Role::Admin];
//!
//! async fn list_users(
//!     State(state): State<AppState>,
//!     CurrentUser(user): CurrentUser,
//! ) -> Result<Json<Vec<User>>> {
//!     authorize(&user, ALLOWED)?;
//!     // ...
//! }
//! ```

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use petal_core::{Role, UserId};

use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::models::User;
use crate::services::auth::{AuthError, verify_token};
use crate::state::AppState;

/// Extractor that requires a valid bearer token and resolves it to a user.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = bearer_token(&parts.headers).ok_or(AuthError::MissingToken)?;

        let claims = verify_token(token, &state.config().jwt)?;
        let user_id: UserId = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

        let user = UserRepository::new(state.pool())
            .find_auth_by_id(user_id)
            .await
            .map_err(AppError::Database)?
            .ok_or(AuthError::UserNotFound)?;

        if !user.active {
            return Err(AuthError::AccountDisabled.into());
        }

        // A token issued before the last password change forces re-login.
        if user.changed_password_after(claims.iat) {
            return Err(AuthError::StaleCredential.into());
        }

        Ok(Self(user.into_user()))
    }
}

/// Check the resolved identity's role against an operation's allow-list.
///
/// # Errors
///
/// Returns `AppError::Forbidden` if the role is not in the list.
pub fn authorize(user: &User, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Pull the bearer credential off the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use petal_core::Email;

    fn user_with_role(role: Role) -> User {
        let now = Utc::now();
        User {
            id: UserId::generate(),
            name: "Tester".to_string(),
            email: Email::parse("tester@petal.shop").unwrap(),
            phone_number: "01012345678".to_string(),
            role,
            photo: "default.jpg".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_authorize_allows_listed_roles() {
        let seller = user_with_role(Role::Seller);
        assert!(authorize(&seller, &[Role::Seller, Role::Admin]).is_ok());
    }

    #[test]
    fn test_authorize_rejects_unlisted_roles() {
        let customer = user_with_role(Role::Customer);
        let result = authorize(&customer, &[Role::Admin]);
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer abc.def.ghi".parse().unwrap(),
        );
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_missing_or_malformed() {
        let headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Basic dXNlcjpwYXNz".parse().unwrap(),
        );
        assert_eq!(bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
