//! Authentication service.
//!
//! Password registration/login with argon2 hashes, bearer-token issuing and
//! verification, and the password-reset flow. The request-side guard that
//! turns a bearer token back into a user lives in `middleware::auth`; it
//! shares this module's [`AuthError`] ladder.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use std::sync::LazyLock;

use petal_core::{Email, EmailError, Role, UserId};

use crate::config::JwtConfig;
use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length.
const MAX_PASSWORD_LENGTH: usize = 32;
/// How long a password-reset token stays valid.
const RESET_TOKEN_VALIDITY_MINUTES: i64 = 10;

/// Accepted mobile numbers (Egyptian format, the shop's market).
static PHONE_NUMBER: LazyLock<regex::Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // the pattern is a literal, checked by tests
    regex::Regex::new(r"^(\+20|0)?1[0125][0-9]{8}$").unwrap()
});

/// Errors from authentication and the bearer-token guard.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No bearer credential on the request.
    #[error("you are not logged in, please login to get access")]
    MissingToken,

    /// The credential failed signature or expiry checks.
    #[error("invalid or expired token")]
    InvalidToken,

    /// The credential's account no longer exists.
    #[error("the user of this token does not exist anymore")]
    UserNotFound,

    /// The account was soft-deleted.
    #[error("this account is not active, please contact support")]
    AccountDisabled,

    /// The credential predates a password change.
    #[error("password was changed recently, please login again")]
    StaleCredential,

    /// Wrong email/password pair.
    #[error("incorrect email or password")]
    InvalidCredentials,

    /// Registration against an existing email.
    #[error("an account with this email already exists")]
    UserAlreadyExists,

    /// Email failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Phone number failed validation.
    #[error("please provide a valid phone number")]
    InvalidPhoneNumber,

    /// Password failed the strength rules.
    #[error("{0}")]
    WeakPassword(String),

    /// Password and its confirmation differ.
    #[error("password and password confirmation do not match")]
    PasswordMismatch,

    /// Reset token unknown or expired.
    #[error("reset token is invalid or has expired")]
    ResetTokenInvalid,

    /// Hashing failed (never carries the cause to the client).
    #[error("failed to process password")]
    PasswordHash,

    /// Token signing failed.
    #[error("failed to issue token")]
    TokenCreation,

    /// Database failure underneath.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Bearer-token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Issued-at (seconds since epoch); compared against password changes.
    pub iat: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
}

/// Sign a bearer token for a user.
///
/// # Errors
///
/// Returns `AuthError::TokenCreation` if encoding fails.
pub fn sign_token(user_id: UserId, config: &JwtConfig) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.expiry_hours)).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.expose_secret().as_bytes()),
    )
    .map_err(|_| AuthError::TokenCreation)
}

/// Verify a bearer token's signature and expiry, returning its claims.
///
/// # Errors
///
/// Returns `AuthError::InvalidToken` on any verification failure.
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<Claims, AuthError> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.expose_secret().as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    jwt: &'a JwtConfig,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, jwt: &'a JwtConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt,
        }
    }

    /// Register a new account and issue its first token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`/`InvalidPhoneNumber`/`WeakPassword`/
    /// `PasswordMismatch` on validation failures and `UserAlreadyExists` if
    /// the email is taken.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        phone_number: &str,
        password: &str,
        password_confirm: &str,
        role: Role,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;
        validate_phone_number(phone_number)?;
        validate_password(password)?;
        if password != password_confirm {
            return Err(AuthError::PasswordMismatch);
        }

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(name, &email, phone_number, &password_hash, role)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let token = sign_token(user.id, self.jwt)?;
        Ok((user, token))
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a wrong pair and
    /// `AuthError::AccountDisabled` for a soft-deleted account.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        let user = self
            .users
            .find_auth_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.active {
            return Err(AuthError::AccountDisabled);
        }

        verify_password(password, &user.password_hash)?;

        let token = sign_token(user.id, self.jwt)?;
        Ok((user.into_user(), token))
    }

    /// Start the password-reset flow.
    ///
    /// Generates a random token, stores only its SHA-256 digest with a
    /// 10-minute expiry, and returns the plain token for the reset email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the email is unknown.
    pub async fn forgot_password(&self, email: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        let user = self
            .users
            .find_auth_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let token = random_token();
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_VALIDITY_MINUTES);
        self.users
            .set_reset_token(user.id, &hash_reset_token(&token), expires_at)
            .await?;

        Ok((user.into_user(), token))
    }

    /// Complete the password-reset flow with the token from the email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ResetTokenInvalid` for unknown/expired tokens.
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<(User, String), AuthError> {
        validate_password(password)?;
        if password != password_confirm {
            return Err(AuthError::PasswordMismatch);
        }

        let user = self
            .users
            .find_by_reset_token(&hash_reset_token(token))
            .await?
            .ok_or(AuthError::ResetTokenInvalid)?;

        let password_hash = hash_password(password)?;
        self.users.set_password(user.id, &password_hash).await?;

        let token = sign_token(user.id, self.jwt)?;
        Ok((user.into_user(), token))
    }

    /// Rotate the password of a logged-in user.
    ///
    /// Requires the current password; the rotation invalidates every token
    /// issued before it (stale-credential check in the guard).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the current password is
    /// wrong.
    pub async fn update_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
        new_password_confirm: &str,
    ) -> Result<String, AuthError> {
        validate_password(new_password)?;
        if new_password != new_password_confirm {
            return Err(AuthError::PasswordMismatch);
        }

        let user = self
            .users
            .find_auth_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        verify_password(current_password, &user.password_hash)?;

        let password_hash = hash_password(new_password)?;
        self.users.set_password(user.id, &password_hash).await?;

        sign_token(user.id, self.jwt)
    }

    /// Find-or-create a local account from an OAuth profile and issue a token.
    ///
    /// First-seen emails get an account with an unusable random password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the provider sent a bad email.
    pub async fn login_with_oauth_profile(
        &self,
        provider_id: &str,
        name: &str,
        email: &str,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;
        let placeholder_hash = hash_password(&random_token())?;

        let user = self
            .users
            .find_or_create_google(&email, name, provider_id, &placeholder_hash)
            .await?;

        let token = sign_token(user.id, self.jwt)?;
        Ok((user, token))
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Validate a phone number against the accepted mobile format.
fn validate_phone_number(phone_number: &str) -> Result<(), AuthError> {
    if PHONE_NUMBER.is_match(phone_number) {
        Ok(())
    } else {
        Err(AuthError::InvalidPhoneNumber)
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate a random 32-byte token, hex-encoded.
fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest a reset token for at-rest storage.
fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

// Re-exported for the CLI's admin-create command.
#[doc(hidden)]
pub fn hash_password_for_seed(password: &str) -> Result<String, AuthError> {
    hash_password(password)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: SecretString::from("k9#mQ2$vX7!pL4@wR8&nT1*zB5^cF3(j".to_string()),
            expiry_hours: 72,
        }
    }

    #[test]
    fn test_sign_and_verify_round_trip() {
        let config = jwt_config();
        let user_id = UserId::generate();

        let token = sign_token(user_id, &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let config = jwt_config();
        let token = sign_token(UserId::generate(), &config).unwrap();

        let other = JwtConfig {
            secret: SecretString::from("a7!xP3$qW9@mZ5#nV1&kJ8*rD4^gH6(t".to_string()),
            expiry_hours: 72,
        };
        assert!(matches!(
            verify_token(&token, &other),
            Err(AuthError::InvalidToken)
        ));

        assert!(matches!(
            verify_token("not.a.token", &config),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_password_validation() {
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(33)).is_err());
        assert!(validate_password("long-enough-password").is_ok());
    }

    #[test]
    fn test_phone_number_validation() {
        assert!(validate_phone_number("01012345678").is_ok());
        assert!(validate_phone_number("+201012345678").is_ok());
        assert!(validate_phone_number("1112345678").is_ok());
        assert!(validate_phone_number("12345").is_err());
        assert!(validate_phone_number("0x012345678").is_err());
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_reset_token_digest_is_stable() {
        let token = "abcdef";
        assert_eq!(hash_reset_token(token), hash_reset_token(token));
        assert_ne!(hash_reset_token(token), hash_reset_token("abcdeg"));
        // hex sha256 is 64 chars
        assert_eq!(hash_reset_token(token).len(), 64);
    }

    #[test]
    fn test_random_tokens_are_unique() {
        assert_ne!(random_token(), random_token());
        assert_eq!(random_token().len(), 64);
    }
}
