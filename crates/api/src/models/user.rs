//! User account models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use petal_core::{Email, Role, UserId};

/// Public shape of a user account.
///
/// Credential material (password hash, reset token) is never part of this
/// struct, so it cannot leak through any serialized response.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone_number: String,
    pub role: Role,
    pub photo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user row together with its credential columns.
///
/// Only the auth guard and the auth service see this type; it is not
/// serializable by design of the surrounding code paths.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone_number: String,
    pub role: Role,
    pub photo: String,
    pub active: bool,
    pub password_hash: String,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuthUser {
    /// Strip credential columns, leaving the public shape.
    #[must_use]
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            phone_number: self.phone_number,
            role: self.role,
            photo: self.photo,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Whether a token issued at `issued_at` (seconds since epoch) predates
    /// the user's last password change.
    #[must_use]
    pub fn changed_password_after(&self, issued_at: i64) -> bool {
        self.password_changed_at
            .is_some_and(|changed| issued_at < changed.timestamp())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn auth_user(password_changed_at: Option<DateTime<Utc>>) -> AuthUser {
        let now = Utc::now();
        AuthUser {
            id: UserId::generate(),
            name: "Test User".to_string(),
            email: Email::parse("test@petal.shop").unwrap(),
            phone_number: "01012345678".to_string(),
            role: Role::Customer,
            photo: "default.jpg".to_string(),
            active: true,
            password_hash: "$argon2id$...".to_string(),
            password_changed_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_changed_password_after() {
        let changed = Utc::now();
        let user = auth_user(Some(changed));

        // Token issued before the change is stale, after is fine.
        assert!(user.changed_password_after(changed.timestamp() - 60));
        assert!(!user.changed_password_after(changed.timestamp() + 60));
    }

    #[test]
    fn test_never_changed_password_is_never_stale() {
        let user = auth_user(None);
        assert!(!user.changed_password_after(0));
    }

    #[test]
    fn test_public_user_has_no_credential_fields() {
        let user = auth_user(None).into_user();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("active").is_none());
    }
}
