//! User repository for database operations.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use petal_core::{Email, ProductId, Role, UserId};

use super::RepositoryError;
use crate::models::{AuthUser, Product, User};

/// Columns of the public user shape.
const USER_COLUMNS: &str = "id, name, email, phone_number, role, photo, created_at, updated_at";

/// Columns of the auth shape (public + credential material).
const AUTH_COLUMNS: &str = "id, name, email, phone_number, role, photo, active, \
     password_hash, password_changed_at, created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        phone_number: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO users (name, email, phone_number, password_hash, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(name)
            .bind(email)
            .bind(phone_number)
            .bind(password_hash)
            .bind(role)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_unique_violation(e, "email already registered"))
    }

    /// Get a user (public shape) by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Get a user with credential columns by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_auth_by_id(&self, id: UserId) -> Result<Option<AuthUser>, RepositoryError> {
        let sql = format!("SELECT {AUTH_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, AuthUser>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Get a user with credential columns by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_auth_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AuthUser>, RepositoryError> {
        let sql = format!("SELECT {AUTH_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, AuthUser>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Update name/email/photo on a user's own profile.
    ///
    /// `None` fields keep their current value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new email is taken.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: Option<&str>,
        email: Option<&Email>,
        photo: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE users
             SET name = COALESCE($2, name),
                 email = COALESCE($3, email),
                 photo = COALESCE($4, photo),
                 updated_at = now()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(name)
            .bind(email)
            .bind(photo)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_unique_violation(e, "email already registered"))?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace the password hash, stamping `password_changed_at` and clearing
    /// any outstanding reset token.
    ///
    /// The stamp is backdated by one second so a token issued in the same
    /// instant as the change still reads as fresh.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let changed_at = Utc::now() - Duration::seconds(1);
        let result = sqlx::query(
            "UPDATE users
             SET password_hash = $2,
                 password_changed_at = $3,
                 password_reset_token = NULL,
                 password_reset_expires_at = NULL,
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .bind(changed_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Store a hashed password-reset token with its expiry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_reset_token(
        &self,
        id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users
             SET password_reset_token = $2,
                 password_reset_expires_at = $3,
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Find the user holding an unexpired reset token (by its hash).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<AuthUser>, RepositoryError> {
        let sql = format!(
            "SELECT {AUTH_COLUMNS} FROM users
             WHERE password_reset_token = $1
               AND password_reset_expires_at > now()"
        );
        Ok(sqlx::query_as::<_, AuthUser>(&sql)
            .bind(token_hash)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Soft-delete an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn deactivate(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET active = FALSE, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// List all active accounts (admin view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE active ORDER BY created_at");
        Ok(sqlx::query_as::<_, User>(&sql)
            .fetch_all(self.pool)
            .await?)
    }

    /// Find a user by email, creating one from an OAuth profile when absent.
    ///
    /// First-seen emails get a local account carrying the provider subject id
    /// and an unusable random password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn find_or_create_google(
        &self,
        email: &Email,
        name: &str,
        google_id: &str,
        placeholder_hash: &str,
    ) -> Result<User, RepositoryError> {
        if let Some(existing) = self.find_auth_by_email(email).await? {
            return Ok(existing.into_user());
        }

        let sql = format!(
            "INSERT INTO users (name, email, phone_number, password_hash, google_id)
             VALUES ($1, $2, '', $3, $4)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(name)
            .bind(email)
            .bind(placeholder_hash)
            .bind(google_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_unique_violation(e, "email already registered"))
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Add a product to the user's wishlist (idempotent).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn wishlist_add(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO wishlist_items (user_id, product_id)
             VALUES ($1, $2)
             ON CONFLICT (user_id, product_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Remove a product from the user's wishlist.
    ///
    /// # Returns
    ///
    /// `true` if an entry was removed, `false` if it wasn't listed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn wishlist_remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List the products on the user's wishlist, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn wishlist(&self, user_id: UserId) -> Result<Vec<Product>, RepositoryError> {
        Ok(sqlx::query_as::<_, Product>(
            "SELECT p.*
             FROM wishlist_items w
             JOIN products p ON p.id = w.product_id
             WHERE w.user_id = $1
             ORDER BY w.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?)
    }
}
