//! Admin user management commands.

use secrecy::SecretString;

use petal_api::db::users::UserRepository;
use petal_core::{Email, Role};

/// Errors creating an admin user.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] petal_core::EmailError),

    #[error("auth error: {0}")]
    Auth(#[from] petal_api::services::auth::AuthError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("repository error: {0}")]
    Repository(#[from] petal_api::db::RepositoryError),
}

/// Create an admin user directly in the database.
///
/// # Errors
///
/// Returns `AdminError` on validation failures, a duplicate email, or a
/// database problem.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
    phone: &str,
) -> Result<(), AdminError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("PETAL_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| AdminError::MissingEnvVar("PETAL_DATABASE_URL"))?;

    let email = Email::parse(email)?;
    let password_hash = petal_api::services::auth::hash_password_for_seed(password)?;

    let pool = petal_api::db::create_pool(&SecretString::from(database_url)).await?;

    let user = UserRepository::new(&pool)
        .create(name, &email, phone, &password_hash, Role::Admin)
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "admin user created");
    Ok(())
}
