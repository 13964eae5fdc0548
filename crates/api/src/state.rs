//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::QueryCache;
use crate::config::ApiConfig;
use crate::services::email::EmailService;
use crate::services::oauth::GoogleOauthClient;
use crate::services::payments::{PaymentClient, PaymentError};

/// Error constructing the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("payment client error: {0}")]
    Payment(#[from] PaymentError),
    #[error("email transport error: {0}")]
    Email(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// shared resources every request needs: configuration, the database pool,
/// the cache store and the outbound-service clients. Everything here is
/// constructed once at startup and injected; nothing is a process-wide
/// singleton.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    cache: QueryCache,
    payments: PaymentClient,
    mailer: EmailService,
    oauth: Option<GoogleOauthClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment client or SMTP transport cannot be
    /// configured.
    pub fn new(config: ApiConfig, pool: PgPool, cache: QueryCache) -> Result<Self, StateError> {
        let payments = PaymentClient::new(&config.payments)?;
        let mailer = EmailService::new(&config.email)?;
        let oauth = config.google.as_ref().map(GoogleOauthClient::new);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                cache,
                payments,
                mailer,
                oauth,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the query cache.
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    /// Get a reference to the payment gateway client.
    #[must_use]
    pub fn payments(&self) -> &PaymentClient {
        &self.inner.payments
    }

    /// Get a reference to the email service.
    #[must_use]
    pub fn mailer(&self) -> &EmailService {
        &self.inner.mailer
    }

    /// Get the OAuth client, if the provider is configured.
    #[must_use]
    pub fn oauth(&self) -> Option<&GoogleOauthClient> {
        self.inner.oauth.as_ref()
    }
}
