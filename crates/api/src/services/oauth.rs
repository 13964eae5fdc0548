//! OAuth identity provider (Google) client.
//!
//! Implements the redirect-based handshake: build the authorization URL,
//! exchange the callback code for an access token, then fetch the profile
//! (subject id, display name, email). Account creation from a first-seen
//! email happens in `services::auth`.

use reqwest::header::AUTHORIZATION;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::GoogleOauthConfig;

/// Authorization endpoint the client is redirected to.
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Code-for-token exchange endpoint.
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// OpenID Connect profile endpoint.
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Errors that can occur during the OAuth handshake.
#[derive(Debug, Error)]
pub enum OauthError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error response.
    #[error("provider error: {status} - {message}")]
    Provider { status: u16, message: String },

    /// Response payload was malformed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The profile is missing a usable email.
    #[error("provider profile has no email")]
    MissingEmail,
}

/// The subset of the OpenID profile this system uses.
#[derive(Debug, Clone, Deserialize)]
pub struct OauthProfile {
    /// Provider-stable subject id.
    pub sub: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Verified email address.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for the Google OAuth identity provider.
#[derive(Clone)]
pub struct GoogleOauthClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl GoogleOauthClient {
    /// Create a new OAuth client.
    #[must_use]
    pub fn new(config: &GoogleOauthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.expose_secret().to_owned(),
        }
    }

    /// Build the authorization URL the login endpoint redirects to.
    ///
    /// # Errors
    ///
    /// Returns `OauthError::Parse` if the static endpoint fails to parse
    /// (which would be a programming error in the constant).
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<String, OauthError> {
        let mut url =
            Url::parse(AUTH_URL).map_err(|e| OauthError::Parse(format!("bad auth url: {e}")))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email profile")
            .append_pair("state", state);

        Ok(url.into())
    }

    /// Exchange the callback code for the user's profile.
    ///
    /// # Errors
    ///
    /// Returns `OauthError::Provider` on non-success responses from either
    /// the token or the profile endpoint.
    pub async fn fetch_profile(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<OauthProfile, OauthError> {
        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self.client.post(TOKEN_URL).form(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OauthError::Provider {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OauthError::Parse(format!("bad token payload: {e}")))?;

        let response = self
            .client
            .get(USERINFO_URL)
            .header(AUTHORIZATION, format!("Bearer {}", token.access_token))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OauthError::Provider {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| OauthError::Parse(format!("bad profile payload: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn test_authorize_url_carries_parameters() {
        let client = GoogleOauthClient::new(&GoogleOauthConfig {
            client_id: "client-123".to_string(),
            client_secret: SecretString::from("shhh"),
        });

        let url = client
            .authorize_url("https://petal.shop/api/v1/users/auth/google/callback", "xyz")
            .unwrap();

        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=xyz"));
        // redirect_uri must be percent-encoded
        assert!(url.contains("redirect_uri=https%3A%2F%2Fpetal.shop"));
    }

    #[test]
    fn test_profile_parses_with_missing_fields() {
        let profile: OauthProfile =
            serde_json::from_str(r#"{"sub":"google-1"}"#).unwrap();
        assert_eq!(profile.sub, "google-1");
        assert!(profile.email.is_none());
    }
}
