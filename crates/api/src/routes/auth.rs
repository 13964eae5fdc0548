//! Authentication route handlers: signup, login, password flows, OAuth.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use petal_core::Role;

use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, authorize};
use crate::models::User;
use crate::services::auth::AuthService;
use crate::services::email::send_detached;
use crate::state::AppState;

/// Roles allowed to onboard sellers.
const ALLOWED_SELLER_SIGNUP: &[Role] = &[Role::Admin];

/// Signup form.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub password_confirm: String,
}

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Forgot-password form.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset-password form.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub password_confirm: String,
}

/// Update-password form.
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

/// OAuth callback query.
#[derive(Debug, Deserialize)]
pub struct OauthCallbackQuery {
    pub code: String,
}

/// Standard token envelope: `{status, token, data: {user}}`.
fn token_envelope(user: &User, token: &str) -> serde_json::Value {
    serde_json::json!({
        "status": "success",
        "token": token,
        "data": { "user": user },
    })
}

/// Register a customer account.
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let (user, token) = AuthService::new(state.pool(), &state.config().jwt)
        .register(
            &request.name,
            &request.email,
            &request.phone_number,
            &request.password,
            &request.password_confirm,
            Role::Customer,
        )
        .await?;

    let mailer = state.mailer().clone();
    let to = user.email.to_string();
    let name = user.name.clone();
    send_detached("welcome", async move { mailer.send_welcome(&to, &name).await });

    Ok((StatusCode::CREATED, Json(token_envelope(&user, &token))))
}

/// Register a seller account (admin only).
#[instrument(skip(state, current, request), fields(email = %request.email))]
pub async fn seller_signup(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    authorize(&current.0, ALLOWED_SELLER_SIGNUP)?;

    let (user, token) = AuthService::new(state.pool(), &state.config().jwt)
        .register(
            &request.name,
            &request.email,
            &request.phone_number,
            &request.password,
            &request.password_confirm,
            Role::Seller,
        )
        .await?;

    let mailer = state.mailer().clone();
    let to = user.email.to_string();
    let name = user.name.clone();
    send_detached("welcome", async move { mailer.send_welcome(&to, &name).await });

    Ok((StatusCode::CREATED, Json(token_envelope(&user, &token))))
}

/// Login with email and password.
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>> {
    let (user, token) = AuthService::new(state.pool(), &state.config().jwt)
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(token_envelope(&user, &token)))
}

/// Re-validate a stored token on app reopen.
///
/// The extractor runs the entire guard ladder; reaching the handler means
/// the token is still good.
#[instrument(skip_all)]
pub async fn reopen(CurrentUser(user): CurrentUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "success",
        "data": { "user": user },
    }))
}

/// Start the password-reset flow: email a time-limited reset link.
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    let (user, reset_token) = AuthService::new(state.pool(), &state.config().jwt)
        .forgot_password(&request.email)
        .await?;

    let reset_url = format!(
        "{}/api/v1/users/reset-password/{reset_token}",
        state.config().base_url
    );

    let mailer = state.mailer().clone();
    let to = user.email.to_string();
    let name = user.name.clone();
    send_detached("password-reset", async move {
        mailer.send_password_reset(&to, &name, &reset_url).await
    });

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "token has been sent to your email",
    })))
}

/// Finish the password-reset flow with the emailed token.
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    let (user, token) = AuthService::new(state.pool(), &state.config().jwt)
        .reset_password(&token, &request.password, &request.password_confirm)
        .await?;

    Ok(Json(token_envelope(&user, &token)))
}

/// Rotate the password of the logged-in user.
#[instrument(skip_all)]
pub async fn update_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdatePasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    let token = AuthService::new(state.pool(), &state.config().jwt)
        .update_password(
            user.id,
            &request.password,
            &request.new_password,
            &request.new_password_confirm,
        )
        .await?;

    Ok(Json(token_envelope(&user, &token)))
}

/// Redirect to the identity provider's consent screen.
#[instrument(skip_all)]
pub async fn google_login(State(state): State<AppState>) -> Result<Redirect> {
    let oauth = state
        .oauth()
        .ok_or_else(|| AppError::NotFound("oauth login is not configured".to_string()))?;

    let redirect_uri = callback_uri(&state);
    let nonce = uuid::Uuid::new_v4().to_string();
    let url = oauth.authorize_url(&redirect_uri, &nonce)?;

    Ok(Redirect::to(&url))
}

/// OAuth callback: exchange the code, find-or-create the user, issue a token.
#[instrument(skip_all)]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<OauthCallbackQuery>,
) -> Result<Json<serde_json::Value>> {
    let oauth = state
        .oauth()
        .ok_or_else(|| AppError::NotFound("oauth login is not configured".to_string()))?;

    let profile = oauth
        .fetch_profile(&query.code, &callback_uri(&state))
        .await?;

    let email = profile
        .email
        .ok_or(crate::services::oauth::OauthError::MissingEmail)?;
    let name = profile.name.unwrap_or_else(|| email.clone());

    let (user, token) = AuthService::new(state.pool(), &state.config().jwt)
        .login_with_oauth_profile(&profile.sub, &name, &email)
        .await?;

    Ok(Json(token_envelope(&user, &token)))
}

fn callback_uri(state: &AppState) -> String {
    format!(
        "{}/api/v1/users/auth/google/callback",
        state.config().base_url
    )
}
