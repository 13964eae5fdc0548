//! User profile, admin listing and wishlist route handlers.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use tracing::instrument;

use petal_core::{Email, ProductId, Role};

use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, authorize};
use crate::services::images::process_user_photo;
use crate::state::AppState;

/// Roles allowed to list all users.
const ALLOWED_LIST_USERS: &[Role] = &[Role::Admin];

/// List all active users (admin only).
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>> {
    authorize(&user, ALLOWED_LIST_USERS)?;

    let users = UserRepository::new(state.pool()).list_active().await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": users.len(),
        "data": { "users": users },
    })))
}

/// The caller's own profile.
#[instrument(skip_all)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "success",
        "data": { "user": user },
    }))
}

/// Update the caller's profile: name, email and an optional photo upload.
///
/// Multipart form with text fields `name` / `email` and an image field
/// `photo`. Password fields are rejected here; rotation has its own route.
#[instrument(skip_all)]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    let mut name: Option<String> = None;
    let mut email: Option<Email> = None;
    let mut photo: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_owned();
        match field_name.as_str() {
            "name" => {
                name = Some(field.text().await.map_err(bad_field)?);
            }
            "email" => {
                let value = field.text().await.map_err(bad_field)?;
                email = Some(Email::parse(&value).map_err(|e| AppError::Validation(e.to_string()))?);
            }
            "photo" => {
                let is_image = field
                    .content_type()
                    .is_some_and(|ct| ct.starts_with("image/"));
                if !is_image {
                    return Err(AppError::Validation(
                        "not an image, please upload only images".to_string(),
                    ));
                }

                let bytes = field.bytes().await.map_err(bad_field)?;
                let filename =
                    process_user_photo(bytes.to_vec(), &state.config().upload_dir, user.id).await?;
                photo = Some(filename);
            }
            "password" | "password_confirm" => {
                return Err(AppError::Validation(
                    "this route is not for updating passwords".to_string(),
                ));
            }
            _ => {}
        }
    }

    let updated = UserRepository::new(state.pool())
        .update_profile(user.id, name.as_deref(), email.as_ref(), photo.as_deref())
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "user": updated },
    })))
}

/// Soft-delete the caller's account.
#[instrument(skip_all)]
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode> {
    UserRepository::new(state.pool()).deactivate(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the caller's wishlist.
#[instrument(skip_all)]
pub async fn wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>> {
    let products = UserRepository::new(state.pool()).wishlist(user.id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": products.len(),
        "data": { "products": products },
    })))
}

/// Add a product to the caller's wishlist (idempotent).
#[instrument(skip(state, user))]
pub async fn wishlist_add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    // The foreign key rejects unknown products; surface that as a 404.
    UserRepository::new(state.pool())
        .wishlist_add(user.id, product_id)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::Database(sqlx::Error::Database(db))
                if db.is_foreign_key_violation() =>
            {
                AppError::NotFound("no product found with that id".to_string())
            }
            other => AppError::Database(other),
        })?;

    Ok(StatusCode::CREATED)
}

/// Remove a product from the caller's wishlist.
#[instrument(skip(state, user))]
pub async fn wishlist_remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    let removed = UserRepository::new(state.pool())
        .wishlist_remove(user.id, product_id)
        .await?;

    if !removed {
        return Err(AppError::NotFound(
            "product is not on your wishlist".to_string(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn bad_field(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("malformed multipart field: {e}"))
}
