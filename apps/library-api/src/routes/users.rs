//! Account handlers: register, login, current user.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use biblio_core::validation::{validate_email, validate_password, validate_user_name};
use biblio_core::{Role, User};

/// Registration request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token plus account, returned by register and login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// `POST /api/users/register`
///
/// New accounts always start as students; only an admin can promote them.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let name = body.name.trim();
    let email = body.email.trim();

    validate_user_name(name).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validate_email(email).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validate_password(&body.password).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let password_hash = hash_password(&body.password)?;

    let user = state
        .db
        .users()
        .create(name, email, &password_hash, Role::Student)
        .await
        .map_err(|e| match e {
            biblio_db::DbError::UniqueViolation { .. } => {
                ApiError::Conflict("Email already registered".to_string())
            }
            other => other.into(),
        })?;

    let token = state.jwt.generate_token(&user.id, user.role.as_str())?;

    info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// `POST /api/users/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = state
        .db
        .users()
        .find_by_email(body.email.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("Invalid credentials".to_string()))?;

    if !verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::Unauthenticated("Invalid credentials".to_string()));
    }

    let token = state.jwt.generate_token(&user.id, user.role.as_str())?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(AuthResponse { token, user }))
}

/// `GET /api/users/me`
pub async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}
