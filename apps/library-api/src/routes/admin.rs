//! Administrative handlers: reports and user management.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use biblio_core::policy::{authorize, Action};
use biblio_core::validation::validate_role;
use biblio_core::{Book, CoreError, User, POPULAR_BOOKS_LIMIT};
use biblio_db::OverdueLoan;

/// `PATCH /api/admin/users/role` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRoleRequest {
    pub user_id: String,
    pub role: String,
}

/// `GET /api/admin/reports/overdue`
///
/// Outstanding loans past their due date, with book and borrower details.
/// Privileged.
pub async fn overdue_report(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<OverdueLoan>>> {
    authorize(user.role, Action::ViewReports).map_err(ApiError::from)?;

    let report = state.db.loans().overdue(Utc::now()).await?;
    Ok(Json(report))
}

/// `GET /api/admin/reports/popular`
///
/// The newest catalog additions. Privileged.
pub async fn popular_report(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Book>>> {
    authorize(user.role, Action::ViewReports).map_err(ApiError::from)?;

    let books = state.db.books().newest(POPULAR_BOOKS_LIMIT).await?;
    Ok(Json(books))
}

/// `GET /api/admin/users`
///
/// All accounts. Admin only.
pub async fn list_users(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<User>>> {
    authorize(user.role, Action::ListUsers).map_err(ApiError::from)?;

    let users = state.db.users().list_all().await?;
    Ok(Json(users))
}

/// `PATCH /api/admin/users/role`
///
/// Changes an account's role. Admin only; takes effect on the target's next
/// request because authentication reloads the account.
pub async fn set_user_role(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<SetRoleRequest>,
) -> ApiResult<Json<User>> {
    authorize(user.role, Action::ChangeUserRole).map_err(ApiError::from)?;

    let role = validate_role(&body.role).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if !state.db.users().set_role(&body.user_id, role).await? {
        return Err(CoreError::UserNotFound(body.user_id.clone()).into());
    }

    let updated = state
        .db
        .users()
        .get_by_id(&body.user_id)
        .await?
        .ok_or_else(|| CoreError::UserNotFound(body.user_id.clone()))?;

    info!(user_id = %updated.id, role = %role.as_str(), changed_by = %user.id, "User role changed");
    Ok(Json(updated))
}
