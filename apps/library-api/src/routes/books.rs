//! Catalog and circulation handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use biblio_core::catalog::{normalize, RawBookRecord};
use biblio_core::policy::{authorize, Action};
use biblio_core::{Book, CoreError};

/// `PATCH /api/books/{id}/status` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    pub is_available: bool,
}

/// `GET /api/books`
pub async fn list(AuthUser(_user): AuthUser, State(state): State<AppState>) -> ApiResult<Json<Vec<Book>>> {
    let books = state.db.books().list_all().await?;
    Ok(Json(books))
}

/// `GET /api/books/{id}`
pub async fn get_one(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Book>> {
    let book = state
        .db
        .books()
        .get_by_id(&id)
        .await?
        .ok_or(CoreError::BookNotFound(id))?;
    Ok(Json(book))
}

/// `POST /api/books`
///
/// Accepts loosely-keyed records (`Title`/`Author`/`Genre` aliases included)
/// and normalizes them before insert. Privileged.
pub async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(raw): Json<RawBookRecord>,
) -> ApiResult<(StatusCode, Json<Book>)> {
    authorize(user.role, Action::CreateBook).map_err(ApiError::from)?;

    let fields = normalize(raw).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let book = state.db.books().create(&fields).await?;

    info!(book_id = %book.id, title = %book.title, "Book added to catalog");
    Ok((StatusCode::CREATED, Json(book)))
}

/// `POST /api/books/{id}/borrow`
pub async fn borrow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Book>> {
    let book = state.circulation.borrow(&user.actor(), &id).await?;
    Ok(Json(book))
}

/// `POST /api/books/{id}/return`
pub async fn return_book(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Book>> {
    let book = state.circulation.return_book(&user.actor(), &id).await?;
    Ok(Json(book))
}

/// `PATCH /api/books/{id}/status`
pub async fn set_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SetStatusRequest>,
) -> ApiResult<Json<Book>> {
    let book = state
        .circulation
        .set_availability(&user.actor(), &id, body.is_available)
        .await?;
    Ok(Json(book))
}
