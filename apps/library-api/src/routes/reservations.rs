//! Reservation handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;
use biblio_core::Reservation;
use biblio_db::ReservationWithBook;

/// `POST /api/reservations` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    pub book_id: String,
}

/// `POST /api/reservations`
pub async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateReservationRequest>,
) -> ApiResult<(StatusCode, Json<Reservation>)> {
    let reservation = state
        .circulation
        .reserve(&user.actor(), &body.book_id)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// `GET /api/reservations`
///
/// The acting user's own reservations, newest first.
pub async fn list_own(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ReservationWithBook>>> {
    let reservations = state.db.reservations().list_for_user(&user.id).await?;
    Ok(Json(reservations))
}
