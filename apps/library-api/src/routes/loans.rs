//! Loan ledger handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;
use biblio_core::{Book, Loan};
use biblio_db::LoanWithBook;

/// `POST /api/loans` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoanRequest {
    pub book_id: String,
    pub due_date: DateTime<Utc>,
}

/// Loan operation response: the ledger entry plus the book it moved.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanResponse {
    pub loan: Loan,
    pub book: Book,
}

/// `POST /api/loans`
pub async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateLoanRequest>,
) -> ApiResult<(StatusCode, Json<LoanResponse>)> {
    let (loan, book) = state
        .circulation
        .create_loan(&user.actor(), &body.book_id, body.due_date)
        .await?;
    Ok((StatusCode::CREATED, Json(LoanResponse { loan, book })))
}

/// `GET /api/loans`
///
/// The acting user's own ledger, newest first.
pub async fn list_own(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<LoanWithBook>>> {
    let loans = state.db.loans().list_for_user(&user.id).await?;
    Ok(Json(loans))
}

/// `POST /api/loans/{id}/return`
pub async fn return_loan(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<LoanResponse>> {
    let (loan, book) = state.circulation.return_loan(&user.actor(), &id).await?;
    Ok(Json(LoanResponse { loan, book }))
}
