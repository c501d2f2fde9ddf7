//! # Routes Module
//!
//! Axum handlers grouped by resource, plus the router that wires them up.
//!
//! ## Endpoint Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Biblio REST Surface                             │
//! │                                                                         │
//! │  Public                                                                 │
//! │    POST   /api/users/register        create account, returns token      │
//! │    POST   /api/users/login           returns token                      │
//! │    GET    /health                    liveness probe                     │
//! │                                                                         │
//! │  Authenticated (bearer token)                                           │
//! │    GET    /api/users/me              current account                    │
//! │    GET    /api/books                 full catalog                       │
//! │    GET    /api/books/{id}            single book                       │
//! │    POST   /api/books/{id}/borrow     borrow                             │
//! │    POST   /api/books/{id}/return     return (owner or privileged)       │
//! │    POST   /api/loans                 borrow with due date               │
//! │    GET    /api/loans                 own loan ledger                    │
//! │    POST   /api/loans/{id}/return     return by loan id                  │
//! │    POST   /api/reservations          reserve unavailable book           │
//! │    GET    /api/reservations          own reservations                   │
//! │    GET    /ws                        availability change feed           │
//! │                                                                         │
//! │  Privileged (librarian/admin)                                           │
//! │    POST   /api/books                 add to catalog                     │
//! │    PATCH  /api/books/{id}/status     force-set availability             │
//! │    GET    /api/admin/reports/overdue outstanding loans past due         │
//! │    GET    /api/admin/reports/popular newest additions                   │
//! │                                                                         │
//! │  Admin only                                                             │
//! │    GET    /api/admin/users           list accounts                      │
//! │    PATCH  /api/admin/users/role      change a user's role               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod admin;
pub mod books;
pub mod loans;
pub mod reservations;
pub mod users;

use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::json;

use crate::notifier::ws_handler;
use crate::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Accounts
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login))
        .route("/api/users/me", get(users::me))
        // Catalog and circulation
        .route("/api/books", get(books::list).post(books::create))
        .route("/api/books/{id}", get(books::get_one))
        .route("/api/books/{id}/borrow", post(books::borrow))
        .route("/api/books/{id}/return", post(books::return_book))
        .route("/api/books/{id}/status", patch(books::set_status))
        // Loans
        .route("/api/loans", get(loans::list_own).post(loans::create))
        .route("/api/loans/{id}/return", post(loans::return_loan))
        // Reservations
        .route(
            "/api/reservations",
            get(reservations::list_own).post(reservations::create),
        )
        // Admin
        .route("/api/admin/reports/overdue", get(admin::overdue_report))
        .route("/api/admin/reports/popular", get(admin::popular_report))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/role", patch(admin::set_user_role))
        // Change feed
        .route("/ws", get(ws_handler))
        // Liveness
        .route("/health", get(health))
        .with_state(state)
}

/// `GET /health` liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
