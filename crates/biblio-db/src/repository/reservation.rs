//! # Reservation Repository
//!
//! Database operations for reservations. Reservations are interest markers
//! only; fulfilment ordering is not tracked, and duplicates by the same user
//! are allowed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use biblio_core::Reservation;

/// A reservation joined with its book, for a user's own ledger.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReservationWithBook {
    pub id: String,
    pub book_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub book_title: String,
    pub book_author: String,
}

/// Repository for reservation database operations.
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: SqlitePool,
}

impl ReservationRepository {
    /// Creates a new ReservationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReservationRepository { pool }
    }

    /// Records a reservation.
    pub async fn create(&self, book_id: &str, user_id: &str) -> DbResult<Reservation> {
        let reservation = Reservation {
            id: Uuid::new_v4().to_string(),
            book_id: book_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %reservation.id, book_id = %book_id, user_id = %user_id, "Creating reservation");

        sqlx::query(
            r#"
            INSERT INTO reservations (id, book_id, user_id, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&reservation.id)
        .bind(&reservation.book_id)
        .bind(&reservation.user_id)
        .bind(reservation.created_at)
        .execute(&self.pool)
        .await?;

        Ok(reservation)
    }

    /// Lists a user's reservations, newest first, with book details.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<ReservationWithBook>> {
        let reservations = sqlx::query_as::<_, ReservationWithBook>(
            r#"
            SELECT r.id, r.book_id, r.user_id, r.created_at,
                   b.title AS book_title, b.author AS book_author
            FROM reservations r
            JOIN books b ON b.id = r.book_id
            WHERE r.user_id = ?1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use biblio_core::catalog::CanonicalBookFields;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_user(db: &Database, id: &str) {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, 'hash', 'student', ?4, ?4)
            "#,
        )
        .bind(id)
        .bind(format!("User {id}"))
        .bind(format!("{id}@example.com"))
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let db = test_db().await;
        seed_user(&db, "u1").await;
        let book = db
            .books()
            .create(&CanonicalBookFields {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                category: "Sci-Fi".to_string(),
            })
            .await
            .unwrap();

        db.reservations().create(&book.id, "u1").await.unwrap();
        // Duplicate reservations are permitted
        db.reservations().create(&book.id, "u1").await.unwrap();

        let list = db.reservations().list_for_user("u1").await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].book_title, "Dune");

        assert!(db
            .reservations()
            .list_for_user("other")
            .await
            .unwrap()
            .is_empty());
    }
}
