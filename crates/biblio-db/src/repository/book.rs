//! # Book Repository
//!
//! Database operations for the catalog, including the atomic conditional
//! updates that apply circulation transitions.
//!
//! ## Why Conditional Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Race-Safe Transition Application                           │
//! │                                                                         │
//! │  Request A                         Request B                            │
//! │  ─────────                         ─────────                            │
//! │  read book: available              read book: available                 │
//! │  core decides: MarkBorrowed        core decides: MarkBorrowed           │
//! │  UPDATE ... WHERE is_available=1   UPDATE ... WHERE is_available=1      │
//! │     └── 1 row: committed              └── 0 rows: lost the race         │
//! │                                           └── surfaced as Conflict      │
//! │                                                                         │
//! │  The precondition travels into the UPDATE's WHERE clause, so the        │
//! │  read-check-write cycle is atomic per book with no explicit lock.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use biblio_core::catalog::CanonicalBookFields;
use biblio_core::{Book, Transition};

/// Repository for book database operations.
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Gets a book by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, category, is_available, borrowed_by,
                   created_at, updated_at
            FROM books
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Lists the whole catalog.
    pub async fn list_all(&self) -> DbResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, category, is_available, borrowed_by,
                   created_at, updated_at
            FROM books
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Lists the most recently added books (the naive popularity report).
    pub async fn newest(&self, limit: i64) -> DbResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, category, is_available, borrowed_by,
                   created_at, updated_at
            FROM books
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Creates a new available book from canonical fields.
    pub async fn create(&self, fields: &CanonicalBookFields) -> DbResult<Book> {
        let now = Utc::now();
        let book = Book {
            id: Uuid::new_v4().to_string(),
            title: fields.title.clone(),
            author: fields.author.clone(),
            category: fields.category.clone(),
            is_available: true,
            borrowed_by: None,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %book.id, title = %book.title, "Creating book");

        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, category, is_available, borrowed_by,
                               created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(book.is_available)
        .bind(&book.borrowed_by)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(book)
    }

    /// Applies a circulation transition atomically.
    ///
    /// ## Returns
    /// * `Ok(true)` - the transition committed
    /// * `Ok(false)` - the stored state no longer satisfied the transition's
    ///   precondition (a racing transition won, or the book vanished)
    pub async fn apply(&self, transition: &Transition) -> DbResult<bool> {
        let now = Utc::now();

        let result = match transition {
            Transition::MarkBorrowed { book_id, borrower } => {
                debug!(book_id = %book_id, borrower = %borrower, "Applying MarkBorrowed");
                sqlx::query(
                    r#"
                    UPDATE books
                    SET is_available = 0, borrowed_by = ?2, updated_at = ?3
                    WHERE id = ?1 AND is_available = 1
                    "#,
                )
                .bind(book_id)
                .bind(borrower)
                .bind(now)
                .execute(&self.pool)
                .await?
            }

            Transition::MarkReturned { book_id } => {
                debug!(book_id = %book_id, "Applying MarkReturned");
                sqlx::query(
                    r#"
                    UPDATE books
                    SET is_available = 1, borrowed_by = NULL, updated_at = ?2
                    WHERE id = ?1 AND is_available = 0
                    "#,
                )
                .bind(book_id)
                .bind(now)
                .execute(&self.pool)
                .await?
            }

            // Force-set has no precondition. Forcing available clears the
            // borrower; forcing unavailable keeps whatever borrower exists
            // (none, when withdrawing an available book).
            Transition::ForceAvailability {
                book_id,
                is_available,
            } => {
                debug!(book_id = %book_id, is_available, "Applying ForceAvailability");
                if *is_available {
                    sqlx::query(
                        r#"
                        UPDATE books
                        SET is_available = 1, borrowed_by = NULL, updated_at = ?2
                        WHERE id = ?1
                        "#,
                    )
                    .bind(book_id)
                    .bind(now)
                    .execute(&self.pool)
                    .await?
                } else {
                    sqlx::query(
                        r#"
                        UPDATE books
                        SET is_available = 0, updated_at = ?2
                        WHERE id = ?1
                        "#,
                    )
                    .bind(book_id)
                    .bind(now)
                    .execute(&self.pool)
                    .await?
                }
            }
        };

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use biblio_core::AvailabilityState;

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

    fn fields() -> CanonicalBookFields {
        CanonicalBookFields {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            category: "Sci-Fi".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = test_db().await;
        let created = db.books().create(&fields()).await.unwrap();

        let fetched = db.books().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Dune");
        assert!(fetched.is_available);
        assert!(fetched.borrowed_by.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_book() {
        let db = test_db().await;
        assert!(db.books().get_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_borrowed_is_conditional() {
        let db = test_db().await;
        seed_user(&db, "u1").await;
        seed_user(&db, "u2").await;
        let book = db.books().create(&fields()).await.unwrap();

        let borrow = |user: &str| Transition::MarkBorrowed {
            book_id: book.id.clone(),
            borrower: user.to_string(),
        };

        // First borrow wins
        assert!(db.books().apply(&borrow("u1")).await.unwrap());

        // Second borrow finds the precondition gone
        assert!(!db.books().apply(&borrow("u2")).await.unwrap());

        let stored = db.books().get_by_id(&book.id).await.unwrap().unwrap();
        assert_eq!(
            stored.availability(),
            AvailabilityState::Borrowed("u1".to_string())
        );
        assert!(stored.invariant_holds());
    }

    #[tokio::test]
    async fn test_borrow_return_round_trip() {
        let db = test_db().await;
        seed_user(&db, "u1").await;
        let book = db.books().create(&fields()).await.unwrap();

        db.books()
            .apply(&Transition::MarkBorrowed {
                book_id: book.id.clone(),
                borrower: "u1".to_string(),
            })
            .await
            .unwrap();

        assert!(db
            .books()
            .apply(&Transition::MarkReturned {
                book_id: book.id.clone(),
            })
            .await
            .unwrap());

        let stored = db.books().get_by_id(&book.id).await.unwrap().unwrap();
        assert_eq!(stored.availability(), AvailabilityState::Available);

        // Returning an available book fails the precondition
        assert!(!db
            .books()
            .apply(&Transition::MarkReturned {
                book_id: book.id.clone(),
            })
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_force_availability() {
        let db = test_db().await;
        seed_user(&db, "u1").await;
        let book = db.books().create(&fields()).await.unwrap();

        // Withdraw an available book: unavailable, no borrower
        db.books()
            .apply(&Transition::ForceAvailability {
                book_id: book.id.clone(),
                is_available: false,
            })
            .await
            .unwrap();
        let stored = db.books().get_by_id(&book.id).await.unwrap().unwrap();
        assert_eq!(stored.availability(), AvailabilityState::Withdrawn);

        // Force back to available
        db.books()
            .apply(&Transition::ForceAvailability {
                book_id: book.id.clone(),
                is_available: true,
            })
            .await
            .unwrap();
        let stored = db.books().get_by_id(&book.id).await.unwrap().unwrap();
        assert_eq!(stored.availability(), AvailabilityState::Available);

        // Forcing available also clears a real borrower
        db.books()
            .apply(&Transition::MarkBorrowed {
                book_id: book.id.clone(),
                borrower: "u1".to_string(),
            })
            .await
            .unwrap();
        db.books()
            .apply(&Transition::ForceAvailability {
                book_id: book.id.clone(),
                is_available: true,
            })
            .await
            .unwrap();
        let stored = db.books().get_by_id(&book.id).await.unwrap().unwrap();
        assert!(stored.is_available);
        assert!(stored.borrowed_by.is_none());
    }

    #[tokio::test]
    async fn test_newest_orders_by_creation() {
        let db = test_db().await;
        for i in 0..3 {
            let mut f = fields();
            f.title = format!("Book {i}");
            db.books().create(&f).await.unwrap();
            // created_at is TEXT with millisecond precision; keep inserts apart
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let newest = db.books().newest(2).await.unwrap();
        assert_eq!(newest.len(), 2);
        assert_eq!(newest[0].title, "Book 2");
        assert_eq!(newest[1].title, "Book 1");
    }
}
