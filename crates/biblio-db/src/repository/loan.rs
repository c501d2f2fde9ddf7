//! # Loan Repository
//!
//! Database operations for the loan ledger. Loans are append-mostly: each
//! borrow inserts a row, and returning flips `returned` exactly once. A
//! partial unique index keeps at most one outstanding loan per book, so a
//! racing insert after a lost availability update surfaces as a unique
//! violation rather than a duplicate ledger entry.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use biblio_core::Loan;

/// A loan joined with its book, for a user's own ledger.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LoanWithBook {
    pub id: String,
    pub book_id: String,
    pub user_id: String,
    pub due_date: DateTime<Utc>,
    pub returned: bool,
    pub created_at: DateTime<Utc>,
    pub book_title: String,
    pub book_author: String,
}

/// An overdue loan joined with book and borrower, for the admin report.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OverdueLoan {
    pub id: String,
    pub book_id: String,
    pub user_id: String,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub book_title: String,
    pub book_author: String,
    pub user_name: String,
    pub user_email: String,
}

/// Repository for loan database operations.
#[derive(Debug, Clone)]
pub struct LoanRepository {
    pool: SqlitePool,
}

impl LoanRepository {
    /// Creates a new LoanRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LoanRepository { pool }
    }

    /// Records a new outstanding loan.
    pub async fn create(
        &self,
        book_id: &str,
        user_id: &str,
        due_date: DateTime<Utc>,
    ) -> DbResult<Loan> {
        let now = Utc::now();
        let loan = Loan {
            id: Uuid::new_v4().to_string(),
            book_id: book_id.to_string(),
            user_id: user_id.to_string(),
            due_date,
            returned: false,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %loan.id, book_id = %book_id, user_id = %user_id, "Creating loan");

        sqlx::query(
            r#"
            INSERT INTO loans (id, book_id, user_id, due_date, returned, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)
            "#,
        )
        .bind(&loan.id)
        .bind(&loan.book_id)
        .bind(&loan.user_id)
        .bind(loan.due_date)
        .bind(loan.created_at)
        .bind(loan.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(loan)
    }

    /// Gets a loan by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            SELECT id, book_id, user_id, due_date, returned, created_at, updated_at
            FROM loans
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(loan)
    }

    /// Finds the outstanding loan for a book, if any.
    pub async fn outstanding_for_book(&self, book_id: &str) -> DbResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            SELECT id, book_id, user_id, due_date, returned, created_at, updated_at
            FROM loans
            WHERE book_id = ?1 AND returned = 0
            "#,
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(loan)
    }

    /// Marks a loan returned. Returns `false` when the loan was already
    /// returned (or does not exist), so the caller can distinguish a lost
    /// race from success.
    pub async fn mark_returned(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET returned = 1, updated_at = ?2
            WHERE id = ?1 AND returned = 0
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a user's loans, newest first, with book details.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<LoanWithBook>> {
        let loans = sqlx::query_as::<_, LoanWithBook>(
            r#"
            SELECT l.id, l.book_id, l.user_id, l.due_date, l.returned, l.created_at,
                   b.title AS book_title, b.author AS book_author
            FROM loans l
            JOIN books b ON b.id = l.book_id
            WHERE l.user_id = ?1
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Lists outstanding loans past their due date, with book and borrower.
    pub async fn overdue(&self, now: DateTime<Utc>) -> DbResult<Vec<OverdueLoan>> {
        let loans = sqlx::query_as::<_, OverdueLoan>(
            r#"
            SELECT l.id, l.book_id, l.user_id, l.due_date, l.created_at,
                   b.title AS book_title, b.author AS book_author,
                   u.name AS user_name, u.email AS user_email
            FROM loans l
            JOIN books b ON b.id = l.book_id
            JOIN users u ON u.id = l.user_id
            WHERE l.returned = 0 AND l.due_date < ?1
            ORDER BY l.due_date
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
