//! # Circulation Service
//!
//! Orchestrates circulation operations: load a book snapshot, ask the core
//! for a transition decision, apply it through the conditional update, then
//! broadcast the change.
//!
//! ## Operation Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Every Circulation Operation                         │
//! │                                                                         │
//! │  1. Load book snapshot          db.books().get_by_id()   404 if absent  │
//! │  2. Pure decision               biblio_core::circulation  403/409/400   │
//! │  3. Atomic application          db.books().apply()        409 if raced  │
//! │  4. Ledger write (loans)        db.loans()                              │
//! │  5. Broadcast                   notifier.book_updated()   best-effort   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::notifier::ChangeNotifier;
use biblio_core::circulation::{
    decide_borrow, decide_create_loan, decide_reserve, decide_return, decide_return_loan,
    decide_set_availability, validate_due_date,
};
use biblio_core::{Actor, Book, CoreError, Loan, Reservation, Transition};
use biblio_db::Database;

/// Circulation operations over a database and notifier.
#[derive(Clone)]
pub struct CirculationService {
    db: Database,
    notifier: ChangeNotifier,
}

impl CirculationService {
    /// Creates a new CirculationService.
    pub fn new(db: Database, notifier: ChangeNotifier) -> Self {
        CirculationService { db, notifier }
    }

    /// Borrows a book for the acting user.
    pub async fn borrow(&self, actor: &Actor, book_id: &str) -> ApiResult<Book> {
        let book = self.load_book(book_id).await?;
        let transition = decide_borrow(&book, actor)?;
        let book = self.commit(&transition).await?;

        info!(book_id = %book.id, user_id = %actor.id, "Book borrowed");
        Ok(book)
    }

    /// Returns a book. Allowed for the borrower or a privileged override.
    pub async fn return_book(&self, actor: &Actor, book_id: &str) -> ApiResult<Book> {
        let book = self.load_book(book_id).await?;
        let transition = decide_return(&book, actor)?;
        let book = self.commit(&transition).await?;

        info!(book_id = %book.id, user_id = %actor.id, "Book returned");
        Ok(book)
    }

    /// Borrows a book and records a loan with a due date.
    pub async fn create_loan(
        &self,
        actor: &Actor,
        book_id: &str,
        due_date: DateTime<Utc>,
    ) -> ApiResult<(Loan, Book)> {
        validate_due_date(due_date, Utc::now())?;

        let book = self.load_book(book_id).await?;
        let transition = decide_create_loan(&book, actor)?;
        let book = self.commit(&transition).await?;

        // The conditional update on the book serializes competitors, so at
        // most one request per availability window reaches this insert.
        let loan = self.db.loans().create(book_id, &actor.id, due_date).await?;

        info!(loan_id = %loan.id, book_id = %book.id, user_id = %actor.id, "Loan created");
        Ok((loan, book))
    }

    /// Returns a loan by id, freeing the referenced book.
    pub async fn return_loan(&self, actor: &Actor, loan_id: &str) -> ApiResult<(Loan, Book)> {
        let loan = self
            .db
            .loans()
            .get_by_id(loan_id)
            .await?
            .ok_or_else(|| CoreError::LoanNotFound(loan_id.to_string()))?;

        let transition = decide_return_loan(&loan)?;

        if !self.db.loans().mark_returned(&loan.id).await? {
            // A concurrent call flipped the flag between read and write
            return Err(ApiError::BadRequest("Already returned".to_string()));
        }

        // Free the book unconditionally of who currently holds it. A book
        // that was force-set available in the meantime fails the update's
        // precondition; the ledger flip above still stands.
        let updated = self.db.books().apply(&transition).await?;
        let book = self.load_book(&loan.book_id).await?;
        if updated {
            self.notifier.book_updated(book.clone());
        }

        let loan = Loan {
            returned: true,
            ..loan
        };

        info!(loan_id = %loan.id, book_id = %book.id, user_id = %actor.id, "Loan returned");
        Ok((loan, book))
    }

    /// Reserves a currently unavailable book.
    pub async fn reserve(&self, actor: &Actor, book_id: &str) -> ApiResult<Reservation> {
        let book = self.load_book(book_id).await?;
        decide_reserve(&book, actor)?;

        let reservation = self.db.reservations().create(book_id, &actor.id).await?;

        info!(reservation_id = %reservation.id, book_id = %book_id, user_id = %actor.id, "Reservation created");
        Ok(reservation)
    }

    /// Force-sets a book's availability (privileged).
    pub async fn set_availability(
        &self,
        actor: &Actor,
        book_id: &str,
        is_available: bool,
    ) -> ApiResult<Book> {
        let book = self.load_book(book_id).await?;
        let transition = decide_set_availability(&book, actor, is_available)?;
        let book = self.commit(&transition).await?;

        info!(book_id = %book.id, is_available, "Availability force-set");
        Ok(book)
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    async fn load_book(&self, book_id: &str) -> ApiResult<Book> {
        let book = self
            .db
            .books()
            .get_by_id(book_id)
            .await?
            .ok_or_else(|| CoreError::BookNotFound(book_id.to_string()))?;
        Ok(book)
    }

    /// Applies a transition, re-reads the book, and broadcasts the change.
    ///
    /// A transition whose stored precondition no longer holds lost a race
    /// against a concurrent request and surfaces as `Conflict`.
    async fn commit(&self, transition: &Transition) -> ApiResult<Book> {
        let book_id = match transition {
            Transition::MarkBorrowed { book_id, .. }
            | Transition::MarkReturned { book_id }
            | Transition::ForceAvailability { book_id, .. } => book_id,
        };

        if !self.db.books().apply(transition).await? {
            return Err(CoreError::conflict(book_id, "Book state changed, please retry").into());
        }

        let book = self.load_book(book_id).await?;
        self.notifier.book_updated(book.clone());
        Ok(book)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_core::catalog::CanonicalBookFields;
    use biblio_core::Role;
    use biblio_db::DbConfig;
    use chrono::Duration;

    async fn service() -> CirculationService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        CirculationService::new(db, ChangeNotifier::new())
    }

    async fn seed_user(svc: &CirculationService, id: &str, role: Role) -> Actor {
        svc.db
            .users()
            .create(
                &format!("User {id}"),
                &format!("{id}@example.com"),
                "hash",
                role,
            )
            .await
            .unwrap()
            .actor()
    }

    async fn seed_book(svc: &CirculationService, title: &str) -> String {
        svc.db
            .books()
            .create(&CanonicalBookFields {
                title: title.to_string(),
                author: "Author".to_string(),
                category: "Fiction".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_borrow_then_return() {
        let svc = service().await;
        let actor = seed_user(&svc, "u1", Role::Student).await;
        let book_id = seed_book(&svc, "Dune").await;

        let book = svc.borrow(&actor, &book_id).await.unwrap();
        assert!(!book.is_available);
        assert_eq!(book.borrowed_by.as_deref(), Some(actor.id.as_str()));

        let book = svc.return_book(&actor, &book_id).await.unwrap();
        assert!(book.is_available);
        assert!(book.borrowed_by.is_none());
    }

    #[tokio::test]
    async fn test_borrow_borrowed_book_conflicts() {
        let svc = service().await;
        let first = seed_user(&svc, "u1", Role::Student).await;
        let second = seed_user(&svc, "u2", Role::Student).await;
        let book_id = seed_book(&svc, "Dune").await;

        svc.borrow(&first, &book_id).await.unwrap();

        let err = svc.borrow(&second, &book_id).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_return_by_non_owner_forbidden() {
        let svc = service().await;
        let owner = seed_user(&svc, "u1", Role::Student).await;
        let other = seed_user(&svc, "u2", Role::Student).await;
        let librarian = seed_user(&svc, "lib", Role::Librarian).await;
        let book_id = seed_book(&svc, "Dune").await;

        svc.borrow(&owner, &book_id).await.unwrap();

        let err = svc.return_book(&other, &book_id).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        // Privileged override succeeds
        let book = svc.return_book(&librarian, &book_id).await.unwrap();
        assert!(book.is_available);
    }

    #[tokio::test]
    async fn test_loan_lifecycle() {
        let svc = service().await;
        let actor = seed_user(&svc, "u1", Role::Student).await;
        let book_id = seed_book(&svc, "Dune").await;

        let due = Utc::now() + Duration::days(14);
        let (loan, book) = svc.create_loan(&actor, &book_id, due).await.unwrap();
        assert!(!loan.returned);
        assert!(!book.is_available);

        let (loan, book) = svc.return_loan(&actor, &loan.id).await.unwrap();
        assert!(loan.returned);
        assert!(book.is_available);

        // Double return is rejected
        let err = svc.return_loan(&actor, &loan.id).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_loan_due_date_must_be_future() {
        let svc = service().await;
        let actor = seed_user(&svc, "u1", Role::Student).await;
        let book_id = seed_book(&svc, "Dune").await;

        let past = Utc::now() - Duration::days(1);
        let err = svc.create_loan(&actor, &book_id, past).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_reserve_only_unavailable_books() {
        let svc = service().await;
        let actor = seed_user(&svc, "u1", Role::Student).await;
        let other = seed_user(&svc, "u2", Role::Student).await;
        let book_id = seed_book(&svc, "Dune").await;

        let err = svc.reserve(&actor, &book_id).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        svc.borrow(&other, &book_id).await.unwrap();
        let reservation = svc.reserve(&actor, &book_id).await.unwrap();
        assert_eq!(reservation.book_id, book_id);
    }

    #[tokio::test]
    async fn test_set_availability_requires_privilege() {
        let svc = service().await;
        let student = seed_user(&svc, "u1", Role::Student).await;
        let admin = seed_user(&svc, "root", Role::Admin).await;
        let book_id = seed_book(&svc, "Dune").await;

        let err = svc
            .set_availability(&student, &book_id, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let book = svc.set_availability(&admin, &book_id, false).await.unwrap();
        assert!(!book.is_available);
        assert!(book.borrowed_by.is_none());
    }

    #[tokio::test]
    async fn test_missing_book_is_not_found() {
        let svc = service().await;
        let actor = seed_user(&svc, "u1", Role::Student).await;

        let err = svc.borrow(&actor, "no-such-book").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
