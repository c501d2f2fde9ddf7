//! # Circulation State Machine
//!
//! Pure transition decisions for book availability. This module is the single
//! source of truth for "who currently holds this book" and which transitions
//! are legal.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Book Availability States                             │
//! │                                                                         │
//! │                    Borrow / CreateLoan                                  │
//! │        ┌──────────────────────────────────────┐                         │
//! │        │                                      ▼                         │
//! │  ┌───────────┐                        ┌──────────────┐                  │
//! │  │ AVAILABLE │                        │ BORROWED(by) │                  │
//! │  └───────────┘                        └──────────────┘                  │
//! │        ▲                                      │                         │
//! │        └──────────────────────────────────────┘                         │
//! │          Return (owner or privileged)                                   │
//! │          ReturnLoan (by loan id, no owner check)                        │
//! │                                                                         │
//! │  ┌───────────┐   SetAvailability(false), no borrower recorded          │
//! │  │ WITHDRAWN │ ◄─── privileged only; tolerated anomaly                 │
//! │  └───────────┘                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Division of Labor
//! Functions here decide against a Book *snapshot*; they never touch storage.
//! The decision is a [`Transition`] that the db layer applies with a single
//! conditional update, so a snapshot that went stale between read and write
//! loses the race and surfaces as `Conflict` rather than corrupting state.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::policy::{authorize, Action};
use crate::types::{Actor, AvailabilityState, Book, Loan};

// =============================================================================
// Transition
// =============================================================================

/// A committed decision, ready to be applied atomically by the store.
///
/// Each variant names the precondition the store must re-check in the same
/// statement that performs the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Available → Borrowed(borrower). Store precondition: still available.
    MarkBorrowed { book_id: String, borrower: String },

    /// Borrowed/Withdrawn → Available. Store precondition: still unavailable.
    MarkReturned { book_id: String },

    /// Administrative force-set, no precondition. Forcing available clears
    /// the borrower; forcing unavailable records no borrower (Withdrawn).
    ForceAvailability { book_id: String, is_available: bool },
}

// =============================================================================
// Transition Decisions
// =============================================================================

/// Decides an ad hoc borrow.
///
/// ## Errors
/// - `Forbidden` if the policy denies the actor
/// - `Conflict` if the book is not currently available
pub fn decide_borrow(book: &Book, actor: &Actor) -> CoreResult<Transition> {
    authorize(actor.role, Action::BorrowBook)?;

    match book.availability() {
        AvailabilityState::Available => Ok(Transition::MarkBorrowed {
            book_id: book.id.clone(),
            borrower: actor.id.clone(),
        }),
        AvailabilityState::Borrowed(_) => {
            Err(CoreError::conflict(&book.id, "Book already borrowed"))
        }
        AvailabilityState::Withdrawn => {
            Err(CoreError::conflict(&book.id, "Book withdrawn from circulation"))
        }
    }
}

/// Decides a loan-style borrow. Identical availability rules to
/// [`decide_borrow`]; the caller appends the Loan record after the book
/// transition commits.
pub fn decide_create_loan(book: &Book, actor: &Actor) -> CoreResult<Transition> {
    authorize(actor.role, Action::CreateLoan)?;

    match book.availability() {
        AvailabilityState::Available => Ok(Transition::MarkBorrowed {
            book_id: book.id.clone(),
            borrower: actor.id.clone(),
        }),
        _ => Err(CoreError::conflict(&book.id, "Book not available")),
    }
}

/// Decides a return.
///
/// Allowed for the current borrower, or for a privileged role as an override
/// (which is also the only way to bring a withdrawn book back this way).
///
/// ## Errors
/// - `InvalidState` if the book is not currently borrowed
/// - `Forbidden` for a non-owner, non-privileged actor
pub fn decide_return(book: &Book, actor: &Actor) -> CoreResult<Transition> {
    match book.availability() {
        AvailabilityState::Available => Err(CoreError::invalid_state("Book is not borrowed")),
        AvailabilityState::Borrowed(holder) => {
            if holder == actor.id {
                // Owner return
            } else {
                authorize(actor.role, Action::ReturnOverride)
                    .map_err(|_| CoreError::forbidden("You cannot return this book"))?;
            }
            Ok(Transition::MarkReturned {
                book_id: book.id.clone(),
            })
        }
        AvailabilityState::Withdrawn => {
            // No owner exists, so only the privileged override applies.
            authorize(actor.role, Action::ReturnOverride)
                .map_err(|_| CoreError::forbidden("You cannot return this book"))?;
            Ok(Transition::MarkReturned {
                book_id: book.id.clone(),
            })
        }
    }
}

/// Decides a ledger-driven loan return, keyed by loan id.
///
/// No ownership check: this path is invoked by loan-record id and frees the
/// referenced book regardless of its current borrower.
///
/// ## Errors
/// - `InvalidState` if the loan was already returned (idempotent-safe: the
///   second call is rejected, never silently double-applied)
pub fn decide_return_loan(loan: &Loan) -> CoreResult<Transition> {
    if loan.returned {
        return Err(CoreError::invalid_state("Already returned"));
    }
    Ok(Transition::MarkReturned {
        book_id: loan.book_id.clone(),
    })
}

/// Decides an administrative availability force-set.
///
/// ## Errors
/// - `Forbidden` unless the actor is admin or librarian
pub fn decide_set_availability(
    book: &Book,
    actor: &Actor,
    is_available: bool,
) -> CoreResult<Transition> {
    authorize(actor.role, Action::SetAvailability)?;

    Ok(Transition::ForceAvailability {
        book_id: book.id.clone(),
        is_available,
    })
}

/// Decides a reservation. Reservations are legal only while the book is
/// unavailable; they record advisory interest and never change book state.
///
/// ## Errors
/// - `InvalidState` if the book is currently available
pub fn decide_reserve(book: &Book, actor: &Actor) -> CoreResult<()> {
    authorize(actor.role, Action::ReserveBook)?;

    match book.availability() {
        AvailabilityState::Available => Err(CoreError::invalid_state(
            "Book is available; no reservation needed",
        )),
        _ => Ok(()),
    }
}

/// Validates a loan due date at decision time.
pub fn validate_due_date(due_date: DateTime<Utc>, now: DateTime<Utc>) -> CoreResult<()> {
    if due_date <= now {
        return Err(crate::error::ValidationError::NotInFuture {
            field: "dueDate".to_string(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn book(is_available: bool, borrowed_by: Option<&str>) -> Book {
        let now = Utc::now();
        Book {
            id: "b1".to_string(),
            title: "The Left Hand of Darkness".to_string(),
            author: "Ursula K. Le Guin".to_string(),
            category: "Sci-Fi".to_string(),
            is_available,
            borrowed_by: borrowed_by.map(String::from),
            created_at: now,
            updated_at: now,
        }
    }

    fn student(id: &str) -> Actor {
        Actor::new(id, Role::Student)
    }

    #[test]
    fn test_borrow_available_book() {
        let t = decide_borrow(&book(true, None), &student("u1")).unwrap();
        assert_eq!(
            t,
            Transition::MarkBorrowed {
                book_id: "b1".to_string(),
                borrower: "u1".to_string(),
            }
        );
    }

    #[test]
    fn test_borrow_borrowed_book_conflicts() {
        let err = decide_borrow(&book(false, Some("u2")), &student("u1")).unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));
    }

    #[test]
    fn test_borrow_withdrawn_book_conflicts() {
        let err = decide_borrow(&book(false, None), &student("u1")).unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));
    }

    #[test]
    fn test_return_by_owner() {
        let t = decide_return(&book(false, Some("u1")), &student("u1")).unwrap();
        assert_eq!(
            t,
            Transition::MarkReturned {
                book_id: "b1".to_string()
            }
        );
    }

    #[test]
    fn test_return_by_stranger_forbidden() {
        let err = decide_return(&book(false, Some("u1")), &student("u2")).unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { .. }));
    }

    #[test]
    fn test_return_override_by_privileged() {
        for role in [Role::Librarian, Role::Admin] {
            let actor = Actor::new("staff", role);
            assert!(decide_return(&book(false, Some("u1")), &actor).is_ok());
        }
    }

    #[test]
    fn test_return_available_book_invalid() {
        let err = decide_return(&book(true, None), &student("u1")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidState { .. }));
    }

    #[test]
    fn test_return_withdrawn_book_requires_privilege() {
        let err = decide_return(&book(false, None), &student("u1")).unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { .. }));

        let librarian = Actor::new("staff", Role::Librarian);
        assert!(decide_return(&book(false, None), &librarian).is_ok());
    }

    #[test]
    fn test_return_loan_rejects_already_returned() {
        let now = Utc::now();
        let mut loan = Loan {
            id: "l1".to_string(),
            book_id: "b1".to_string(),
            user_id: "u1".to_string(),
            due_date: now + chrono::Duration::days(14),
            returned: false,
            created_at: now,
            updated_at: now,
        };

        let t = decide_return_loan(&loan).unwrap();
        assert_eq!(
            t,
            Transition::MarkReturned {
                book_id: "b1".to_string()
            }
        );

        loan.returned = true;
        let err = decide_return_loan(&loan).unwrap_err();
        assert!(matches!(err, CoreError::InvalidState { .. }));
    }

    #[test]
    fn test_set_availability_requires_privilege() {
        let err = decide_set_availability(&book(false, Some("u1")), &student("u1"), true)
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { .. }));

        let admin = Actor::new("staff", Role::Admin);
        let t = decide_set_availability(&book(false, Some("u1")), &admin, true).unwrap();
        assert_eq!(
            t,
            Transition::ForceAvailability {
                book_id: "b1".to_string(),
                is_available: true,
            }
        );
    }

    #[test]
    fn test_reserve_only_while_unavailable() {
        let err = decide_reserve(&book(true, None), &student("u1")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidState { .. }));

        assert!(decide_reserve(&book(false, Some("u2")), &student("u1")).is_ok());
        assert!(decide_reserve(&book(false, None), &student("u1")).is_ok());
    }

    #[test]
    fn test_due_date_must_be_future() {
        let now = Utc::now();
        assert!(validate_due_date(now + chrono::Duration::days(7), now).is_ok());
        assert!(validate_due_date(now - chrono::Duration::days(1), now).is_err());
        assert!(validate_due_date(now, now).is_err());
    }
}
