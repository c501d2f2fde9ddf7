//! # Error Types
//!
//! Domain-specific error types for biblio-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  biblio-core errors (this file)                                        │
//! │  ├── CoreError        - Circulation and policy decisions               │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  biblio-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  library-api errors (in app)                                           │
//! │  └── ApiError         - What clients see (JSON + HTTP status)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (book id, loan id, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each variant maps to exactly one response category: a `Conflict` is a
//!    legitimate outcome of contention, never retried inside the core

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Circulation and authorization errors.
///
/// Every variant is terminal for the triggering action; callers may retry at
/// their own discretion.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced book does not exist.
    #[error("Book not found: {0}")]
    BookNotFound(String),

    /// Referenced loan does not exist.
    #[error("Loan not found: {0}")]
    LoanNotFound(String),

    /// Referenced user does not exist.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// A precondition on current state was violated by a racing transition.
    ///
    /// ## When This Occurs
    /// - Two concurrent borrow attempts on the same available book: exactly
    ///   one succeeds, the rest observe this error
    #[error("Book {book_id} was modified concurrently: {reason}")]
    Conflict { book_id: String, reason: String },

    /// The action is not legal in the current state.
    ///
    /// ## When This Occurs
    /// - Borrowing a book that is already borrowed
    /// - Returning a book that is not borrowed
    /// - Reserving a book that is available
    /// - Returning a loan that was already returned
    #[error("{reason}")]
    InvalidState { reason: String },

    /// Authenticated but unauthorized actor.
    ///
    /// ## When This Occurs
    /// - Non-owner, non-privileged return attempt
    /// - Student calling an admin/librarian operation
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a Conflict error.
    pub fn conflict(book_id: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::Conflict {
            book_id: book_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an InvalidState error.
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        CoreError::InvalidState {
            reason: reason.into(),
        }
    }

    /// Creates a Forbidden error.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        CoreError::Forbidden {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set (e.g., an unknown role name).
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Date is not in the future (e.g., a due date already past).
    #[error("{field} must be in the future")]
    NotInFuture { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::BookNotFound("b-123".to_string());
        assert_eq!(err.to_string(), "Book not found: b-123");

        let err = CoreError::forbidden("You cannot return this book");
        assert_eq!(err.to_string(), "Forbidden: You cannot return this book");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "title".to_string(),
        };
        assert_eq!(err.to_string(), "title is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "email".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
