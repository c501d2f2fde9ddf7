//! # Authorization Policy
//!
//! One centralized (role, action) → allow/deny table, queried uniformly by
//! every operation instead of inline role checks scattered per handler.
//!
//! ## Policy Table
//! ```text
//! ┌──────────────────────┬─────────┬───────────┬───────┐
//! │ Action               │ Student │ Librarian │ Admin │
//! ├──────────────────────┼─────────┼───────────┼───────┤
//! │ ReadCatalog          │    ✓    │     ✓     │   ✓   │
//! │ BorrowBook           │    ✓    │     ✓     │   ✓   │
//! │ CreateLoan           │    ✓    │     ✓     │   ✓   │
//! │ ReturnLoan           │    ✓    │     ✓     │   ✓   │
//! │ ReserveBook          │    ✓    │     ✓     │   ✓   │
//! │ ListOwnLedger        │    ✓    │     ✓     │   ✓   │
//! │ ReturnOverride       │    ✗    │     ✓     │   ✓   │
//! │ CreateBook           │    ✗    │     ✓     │   ✓   │
//! │ SetAvailability      │    ✗    │     ✓     │   ✓   │
//! │ ViewReports          │    ✗    │     ✓     │   ✓   │
//! │ ListUsers            │    ✗    │     ✗     │   ✓   │
//! │ ChangeUserRole       │    ✗    │     ✗     │   ✓   │
//! └──────────────────────┴─────────┴───────────┴───────┘
//! ```
//!
//! Resource ownership (a borrower returning their own book) is a separate
//! input to the circulation decision, not encoded here: the table answers
//! "may this role ever do this", circulation answers "may this actor do it
//! to this book".

use crate::error::{CoreError, CoreResult};
use crate::types::Role;

/// Actions subject to the authorization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Browse the book catalog.
    ReadCatalog,
    /// Ad hoc borrow without a loan record.
    BorrowBook,
    /// Formal borrow with a due-dated loan record.
    CreateLoan,
    /// Ledger-driven return of a loan by loan id.
    ReturnLoan,
    /// Advisory reservation of an unavailable book.
    ReserveBook,
    /// List one's own loans and reservations.
    ListOwnLedger,
    /// Return a book one does not hold.
    ReturnOverride,
    /// Add a book to the catalog.
    CreateBook,
    /// Force-set a book's availability.
    SetAvailability,
    /// Overdue and popularity reports.
    ViewReports,
    /// List all registered users.
    ListUsers,
    /// Assign a role to a user.
    ChangeUserRole,
}

/// The policy table. Pure function of (role, action).
pub fn is_allowed(role: Role, action: Action) -> bool {
    use Action::*;

    match action {
        ReadCatalog | BorrowBook | CreateLoan | ReturnLoan | ReserveBook | ListOwnLedger => true,
        ReturnOverride | CreateBook | SetAvailability | ViewReports => role.is_privileged(),
        ListUsers | ChangeUserRole => role == Role::Admin,
    }
}

/// Checks the policy table, failing with `Forbidden` on a denied action.
pub fn authorize(role: Role, action: Action) -> CoreResult<()> {
    if is_allowed(role, action) {
        Ok(())
    } else {
        Err(CoreError::forbidden(format!(
            "role '{}' may not perform this action",
            role.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_everyone_may_use_circulation() {
        for role in [Role::Student, Role::Librarian, Role::Admin] {
            assert!(is_allowed(role, Action::ReadCatalog));
            assert!(is_allowed(role, Action::BorrowBook));
            assert!(is_allowed(role, Action::CreateLoan));
            assert!(is_allowed(role, Action::ReturnLoan));
            assert!(is_allowed(role, Action::ReserveBook));
            assert!(is_allowed(role, Action::ListOwnLedger));
        }
    }

    #[test]
    fn test_privileged_actions() {
        for action in [
            Action::ReturnOverride,
            Action::CreateBook,
            Action::SetAvailability,
            Action::ViewReports,
        ] {
            assert!(!is_allowed(Role::Student, action));
            assert!(is_allowed(Role::Librarian, action));
            assert!(is_allowed(Role::Admin, action));
        }
    }

    #[test]
    fn test_admin_only_actions() {
        for action in [Action::ListUsers, Action::ChangeUserRole] {
            assert!(!is_allowed(Role::Student, action));
            assert!(!is_allowed(Role::Librarian, action));
            assert!(is_allowed(Role::Admin, action));
        }
    }

    #[test]
    fn test_authorize_denies_with_forbidden() {
        let err = authorize(Role::Student, Action::ChangeUserRole).unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { .. }));
        assert!(authorize(Role::Admin, Action::ChangeUserRole).is_ok());
    }
}
