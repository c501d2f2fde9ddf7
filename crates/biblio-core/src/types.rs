//! # Domain Types
//!
//! Core domain types used throughout Biblio.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Book        │   │      Loan       │   │  Reservation    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  title/author   │   │  book_id (FK)   │   │  book_id (FK)   │       │
//! │  │  is_available   │   │  user_id (FK)   │   │  user_id (FK)   │       │
//! │  │  borrowed_by    │   │  due_date       │   │  created_at     │       │
//! │  └─────────────────┘   │  returned       │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │      User       │   │      Role       │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  id (UUID)      │   │  Student        │                             │
//! │  │  email (unique) │   │  Librarian      │                             │
//! │  │  password_hash  │   │  Admin          │                             │
//! │  │  role           │   └─────────────────┘                             │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Availability Invariant
//! `borrowed_by` is set only while `is_available` is false. The one tolerated
//! anomaly is `Withdrawn`: unavailable with no borrower, reachable only via
//! the administrative force-set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Role
// =============================================================================

/// A user's role, granted at registration (student) or by an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular library member.
    Student,
    /// Staff: may manage the catalog and override returns.
    Librarian,
    /// Full control, including role assignment.
    Admin,
}

impl Role {
    /// Privileged roles may override ownership checks and manage the catalog.
    #[inline]
    pub const fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin | Role::Librarian)
    }

    /// Parses a role name as submitted by the admin role-change endpoint.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "student" => Some(Role::Student),
            "librarian" => Some(Role::Librarian),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Canonical lowercase name, as stored in the database.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Librarian => "librarian",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Student
    }
}

// =============================================================================
// Actor
// =============================================================================

/// The authenticated identity initiating an action.
///
/// Supplied per-request by the access-control layer; the circulation core
/// treats it as read-only input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// User id of the caller.
    pub id: String,
    /// Role at the time the request was authenticated.
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Actor {
            id: id.into(),
            role,
        }
    }
}

// =============================================================================
// Book
// =============================================================================

/// A catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub title: String,
    pub author: String,
    pub category: String,

    /// Whether the book can currently be borrowed.
    pub is_available: bool,

    /// User currently holding the book; `None` while available (and in the
    /// withdrawn anomaly).
    pub borrowed_by: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The availability state of a book, derived from its persisted fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityState {
    /// On the shelf; anyone may borrow it.
    Available,
    /// Held by the given user.
    Borrowed(String),
    /// Unavailable with no borrower: withdrawn from circulation by an
    /// administrator. Only a privileged action can bring it back.
    Withdrawn,
}

impl Book {
    /// Derives the availability state from `is_available` and `borrowed_by`.
    pub fn availability(&self) -> AvailabilityState {
        if self.is_available {
            AvailabilityState::Available
        } else {
            match &self.borrowed_by {
                Some(user) => AvailabilityState::Borrowed(user.clone()),
                None => AvailabilityState::Withdrawn,
            }
        }
    }

    /// Checks the availability invariant: a borrower implies unavailable.
    pub fn invariant_holds(&self) -> bool {
        !(self.is_available && self.borrowed_by.is_some())
    }
}

// =============================================================================
// Loan
// =============================================================================

/// A ledger entry for a formal borrowing with a due date.
///
/// Append-only once returned: `returned` flips to true exactly once and the
/// record is never mutated again.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: String,
    pub book_id: String,
    pub user_id: String,
    pub due_date: DateTime<Utc>,
    pub returned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// An outstanding loan past its due date.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.returned && self.due_date < now
    }
}

// =============================================================================
// Reservation
// =============================================================================

/// Advisory record of interest in a currently-unavailable book.
///
/// Not a binding claim or queue slot; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub book_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// User
// =============================================================================

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Argon2 password hash. Never serialized to API responses; handlers
    /// convert to a public DTO first.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The actor identity this user presents to the circulation core.
    pub fn actor(&self) -> Actor {
        Actor::new(self.id.clone(), self.role)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
