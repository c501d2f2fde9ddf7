//! # biblio-core: Pure Business Logic for Biblio
//!
//! This crate is the **heart** of Biblio. It contains all business logic as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Biblio Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 library-api (Axum REST + WS)                    │   │
//! │  │   borrow, return, loans, reservations, admin reports            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ biblio-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐ ┌───────────┐ ┌──────────┐ ┌───────────┐      │   │
//! │  │   │   types   │ │circulation│ │  policy  │ │ validation│      │   │
//! │  │   │   Book    │ │ decide_*  │ │ role ×   │ │   rules   │      │   │
//! │  │   │   Loan    │ │Transition │ │ action   │ │   checks  │      │   │
//! │  │   └───────────┘ └───────────┘ └──────────┘ └───────────┘      │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    biblio-db (Database Layer)                   │   │
//! │  │          SQLite queries, migrations, repositories               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Book, Loan, Reservation, User, Role)
//! - [`circulation`] - The availability state machine (pure decisions)
//! - [`policy`] - Centralized (role, action) authorization table
//! - [`catalog`] - Raw-record → canonical Book normalization
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Decide, Don't Apply**: circulation returns a [`circulation::Transition`];
//!    the store applies it with a single conditional update
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod circulation;
pub mod error;
pub mod policy;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use biblio_core::Book` instead of
// `use biblio_core::types::Book`

pub use circulation::Transition;
pub use error::{CoreError, CoreResult, ValidationError};
pub use policy::Action;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length for free-text name fields (titles, authors, user names).
pub const MAX_NAME_LEN: usize = 200;

/// Minimum plaintext password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Number of books returned by the naive popularity report.
pub const POPULAR_BOOKS_LIMIT: i64 = 10;
