//! # Repository Module
//!
//! Database repository implementations for Biblio.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  API Handler                                                            │
//! │       │                                                                 │
//! │       │  db.books().get_by_id("...")                                    │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  BookRepository                                                         │
//! │  ├── get_by_id(&self, id)                                               │
//! │  ├── list_all(&self)                                                    │
//! │  ├── create(&self, fields)                                              │
//! │  └── apply(&self, transition)     ◄── race-safe conditional update      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • Easy to test (in-memory database)                                   │
//! │  • SQL is isolated in one place                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`BookRepository`] - Catalog reads and circulation transitions
//! - [`LoanRepository`] - Loan ledger and overdue report
//! - [`ReservationRepository`] - Reservation records
//! - [`UserRepository`] - Accounts, roles, and login lookup

pub mod book;
pub mod loan;
pub mod reservation;
pub mod user;

pub use book::BookRepository;
pub use loan::{LoanRepository, LoanWithBook, OverdueLoan};
pub use reservation::{ReservationRepository, ReservationWithBook};
pub use user::UserRepository;
