//! Lending-library domain model.
//!
//! # Responsibility
//! - Define the entities persisted by snapshots.
//! - Express shared, multiply-referenced loans with `Shared<T>` handles.
//!
//! # Invariants
//! - Every entity carries a numeric id unique within its own kind.
//! - A loan exists once; every holder clones the same handle.
//! - Validated fields are rejected at construction, not at save time.

pub mod book;
pub mod library;
pub mod loan;
pub mod person;
pub mod validation;

use std::cell::RefCell;
use std::rc::Rc;

pub use book::{Book, BookKind, BookStatus};
pub use library::{Library, LibrarySystem};
pub use loan::{Loan, LoanStatus};
pub use person::{Librarian, Reader};
pub use validation::ValidationError;

pub type LibraryId = u32;
pub type BookId = u32;
pub type LibrarianId = u32;
pub type ReaderId = u32;
pub type LoanId = u32;

/// Single-threaded shared handle. Identity is `Rc::ptr_eq`.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps a value into a fresh shared handle.
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}
