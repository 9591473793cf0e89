//! Lending use-case service.
//!
//! # Responsibility
//! - Create loans and link them into every holder.
//! - Apply return and overdue status transitions.
//!
//! # Invariants
//! - A new loan is appended to `system.loans`, to exactly one librarian and
//!   to exactly one reader, as clones of one handle.
//! - Loan ids are allocated system-wide and never reused.
//! - Returning a loan never removes it from `system.loans`.
//! - A book leaves the catalogue only while no recorded loan refers to it.

use crate::model::{
    shared, BookId, LibrarianId, LibrarySystem, Loan, LoanId, LoanStatus, ReaderId, Shared,
    ValidationError,
};
use chrono::NaiveDate;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

pub type LendingResult<T> = Result<T, LendingError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LendingError {
    ReaderNotFound(ReaderId),
    BookNotFound(BookId),
    LibrarianNotFound(LibrarianId),
    LoanNotFound { reader_id: ReaderId, loan_id: LoanId },
    BookUnavailable(BookId),
    /// A recorded loan still refers to the book.
    BookOnLoan { book_id: BookId, loan_id: LoanId },
    /// `LoanId::MAX` is already taken.
    LoanIdsExhausted,
    Validation(ValidationError),
}

impl Display for LendingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReaderNotFound(id) => write!(f, "reader not found: {id}"),
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
            Self::LibrarianNotFound(id) => write!(f, "librarian not found: {id}"),
            Self::LoanNotFound { reader_id, loan_id } => {
                write!(f, "loan {loan_id} is not held by reader {reader_id}")
            }
            Self::BookUnavailable(id) => write!(f, "book {id} is not available"),
            Self::BookOnLoan { book_id, loan_id } => {
                write!(f, "book {book_id} is still referenced by loan {loan_id}")
            }
            Self::LoanIdsExhausted => write!(f, "no loan ids left to allocate"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LendingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for LendingError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Use-case wrapper over one mutable system.
pub struct LendingService<'sys> {
    system: &'sys mut LibrarySystem,
}

impl<'sys> LendingService<'sys> {
    pub fn new(system: &'sys mut LibrarySystem) -> Self {
        Self { system }
    }

    /// Lends a book to a reader through a librarian.
    ///
    /// # Contract
    /// - All lookups and the date check run before any mutation.
    /// - Returns the handle stored in all three collections.
    ///
    /// # Errors
    /// - `*NotFound` when an id has no entity.
    /// - `BookUnavailable` when the book is already out.
    /// - `LoanIdsExhausted` when no unused loan id remains.
    /// - `Validation` when `return_date < borrow_date`.
    pub fn borrow_book(
        &mut self,
        reader_id: ReaderId,
        book_id: BookId,
        librarian_id: LibrarianId,
        borrow_date: NaiveDate,
        return_date: NaiveDate,
    ) -> LendingResult<Shared<Loan>> {
        let reader = self
            .system
            .find_reader(reader_id)
            .ok_or(LendingError::ReaderNotFound(reader_id))?;
        let book = self
            .system
            .library
            .find_book(book_id)
            .ok_or(LendingError::BookNotFound(book_id))?;
        let librarian = self
            .system
            .library
            .find_librarian(librarian_id)
            .ok_or(LendingError::LibrarianNotFound(librarian_id))?;

        if !book.borrow().is_available() {
            return Err(LendingError::BookUnavailable(book_id));
        }

        let loan_id = self
            .system
            .next_loan_id()
            .ok_or(LendingError::LoanIdsExhausted)?;
        let mut loan = Loan::new(loan_id, borrow_date, return_date)?;
        loan.book = Some(Rc::clone(&book));
        loan.set_librarian(&librarian);
        let loan = shared(loan);

        book.borrow_mut().mark_borrowed();
        self.system.loans.push(Rc::clone(&loan));
        librarian.borrow_mut().managed_loans.push(Rc::clone(&loan));
        reader.borrow_mut().loans.push(Rc::clone(&loan));

        info!(
            "event=loan_create module=lending status=ok loan_id={} reader_id={} book_id={} librarian_id={}",
            loan_id, reader_id, book_id, librarian_id
        );
        Ok(loan)
    }

    /// Closes a loan held by a reader.
    ///
    /// The loan is marked `Returned`, its book goes back on the shelf and the
    /// reader stops holding it. Librarian history and the system list keep it.
    pub fn return_book(&mut self, reader_id: ReaderId, loan_id: LoanId) -> LendingResult<()> {
        let reader = self
            .system
            .find_reader(reader_id)
            .ok_or(LendingError::ReaderNotFound(reader_id))?;

        let loan = {
            let mut reader = reader.borrow_mut();
            let position = reader
                .loans
                .iter()
                .position(|loan| loan.borrow().id == loan_id)
                .ok_or(LendingError::LoanNotFound { reader_id, loan_id })?;
            reader.loans.remove(position)
        };

        let mut loan = loan.borrow_mut();
        loan.status = LoanStatus::Returned;
        match &loan.book {
            Some(book) => book.borrow_mut().mark_returned(),
            None => warn!(
                "event=loan_return module=lending status=warn loan_id={} reason=no_book",
                loan_id
            ),
        }

        info!(
            "event=loan_return module=lending status=ok loan_id={} reader_id={}",
            loan_id, reader_id
        );
        Ok(())
    }

    /// Takes a book out of the catalogue.
    ///
    /// # Errors
    /// - `BookNotFound` when the catalogue has no such book.
    /// - `BookOnLoan` when any recorded loan, returned or not, still refers
    ///   to the book.
    pub fn remove_book(&mut self, book_id: BookId) -> LendingResult<()> {
        let book = self
            .system
            .library
            .find_book(book_id)
            .ok_or(LendingError::BookNotFound(book_id))?;

        let holder = self.system.loans.iter().find_map(|loan| {
            let loan = loan.borrow();
            let refers = loan
                .book
                .as_ref()
                .is_some_and(|held| Rc::ptr_eq(held, &book));
            refers.then_some(loan.id)
        });
        if let Some(loan_id) = holder {
            return Err(LendingError::BookOnLoan { book_id, loan_id });
        }

        self.system
            .library
            .books
            .retain(|held| !Rc::ptr_eq(held, &book));
        info!(
            "event=book_remove module=lending status=ok book_id={}",
            book_id
        );
        Ok(())
    }

    /// Flags active loans past their due date. Returns how many changed.
    pub fn mark_overdue(&mut self, today: NaiveDate) -> usize {
        let mut changed = 0;
        for loan in &self.system.loans {
            let mut loan = loan.borrow_mut();
            if loan.status == LoanStatus::Active && loan.return_date() < today {
                loan.status = LoanStatus::Overdue;
                changed += 1;
            }
        }

        if changed > 0 {
            info!(
                "event=loan_overdue module=lending status=ok changed={}",
                changed
            );
        }
        changed
    }
}
