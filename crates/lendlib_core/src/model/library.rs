//! Library and system aggregate root.
//!
//! # Responsibility
//! - Own books, librarians, readers and the canonical loan list.
//! - Offer id lookups used by the lending service.
//!
//! # Invariants
//! - `Library::id` never changes after construction.
//! - Collections keep insertion order.
//! - `LibrarySystem::loans` is the single owner list of every loan.

use super::{
    shared, Book, BookId, Librarian, LibrarianId, LibraryId, Loan, LoanId, Reader, ReaderId,
    Shared,
};
use std::rc::Rc;

const DEFAULT_LIBRARY_ID: LibraryId = 1;
const DEFAULT_LIBRARY_NAME: &str = "Central Library";
const DEFAULT_LIBRARY_ADDRESS: &str = "1 Book Street";

#[derive(Debug)]
pub struct Library {
    id: LibraryId,
    pub name: String,
    pub address: String,
    pub books: Vec<Shared<Book>>,
    pub librarians: Vec<Shared<Librarian>>,
}

impl Library {
    pub fn new(id: LibraryId, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            books: Vec::new(),
            librarians: Vec::new(),
        }
    }

    pub fn id(&self) -> LibraryId {
        self.id
    }

    /// Appends a book and returns the shared handle stored in the catalogue.
    pub fn add_book(&mut self, book: Book) -> Shared<Book> {
        let handle = shared(book);
        self.books.push(Rc::clone(&handle));
        handle
    }

    pub fn add_librarian(&mut self, librarian: Librarian) -> Shared<Librarian> {
        let handle = shared(librarian);
        self.librarians.push(Rc::clone(&handle));
        handle
    }

    pub fn find_book(&self, id: BookId) -> Option<Shared<Book>> {
        self.books
            .iter()
            .find(|book| book.borrow().id == id)
            .cloned()
    }

    pub fn find_librarian(&self, id: LibrarianId) -> Option<Shared<Librarian>> {
        self.librarians
            .iter()
            .find(|librarian| librarian.borrow().id == id)
            .cloned()
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::new(
            DEFAULT_LIBRARY_ID,
            DEFAULT_LIBRARY_NAME,
            DEFAULT_LIBRARY_ADDRESS,
        )
    }
}

/// Aggregate root persisted and restored by snapshots.
#[derive(Debug, Default)]
pub struct LibrarySystem {
    pub library: Library,
    pub readers: Vec<Shared<Reader>>,
    /// Canonical owner list of every loan.
    pub loans: Vec<Shared<Loan>>,
}

impl LibrarySystem {
    pub fn new(library: Library) -> Self {
        Self {
            library,
            readers: Vec::new(),
            loans: Vec::new(),
        }
    }

    pub fn add_reader(&mut self, reader: Reader) -> Shared<Reader> {
        let handle = shared(reader);
        self.readers.push(Rc::clone(&handle));
        handle
    }

    pub fn find_reader(&self, id: ReaderId) -> Option<Shared<Reader>> {
        self.readers
            .iter()
            .find(|reader| reader.borrow().id == id)
            .cloned()
    }

    pub fn find_loan(&self, id: LoanId) -> Option<Shared<Loan>> {
        self.loans
            .iter()
            .find(|loan| loan.borrow().id == id)
            .cloned()
    }

    /// Next unused loan id: one past the largest recorded id.
    ///
    /// Returns `None` once `LoanId::MAX` is taken.
    pub fn next_loan_id(&self) -> Option<LoanId> {
        match self.loans.iter().map(|loan| loan.borrow().id).max() {
            Some(max) => max.checked_add(1),
            None => Some(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.library.books.is_empty()
            && self.library.librarians.is_empty()
            && self.readers.is_empty()
            && self.loans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::LibrarySystem;
    use crate::model::{shared, Loan, LoanId, Reader};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn find_helpers_return_stored_handles() {
        let mut system = LibrarySystem::default();
        let reader = system.add_reader(Reader::new(4, "Sergey", "+79991234567"));

        let found = system.find_reader(4).unwrap();
        assert!(std::rc::Rc::ptr_eq(&reader, &found));
        assert!(system.find_reader(5).is_none());
    }

    #[test]
    fn next_loan_id_starts_at_one() {
        let system = LibrarySystem::default();
        assert_eq!(system.next_loan_id(), Some(1));
        assert!(system.is_empty());
    }

    #[test]
    fn next_loan_id_is_exhausted_at_max() {
        let mut system = LibrarySystem::default();
        let last = Loan::new(LoanId::MAX, date(2024, 1, 1), date(2024, 1, 2)).unwrap();
        system.loans.push(shared(last));
        assert_eq!(system.next_loan_id(), None);

        system.loans[0].borrow_mut().id = LoanId::MAX - 1;
        assert_eq!(system.next_loan_id(), Some(LoanId::MAX));
    }
}
