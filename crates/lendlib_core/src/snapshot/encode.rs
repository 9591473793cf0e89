//! Graph encoder: live entity graph -> `SystemDocument`.
//!
//! # Responsibility
//! - Walk the system read-only and flatten shared loans into ids.
//!
//! # Invariants
//! - Loan records are emitted once, from `system.loans`, in list order.
//! - Librarian/reader loan collections become id sequences.
//! - Unassigned or dropped back-references encode as `None`.

use super::document::{
    BookRecord, BookVariantRecord, LibrarianRecord, LibraryRecord, LoanRecord, ReaderRecord,
    SystemDocument,
};
use crate::model::{Book, BookKind, Librarian, LibrarySystem, Loan, Reader};

/// Encodes the whole system into its intermediate document.
pub fn encode_system(system: &LibrarySystem) -> SystemDocument {
    let library = &system.library;
    SystemDocument {
        library: LibraryRecord {
            id: library.id(),
            name: library.name.clone(),
            address: library.address.clone(),
            books: library
                .books
                .iter()
                .map(|book| encode_book(&book.borrow()))
                .collect(),
            librarians: library
                .librarians
                .iter()
                .map(|librarian| encode_librarian(&librarian.borrow()))
                .collect(),
        },
        readers: system
            .readers
            .iter()
            .map(|reader| encode_reader(&reader.borrow()))
            .collect(),
        loans: system
            .loans
            .iter()
            .map(|loan| encode_loan(&loan.borrow()))
            .collect(),
    }
}

fn encode_book(book: &Book) -> BookRecord {
    let variant = match &book.kind {
        BookKind::Fiction { genre } => BookVariantRecord::Fiction {
            genre: genre.clone(),
        },
        BookKind::Scientific { field } => BookVariantRecord::Scientific {
            field: field.clone(),
        },
        BookKind::Textbook { subject } => BookVariantRecord::Textbook {
            subject: subject.clone(),
        },
    };

    BookRecord {
        id: book.id,
        title: book.title.clone(),
        author: book.author.clone(),
        year: book.year(),
        status: book.status,
        variant,
    }
}

fn encode_librarian(librarian: &Librarian) -> LibrarianRecord {
    LibrarianRecord {
        id: librarian.id,
        name: librarian.name.clone(),
        employee_id: librarian.employee_id.clone(),
        managed_loans: librarian.managed_loan_ids(),
    }
}

fn encode_reader(reader: &Reader) -> ReaderRecord {
    ReaderRecord {
        id: reader.id,
        full_name: reader.full_name.clone(),
        phone: reader.phone.clone(),
        loans: reader.loan_ids(),
    }
}

fn encode_loan(loan: &Loan) -> LoanRecord {
    LoanRecord {
        id: loan.id,
        borrow_date: loan.borrow_date(),
        return_date: loan.return_date(),
        status: loan.status,
        book_id: loan.book.as_ref().map(|book| book.borrow().id),
        librarian_id: loan.librarian().map(|librarian| librarian.borrow().id),
    }
}

#[cfg(test)]
mod tests {
    use super::encode_system;
    use crate::model::{Book, Librarian, LibrarySystem, LoanStatus, Reader};
    use crate::service::lending_service::LendingService;
    use crate::snapshot::document::BookVariantRecord;
    use chrono::NaiveDate;

    #[test]
    fn shared_loan_is_written_once_and_referenced_by_id() {
        let mut system = LibrarySystem::default();
        system
            .library
            .add_book(Book::fiction(1, "Master", "Bulgakov", 1966, "novel").unwrap());
        system
            .library
            .add_librarian(Librarian::new(1, "Anna", "LIB001"));
        system.add_reader(Reader::new(1, "Sergey", "+79991234567"));
        LendingService::new(&mut system)
            .borrow_book(
                1,
                1,
                1,
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            )
            .unwrap();

        let document = encode_system(&system);

        assert_eq!(document.loans.len(), 1);
        assert_eq!(document.loans[0].book_id, Some(1));
        assert_eq!(document.loans[0].librarian_id, Some(1));
        assert_eq!(document.loans[0].status, LoanStatus::Active);
        assert_eq!(document.library.librarians[0].managed_loans, vec![1]);
        assert_eq!(document.readers[0].loans, vec![1]);
        assert_eq!(
            document.library.books[0].variant,
            BookVariantRecord::Fiction {
                genre: "novel".to_string()
            }
        );
    }

    #[test]
    fn empty_system_encodes_empty_sequences() {
        let document = encode_system(&LibrarySystem::default());
        assert!(document.library.books.is_empty());
        assert!(document.library.librarians.is_empty());
        assert!(document.readers.is_empty());
        assert!(document.loans.is_empty());
    }
}
