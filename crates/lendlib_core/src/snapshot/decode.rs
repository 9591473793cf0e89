//! Graph decoder: `SystemDocument` -> live entity graph.
//!
//! # Responsibility
//! - Materialize every entity exactly once.
//! - Re-link id references into shared handles.
//!
//! # Invariants
//! - Books are built first, then every loan, then librarians and readers.
//! - Librarian/reader loan entries are clones of the handle built from the
//!   top-level loan list, never fresh loans.
//! - `loan.librarian_id` is linked after librarians exist.
//! - The result is assembled in fresh local structures; nothing outside this
//!   module observes a partially decoded graph.

use super::document::{BookRecord, BookVariantRecord, SystemDocument};
use super::error::{EntityKind, ReferentialIntegrityError, Relation, SnapshotError, SnapshotResult};
use crate::model::{
    shared, Book, BookKind, Librarian, LibrarianId, Library, LibrarySystem, Loan, LoanId, Reader,
    Shared,
};
use log::warn;
use std::collections::HashMap;
use std::rc::Rc;

/// What the decoder does with a reference id that resolves to nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DanglingPolicy {
    /// Abort the load with `SnapshotError::Integrity`.
    #[default]
    FailFast,
    /// Drop the reference, log a warning and continue.
    Skip,
}

/// Rebuilds the entity graph described by `document`.
///
/// # Errors
/// - `Validation` when a record violates an entity constructor invariant.
/// - `Integrity` when a reference is dangling and the policy is `FailFast`.
/// - `DuplicateId` when two entities of one kind share an id.
pub fn decode_document(
    document: SystemDocument,
    policy: DanglingPolicy,
) -> SnapshotResult<LibrarySystem> {
    let SystemDocument {
        library: library_record,
        readers: reader_records,
        loans: loan_records,
    } = document;

    let mut library = Library::new(
        library_record.id,
        library_record.name,
        library_record.address,
    );

    let mut books_by_id = HashMap::with_capacity(library_record.books.len());
    for record in library_record.books {
        let id = record.id;
        let book = library.add_book(decode_book(record)?);
        index_unique(&mut books_by_id, EntityKind::Book, id, book)?;
    }

    let mut loans = Vec::with_capacity(loan_records.len());
    let mut loans_by_id = HashMap::with_capacity(loan_records.len());
    let mut pending_librarians: Vec<(Shared<Loan>, LibrarianId)> = Vec::new();
    for record in loan_records {
        let mut loan = Loan::new(record.id, record.borrow_date, record.return_date)?;
        loan.status = record.status;
        if let Some(book_id) = record.book_id {
            loan.book = resolve(&books_by_id, book_id, Relation::LoanBook, record.id, policy)?;
        }

        let loan = shared(loan);
        if let Some(librarian_id) = record.librarian_id {
            pending_librarians.push((Rc::clone(&loan), librarian_id));
        }
        index_unique(&mut loans_by_id, EntityKind::Loan, record.id, Rc::clone(&loan))?;
        loans.push(loan);
    }

    let mut librarians_by_id = HashMap::with_capacity(library_record.librarians.len());
    for record in library_record.librarians {
        let mut librarian = Librarian::new(record.id, record.name, record.employee_id);
        librarian.managed_loans = resolve_loans(
            &loans_by_id,
            &record.managed_loans,
            Relation::LibrarianLoans,
            record.id,
            policy,
        )?;
        let librarian = library.add_librarian(librarian);
        index_unique(&mut librarians_by_id, EntityKind::Librarian, record.id, librarian)?;
    }

    for (loan, librarian_id) in pending_librarians {
        let loan_id = loan.borrow().id;
        if let Some(librarian) = resolve(
            &librarians_by_id,
            librarian_id,
            Relation::LoanLibrarian,
            loan_id,
            policy,
        )? {
            loan.borrow_mut().set_librarian(&librarian);
        }
    }

    let mut system = LibrarySystem::new(library);
    let mut reader_ids = HashMap::with_capacity(reader_records.len());
    for record in reader_records {
        let mut reader = Reader::new(record.id, record.full_name, record.phone);
        reader.loans = resolve_loans(
            &loans_by_id,
            &record.loans,
            Relation::ReaderLoans,
            record.id,
            policy,
        )?;
        let reader = system.add_reader(reader);
        index_unique(&mut reader_ids, EntityKind::Reader, record.id, reader)?;
    }
    system.loans = loans;

    Ok(system)
}

fn decode_book(record: BookRecord) -> SnapshotResult<Book> {
    let kind = match record.variant {
        BookVariantRecord::Fiction { genre } => BookKind::Fiction { genre },
        BookVariantRecord::Scientific { field } => BookKind::Scientific { field },
        BookVariantRecord::Textbook { subject } => BookKind::Textbook { subject },
    };
    let mut book = Book::new(record.id, record.title, record.author, record.year, kind)?;
    book.status = record.status;
    Ok(book)
}

fn index_unique<T>(
    index: &mut HashMap<u32, Shared<T>>,
    entity: EntityKind,
    id: u32,
    handle: Shared<T>,
) -> SnapshotResult<()> {
    if index.insert(id, handle).is_some() {
        return Err(SnapshotError::DuplicateId { entity, id });
    }
    Ok(())
}

fn resolve<T>(
    index: &HashMap<u32, Shared<T>>,
    id: u32,
    relation: Relation,
    referrer_id: u32,
    policy: DanglingPolicy,
) -> SnapshotResult<Option<Shared<T>>> {
    if let Some(handle) = index.get(&id) {
        return Ok(Some(Rc::clone(handle)));
    }

    let err = ReferentialIntegrityError {
        relation,
        referenced_id: id,
        referrer_id,
    };
    match policy {
        DanglingPolicy::FailFast => Err(err.into()),
        DanglingPolicy::Skip => {
            warn!(
                "event=snapshot_decode module=snapshot status=warn relation={} referrer_id={} missing_id={} action=skip",
                relation.as_str(),
                referrer_id,
                id
            );
            Ok(None)
        }
    }
}

fn resolve_loans(
    loans_by_id: &HashMap<LoanId, Shared<Loan>>,
    ids: &[LoanId],
    relation: Relation,
    referrer_id: u32,
    policy: DanglingPolicy,
) -> SnapshotResult<Vec<Shared<Loan>>> {
    let mut resolved = Vec::with_capacity(ids.len());
    for &loan_id in ids {
        if let Some(loan) = resolve(loans_by_id, loan_id, relation, referrer_id, policy)? {
            resolved.push(loan);
        }
    }
    Ok(resolved)
}
