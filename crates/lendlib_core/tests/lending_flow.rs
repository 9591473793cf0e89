use chrono::NaiveDate;
use lendlib_core::{
    shared, Book, BookStatus, LendingError, LendingService, Librarian, LibrarySystem, Loan, LoanId,
    LoanStatus, Reader, ValidationError,
};
use std::rc::Rc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn setup() -> LibrarySystem {
    let mut system = LibrarySystem::default();
    let fiction = Book::fiction(1, "Master and Margarita", "Bulgakov", 1966, "novel").unwrap();
    let textbook =
        Book::textbook(2, "Python for Beginners", "John Smith", 2023, "programming").unwrap();
    system.library.add_book(fiction);
    system.library.add_book(textbook);
    system
        .library
        .add_librarian(Librarian::new(1, "Anna Petrova", "LIB001"));
    system.add_reader(Reader::new(1, "Sergey Ivanov", "+79991234567"));
    system
}

#[test]
fn borrow_links_one_loan_into_three_collections() {
    let mut system = setup();
    let loan = LendingService::new(&mut system)
        .borrow_book(1, 1, 1, date(2024, 1, 1), date(2024, 1, 15))
        .unwrap();

    assert_eq!(loan.borrow().id, 1);
    assert!(Rc::ptr_eq(&system.loans[0], &loan));
    assert!(Rc::ptr_eq(
        &system.library.librarians[0].borrow().managed_loans[0],
        &loan
    ));
    assert!(Rc::ptr_eq(&system.readers[0].borrow().loans[0], &loan));
    assert_eq!(system.library.books[0].borrow().status, BookStatus::Borrowed);
}

#[test]
fn loan_ids_are_allocated_system_wide() {
    let mut system = setup();
    let mut service = LendingService::new(&mut system);
    let first = service
        .borrow_book(1, 1, 1, date(2024, 1, 1), date(2024, 1, 15))
        .unwrap();
    let first_id = first.borrow().id;
    service.return_book(1, first_id).unwrap();
    let second = service
        .borrow_book(1, 2, 1, date(2024, 2, 1), date(2024, 2, 15))
        .unwrap();

    assert_eq!(first_id, 1);
    assert_eq!(second.borrow().id, 2);
}

#[test]
fn borrowed_book_cannot_be_lent_twice() {
    let mut system = setup();
    let mut service = LendingService::new(&mut system);
    service
        .borrow_book(1, 1, 1, date(2024, 1, 1), date(2024, 1, 15))
        .unwrap();

    let err = service
        .borrow_book(1, 1, 1, date(2024, 1, 2), date(2024, 1, 16))
        .unwrap_err();
    assert_eq!(err, LendingError::BookUnavailable(1));
    assert_eq!(system.loans.len(), 1);
}

#[test]
fn failed_borrow_mutates_nothing() {
    let mut system = setup();
    let mut service = LendingService::new(&mut system);

    assert_eq!(
        service
            .borrow_book(9, 1, 1, date(2024, 1, 1), date(2024, 1, 15))
            .unwrap_err(),
        LendingError::ReaderNotFound(9)
    );
    assert_eq!(
        service
            .borrow_book(1, 9, 1, date(2024, 1, 1), date(2024, 1, 15))
            .unwrap_err(),
        LendingError::BookNotFound(9)
    );
    assert_eq!(
        service
            .borrow_book(1, 1, 9, date(2024, 1, 1), date(2024, 1, 15))
            .unwrap_err(),
        LendingError::LibrarianNotFound(9)
    );
    let err = service
        .borrow_book(1, 1, 1, date(2024, 1, 15), date(2024, 1, 1))
        .unwrap_err();
    assert!(matches!(
        err,
        LendingError::Validation(ValidationError::InvertedLoanPeriod { .. })
    ));

    assert!(system.loans.is_empty());
    assert!(system.readers[0].borrow().loans.is_empty());
    assert_eq!(system.library.books[0].borrow().status, BookStatus::Available);
}

#[test]
fn return_keeps_history_and_frees_the_book() {
    let mut system = setup();
    let mut service = LendingService::new(&mut system);
    service
        .borrow_book(1, 1, 1, date(2024, 1, 1), date(2024, 1, 15))
        .unwrap();
    service.return_book(1, 1).unwrap();

    assert_eq!(
        service.return_book(1, 1).unwrap_err(),
        LendingError::LoanNotFound {
            reader_id: 1,
            loan_id: 1
        }
    );

    assert_eq!(system.loans.len(), 1);
    assert_eq!(system.loans[0].borrow().status, LoanStatus::Returned);
    assert_eq!(system.library.librarians[0].borrow().managed_loans.len(), 1);
    assert!(system.readers[0].borrow().loans.is_empty());
    assert_eq!(system.library.books[0].borrow().status, BookStatus::Available);
}

#[test]
fn overdue_marks_only_active_loans_past_due() {
    let mut system = setup();
    let mut service = LendingService::new(&mut system);
    service
        .borrow_book(1, 1, 1, date(2024, 1, 1), date(2024, 1, 15))
        .unwrap();
    service
        .borrow_book(1, 2, 1, date(2024, 1, 10), date(2024, 2, 10))
        .unwrap();

    assert_eq!(service.mark_overdue(date(2024, 1, 20)), 1);
    assert_eq!(service.mark_overdue(date(2024, 1, 20)), 0);

    assert_eq!(system.loans[0].borrow().status, LoanStatus::Overdue);
    assert_eq!(system.loans[1].borrow().status, LoanStatus::Active);
}

#[test]
fn book_referenced_by_any_loan_stays_catalogued() {
    let mut system = setup();
    let mut service = LendingService::new(&mut system);
    service
        .borrow_book(1, 1, 1, date(2024, 1, 1), date(2024, 1, 15))
        .unwrap();

    assert_eq!(
        service.remove_book(1).unwrap_err(),
        LendingError::BookOnLoan {
            book_id: 1,
            loan_id: 1
        }
    );

    service.return_book(1, 1).unwrap();
    assert_eq!(
        service.remove_book(1).unwrap_err(),
        LendingError::BookOnLoan {
            book_id: 1,
            loan_id: 1
        }
    );
    assert!(system.library.find_book(1).is_some());
}

#[test]
fn unreferenced_book_leaves_the_catalogue() {
    let mut system = setup();
    let mut service = LendingService::new(&mut system);
    service
        .borrow_book(1, 1, 1, date(2024, 1, 1), date(2024, 1, 15))
        .unwrap();

    service.remove_book(2).unwrap();
    assert_eq!(
        service.remove_book(2).unwrap_err(),
        LendingError::BookNotFound(2)
    );

    assert!(system.library.find_book(2).is_none());
    assert_eq!(system.library.books.len(), 1);
}

#[test]
fn borrowing_stops_when_loan_ids_run_out() {
    let mut system = setup();
    let last = Loan::new(LoanId::MAX, date(2023, 1, 1), date(2023, 1, 2)).unwrap();
    system.loans.push(shared(last));

    let err = LendingService::new(&mut system)
        .borrow_book(1, 1, 1, date(2024, 1, 1), date(2024, 1, 15))
        .unwrap_err();

    assert_eq!(err, LendingError::LoanIdsExhausted);
    assert_eq!(system.loans.len(), 1);
    assert!(system.readers[0].borrow().loans.is_empty());
    assert_eq!(system.library.books[0].borrow().status, BookStatus::Available);
}
