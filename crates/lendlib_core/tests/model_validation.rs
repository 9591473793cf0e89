use chrono::NaiveDate;
use lendlib_core::{Book, BookKind, BookStatus, Loan, LoanStatus, ValidationError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn negative_year_is_rejected() {
    let err = Book::fiction(10, "Bad book", "Author", -2024, "sci-fi").unwrap_err();
    assert_eq!(
        err,
        ValidationError::NonPositiveYear {
            book_id: 10,
            year: -2024
        }
    );
    assert!(err.to_string().contains("-2024"));
}

#[test]
fn year_boundaries_are_accepted() {
    for year in [1, 2024] {
        let book = Book::scientific(2, "Physics", "Author", year, "physics").unwrap();
        assert_eq!(book.year(), year);
    }
}

#[test]
fn new_book_starts_available_with_its_variant() {
    let book = Book::new(
        3,
        "Python for Beginners",
        "John Smith",
        2023,
        BookKind::Textbook {
            subject: "programming".to_string(),
        },
    )
    .unwrap();

    assert_eq!(book.status, BookStatus::Available);
    assert_eq!(book.kind.tag(), "textbook");
    assert!(book.describe().contains("subject=programming"));
}

#[test]
fn inverted_loan_period_is_rejected() {
    let err = Loan::new(1, date(2024, 1, 15), date(2024, 1, 1)).unwrap_err();
    assert_eq!(
        err,
        ValidationError::InvertedLoanPeriod {
            loan_id: 1,
            borrow_date: date(2024, 1, 15),
            return_date: date(2024, 1, 1),
        }
    );
}

#[test]
fn unassigned_loan_describes_itself() {
    let loan = Loan::new(5, date(2024, 1, 1), date(2024, 1, 15)).unwrap();
    assert_eq!(loan.status, LoanStatus::Active);

    let summary = loan.describe();
    assert!(summary.contains("book='unassigned'"), "unexpected summary: {summary}");
    assert!(summary.contains("librarian=unassigned"));
}
