//! Loan domain model.
//!
//! # Responsibility
//! - Record one lending of a book by a librarian to a reader.
//!
//! # Invariants
//! - `return_date >= borrow_date` for every constructed `Loan`.
//! - The canonical owner of a loan is `LibrarySystem::loans`; librarians and
//!   readers hold clones of the same `Shared<Loan>` handle.
//! - The librarian back-reference is weak: the librarian owns a strong handle
//!   to the loan, so a strong link back would leak the pair.

use super::validation::ValidationError;
use super::{Book, Librarian, LoanId, Shared};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Lifecycle state of a loan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// Book is out with the reader.
    #[default]
    Active,
    /// Book came back.
    Returned,
    /// Still out past `return_date`.
    Overdue,
}

impl LoanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Returned => "returned",
            Self::Overdue => "overdue",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "returned" => Some(Self::Returned),
            "overdue" => Some(Self::Overdue),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Loan {
    pub id: LoanId,
    borrow_date: NaiveDate,
    return_date: NaiveDate,
    pub status: LoanStatus,
    /// `None` until a book is assigned.
    pub book: Option<Shared<Book>>,
    /// `None` until a librarian is assigned.
    pub librarian: Option<Weak<RefCell<Librarian>>>,
}

impl Loan {
    /// Creates an active loan without book or librarian links.
    ///
    /// # Errors
    /// - `ValidationError::InvertedLoanPeriod` when `return_date < borrow_date`.
    pub fn new(
        id: LoanId,
        borrow_date: NaiveDate,
        return_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        if return_date < borrow_date {
            return Err(ValidationError::InvertedLoanPeriod {
                loan_id: id,
                borrow_date,
                return_date,
            });
        }

        Ok(Self {
            id,
            borrow_date,
            return_date,
            status: LoanStatus::Active,
            book: None,
            librarian: None,
        })
    }

    pub fn borrow_date(&self) -> NaiveDate {
        self.borrow_date
    }

    pub fn return_date(&self) -> NaiveDate {
        self.return_date
    }

    /// Links the handling librarian without taking ownership.
    pub fn set_librarian(&mut self, librarian: &Shared<Librarian>) {
        self.librarian = Some(Rc::downgrade(librarian));
    }

    /// Upgrades the librarian back-reference.
    ///
    /// Returns `None` when unassigned or when the librarian was dropped.
    pub fn librarian(&self) -> Option<Shared<Librarian>> {
        self.librarian.as_ref().and_then(Weak::upgrade)
    }

    /// One-line summary for console output.
    pub fn describe(&self) -> String {
        let book_title = self
            .book
            .as_ref()
            .map(|book| book.borrow().title.clone())
            .unwrap_or_else(|| "unassigned".to_string());
        let librarian_name = self
            .librarian()
            .map(|librarian| librarian.borrow().name.clone())
            .unwrap_or_else(|| "unassigned".to_string());
        format!(
            "loan id={} book='{}' librarian={} period={}..{} status={}",
            self.id,
            book_title,
            librarian_name,
            self.borrow_date,
            self.return_date,
            self.status.as_str()
        )
    }
}
