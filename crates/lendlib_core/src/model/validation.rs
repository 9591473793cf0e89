//! Construction-time validation errors for domain entities.
//!
//! # Invariants
//! - Entities reject malformed values when built, never later.
//! - Snapshot decoding propagates these errors unchanged.

use super::{BookId, LoanId};
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Malformed domain value detected while constructing an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Publication year must be a positive integer.
    NonPositiveYear { book_id: BookId, year: i32 },
    /// A loan cannot be due before it starts.
    InvertedLoanPeriod {
        loan_id: LoanId,
        borrow_date: NaiveDate,
        return_date: NaiveDate,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveYear { book_id, year } => write!(
                f,
                "book {book_id}: publication year must be positive, got {year}"
            ),
            Self::InvertedLoanPeriod {
                loan_id,
                borrow_date,
                return_date,
            } => write!(
                f,
                "loan {loan_id}: return_date ({return_date}) must be >= borrow_date ({borrow_date})"
            ),
        }
    }
}

impl Error for ValidationError {}
