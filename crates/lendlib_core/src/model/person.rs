//! Person roles: librarians and readers.
//!
//! # Invariants
//! - Loan collections hold handles into `LibrarySystem::loans`, never copies.

use super::{LibrarianId, Loan, LoanId, ReaderId, Shared};

/// Staff member who hands out loans.
#[derive(Debug)]
pub struct Librarian {
    pub id: LibrarianId,
    pub name: String,
    pub employee_id: String,
    /// Loans this librarian handled, in the order they were recorded.
    pub managed_loans: Vec<Shared<Loan>>,
}

impl Librarian {
    pub fn new(id: LibrarianId, name: impl Into<String>, employee_id: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            employee_id: employee_id.into(),
            managed_loans: Vec::new(),
        }
    }

    pub fn managed_loan_ids(&self) -> Vec<LoanId> {
        loan_ids(&self.managed_loans)
    }
}

/// Library patron.
#[derive(Debug)]
pub struct Reader {
    pub id: ReaderId,
    pub full_name: String,
    pub phone: String,
    /// Loans the reader currently holds.
    pub loans: Vec<Shared<Loan>>,
}

impl Reader {
    pub fn new(id: ReaderId, full_name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            phone: phone.into(),
            loans: Vec::new(),
        }
    }

    pub fn loan_ids(&self) -> Vec<LoanId> {
        loan_ids(&self.loans)
    }
}

fn loan_ids(loans: &[Shared<Loan>]) -> Vec<LoanId> {
    loans.iter().map(|loan| loan.borrow().id).collect()
}
