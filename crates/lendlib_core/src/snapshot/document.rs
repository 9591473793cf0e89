//! Format-agnostic snapshot document.
//!
//! # Responsibility
//! - Describe the intermediate shape produced by the encoder, consumed by the
//!   decoder, and projected by both format writers and readers.
//!
//! # Invariants
//! - Full loan data appears only in `SystemDocument::loans`.
//! - Librarians and readers reference loans by id only.
//! - `book_id` / `librarian_id` are required keys; `None` is the explicit
//!   absent marker and is written as JSON `null` or an empty XML element.

use crate::model::{BookId, BookStatus, LibrarianId, LibraryId, LoanId, LoanStatus, ReaderId};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemDocument {
    pub library: LibraryRecord,
    pub readers: Vec<ReaderRecord>,
    pub loans: Vec<LoanRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRecord {
    pub id: LibraryId,
    pub name: String,
    pub address: String,
    pub books: Vec<BookRecord>,
    pub librarians: Vec<LibrarianRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub year: i32,
    pub status: BookStatus,
    /// Written inline as `kind` plus the variant attribute.
    #[serde(flatten)]
    pub variant: BookVariantRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookVariantRecord {
    Fiction { genre: String },
    Scientific { field: String },
    Textbook { subject: String },
}

impl BookVariantRecord {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Fiction { .. } => "fiction",
            Self::Scientific { .. } => "scientific",
            Self::Textbook { .. } => "textbook",
        }
    }

    /// Attribute name carried by the variant.
    pub fn detail_key(&self) -> &'static str {
        match self {
            Self::Fiction { .. } => "genre",
            Self::Scientific { .. } => "field",
            Self::Textbook { .. } => "subject",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::Fiction { genre } => genre,
            Self::Scientific { field } => field,
            Self::Textbook { subject } => subject,
        }
    }

    /// Builds a variant from its tag and attribute value.
    ///
    /// Returns `None` for an unknown tag.
    pub fn from_tag(tag: &str, detail: impl Into<String>) -> Option<Self> {
        let detail = detail.into();
        match tag {
            "fiction" => Some(Self::Fiction { genre: detail }),
            "scientific" => Some(Self::Scientific { field: detail }),
            "textbook" => Some(Self::Textbook { subject: detail }),
            _ => None,
        }
    }

    /// Attribute name expected for `tag`, or `None` for an unknown tag.
    pub fn detail_key_for(tag: &str) -> Option<&'static str> {
        match tag {
            "fiction" => Some("genre"),
            "scientific" => Some("field"),
            "textbook" => Some("subject"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarianRecord {
    pub id: LibrarianId,
    pub name: String,
    pub employee_id: String,
    pub managed_loans: Vec<LoanId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderRecord {
    pub id: ReaderId,
    pub full_name: String,
    pub phone: String,
    pub loans: Vec<LoanId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: LoanId,
    /// ISO-8601 calendar date (`YYYY-MM-DD`).
    pub borrow_date: NaiveDate,
    pub return_date: NaiveDate,
    pub status: LoanStatus,
    #[serde(deserialize_with = "required_nullable")]
    pub book_id: Option<BookId>,
    #[serde(deserialize_with = "required_nullable")]
    pub librarian_id: Option<LibrarianId>,
}

/// Deserializes an `Option` whose key must be present.
///
/// Plain `Option` fields treat a missing key as `None`; routing through
/// `deserialize_with` makes serde report the missing key instead.
fn required_nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}
