//! Book domain model.
//!
//! # Responsibility
//! - Define the shared book record and its three catalogue variants.
//! - Validate publication year at construction.
//!
//! # Invariants
//! - `year` is always positive for a constructed `Book`.
//! - Each variant carries exactly one extra attribute.

use super::validation::ValidationError;
use super::BookId;
use serde::{Deserialize, Serialize};

/// Circulation state of a book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    /// On the shelf.
    #[default]
    Available,
    /// Handed out to a reader.
    Borrowed,
}

impl BookStatus {
    /// Wire name used by both snapshot formats.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Borrowed => "borrowed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(Self::Available),
            "borrowed" => Some(Self::Borrowed),
            _ => None,
        }
    }
}

/// Catalogue variant of a book, each with its variant-specific attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookKind {
    Fiction { genre: String },
    Scientific { field: String },
    Textbook { subject: String },
}

impl BookKind {
    /// Variant tag written as `kind` in snapshots.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Fiction { .. } => "fiction",
            Self::Scientific { .. } => "scientific",
            Self::Textbook { .. } => "textbook",
        }
    }

    /// Name of the variant-specific attribute.
    pub fn detail_key(&self) -> &'static str {
        match self {
            Self::Fiction { .. } => "genre",
            Self::Scientific { .. } => "field",
            Self::Textbook { .. } => "subject",
        }
    }

    /// Value of the variant-specific attribute.
    pub fn detail(&self) -> &str {
        match self {
            Self::Fiction { genre } => genre,
            Self::Scientific { field } => field,
            Self::Textbook { subject } => subject,
        }
    }
}

/// Catalogued book owned by the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    year: i32,
    pub status: BookStatus,
    pub kind: BookKind,
}

impl Book {
    /// Creates an available book.
    ///
    /// # Errors
    /// - `ValidationError::NonPositiveYear` when `year <= 0`.
    pub fn new(
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        year: i32,
        kind: BookKind,
    ) -> Result<Self, ValidationError> {
        if year <= 0 {
            return Err(ValidationError::NonPositiveYear { book_id: id, year });
        }

        Ok(Self {
            id,
            title: title.into(),
            author: author.into(),
            year,
            status: BookStatus::Available,
            kind,
        })
    }

    pub fn fiction(
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        year: i32,
        genre: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::new(
            id,
            title,
            author,
            year,
            BookKind::Fiction {
                genre: genre.into(),
            },
        )
    }

    pub fn scientific(
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        year: i32,
        field: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::new(
            id,
            title,
            author,
            year,
            BookKind::Scientific {
                field: field.into(),
            },
        )
    }

    pub fn textbook(
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        year: i32,
        subject: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::new(
            id,
            title,
            author,
            year,
            BookKind::Textbook {
                subject: subject.into(),
            },
        )
    }

    /// Publication year, always positive.
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn is_available(&self) -> bool {
        self.status == BookStatus::Available
    }

    /// Marks the book as handed out.
    ///
    /// Returns `false` and leaves the status untouched when the book is
    /// already borrowed.
    pub fn mark_borrowed(&mut self) -> bool {
        if !self.is_available() {
            return false;
        }
        self.status = BookStatus::Borrowed;
        true
    }

    /// Puts the book back on the shelf.
    pub fn mark_returned(&mut self) {
        self.status = BookStatus::Available;
    }

    /// One-line summary for console output.
    pub fn describe(&self) -> String {
        format!(
            "book id={} title='{}' author={} year={} kind={} {}={} status={}",
            self.id,
            self.title,
            self.author,
            self.year,
            self.kind.tag(),
            self.kind.detail_key(),
            self.kind.detail(),
            self.status.as_str()
        )
    }
}
