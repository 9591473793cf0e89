//! Snapshot error taxonomy.
//!
//! # Invariants
//! - Every kind is fatal to the save/load call that raised it.
//! - I/O errors are carried unchanged.

use crate::model::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Malformed encoding at the syntax level.
#[derive(Debug)]
pub enum FormatError {
    Json(serde_json::Error),
    Xml(quick_xml::Error),
    InvalidUtf8(std::str::Utf8Error),
    UnexpectedRoot { expected: &'static str, found: String },
    MissingElement { parent: String, element: &'static str },
    UnexpectedElement { parent: String, element: String },
    UnclosedElement(String),
    MissingAttribute { element: String, attribute: &'static str },
    InvalidNumber { context: String, value: String },
    InvalidDate { context: String, value: String },
    UnknownValue { context: String, value: String },
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "malformed JSON snapshot: {err}"),
            Self::Xml(err) => write!(f, "malformed XML snapshot: {err}"),
            Self::InvalidUtf8(err) => write!(f, "snapshot is not valid UTF-8: {err}"),
            Self::UnexpectedRoot { expected, found } => {
                write!(f, "expected root element `{expected}`, found `{found}`")
            }
            Self::MissingElement { parent, element } => {
                write!(f, "missing required element `{element}` in `{parent}`")
            }
            Self::UnexpectedElement { parent, element } => {
                write!(f, "unexpected element `{element}` in `{parent}`")
            }
            Self::UnclosedElement(element) => {
                write!(f, "document ended inside element `{element}`")
            }
            Self::MissingAttribute { element, attribute } => {
                write!(f, "missing required attribute `{attribute}` on `{element}`")
            }
            Self::InvalidNumber { context, value } => {
                write!(f, "expected integer for {context}, got `{value}`")
            }
            Self::InvalidDate { context, value } => {
                write!(f, "expected ISO-8601 date for {context}, got `{value}`")
            }
            Self::UnknownValue { context, value } => {
                write!(f, "unknown value `{value}` for {context}")
            }
        }
    }
}

impl Error for FormatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Xml(err) => Some(err),
            Self::InvalidUtf8(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FormatError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<quick_xml::Error> for FormatError {
    fn from(value: quick_xml::Error) -> Self {
        Self::Xml(value)
    }
}

impl From<quick_xml::events::attributes::AttrError> for FormatError {
    fn from(value: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(value.into())
    }
}

/// Id-based relation that a reference travels along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// `loan.book_id`
    LoanBook,
    /// `loan.librarian_id`
    LoanLibrarian,
    /// `librarian.managed_loans[]`
    LibrarianLoans,
    /// `reader.loans[]`
    ReaderLoans,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoanBook => "loan.book_id",
            Self::LoanLibrarian => "loan.librarian_id",
            Self::LibrarianLoans => "librarian.managed_loans",
            Self::ReaderLoans => "reader.loans",
        }
    }

    /// Entity kind that owns the reference.
    pub fn referrer_kind(self) -> EntityKind {
        match self {
            Self::LoanBook | Self::LoanLibrarian => EntityKind::Loan,
            Self::LibrarianLoans => EntityKind::Librarian,
            Self::ReaderLoans => EntityKind::Reader,
        }
    }

    /// Entity kind the reference must resolve to.
    pub fn target_kind(self) -> EntityKind {
        match self {
            Self::LoanBook => EntityKind::Book,
            Self::LoanLibrarian => EntityKind::Librarian,
            Self::LibrarianLoans | Self::ReaderLoans => EntityKind::Loan,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Book,
    Librarian,
    Reader,
    Loan,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Librarian => "librarian",
            Self::Reader => "reader",
            Self::Loan => "loan",
        }
    }
}

/// A reference id with no matching entity in the same document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferentialIntegrityError {
    pub relation: Relation,
    /// The id that failed to resolve.
    pub referenced_id: u32,
    /// Id of the entity holding the reference.
    pub referrer_id: u32,
}

impl Display for ReferentialIntegrityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "dangling reference: {} {} refers to missing {} {} via `{}`",
            self.relation.referrer_kind().as_str(),
            self.referrer_id,
            self.relation.target_kind().as_str(),
            self.referenced_id,
            self.relation.as_str()
        )
    }
}

impl Error for ReferentialIntegrityError {}

/// Failure of one snapshot save or load call.
#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Format(FormatError),
    Validation(ValidationError),
    Integrity(ReferentialIntegrityError),
    /// Two entities of one kind share an id, so references are ambiguous.
    DuplicateId { entity: EntityKind, id: u32 },
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "snapshot I/O failed: {err}"),
            Self::Format(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Integrity(err) => write!(f, "{err}"),
            Self::DuplicateId { entity, id } => {
                write!(f, "duplicate {} id {id} in snapshot", entity.as_str())
            }
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Format(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Integrity(err) => Some(err),
            Self::DuplicateId { .. } => None,
        }
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<FormatError> for SnapshotError {
    fn from(value: FormatError) -> Self {
        Self::Format(value)
    }
}

impl From<ValidationError> for SnapshotError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ReferentialIntegrityError> for SnapshotError {
    fn from(value: ReferentialIntegrityError) -> Self {
        Self::Integrity(value)
    }
}
