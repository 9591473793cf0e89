//! Core of the lending-library system.
//! Owns the entity graph and its JSON/XML snapshot persistence.

pub mod logging;
pub mod model;
pub mod service;
pub mod snapshot;

pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::{
    shared, Book, BookId, BookKind, BookStatus, Librarian, LibrarianId, Library, LibraryId,
    LibrarySystem, Loan, LoanId, LoanStatus, Reader, ReaderId, Shared, ValidationError,
};
pub use service::lending_service::{LendingError, LendingResult, LendingService};
pub use snapshot::{
    load, load_from_path, load_from_path_with_options, load_into, load_with_options, save,
    save_to_path, save_to_path_with_options, save_with_options, DanglingPolicy, FormatError,
    ReferentialIntegrityError, Relation, SnapshotError, SnapshotFormat, SnapshotOptions,
    SnapshotResult,
};

/// Minimal health-check API for CLI wiring.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
