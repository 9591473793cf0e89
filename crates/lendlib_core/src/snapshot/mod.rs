//! Whole-graph snapshot save and load.
//!
//! # Responsibility
//! - Compose encoder + writer for save and reader + decoder for load.
//! - Select the JSON or XML projection per call.
//!
//! # Invariants
//! - Save renders the full snapshot in memory before touching the destination.
//! - Load replaces a target system only after parsing and reference
//!   resolution both succeed; a failed load leaves the target untouched.
//! - Events are metadata-only: format, entity counts, duration, error kind.

pub mod decode;
pub mod document;
pub mod encode;
pub mod error;
pub mod json;
pub mod xml;

use crate::model::LibrarySystem;
use log::{debug, error};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::time::Instant;

pub use decode::{decode_document, DanglingPolicy};
pub use document::SystemDocument;
pub use encode::encode_system;
pub use error::{
    EntityKind, FormatError, ReferentialIntegrityError, Relation, SnapshotError, SnapshotResult,
};

/// Text encoding of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Xml,
}

impl SnapshotFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }

    /// Infers the format from a `.json` / `.xml` extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?;
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }
}

/// Per-call snapshot options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Indented output when `true`.
    pub pretty: bool,
    pub dangling: DanglingPolicy,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            dangling: DanglingPolicy::FailFast,
        }
    }
}

/// Encodes `system` and writes it to `destination`.
pub fn save<W: Write>(
    system: &LibrarySystem,
    destination: W,
    format: SnapshotFormat,
) -> SnapshotResult<()> {
    save_with_options(system, destination, format, &SnapshotOptions::default())
}

/// Encodes `system` and writes it to `destination` using `options`.
///
/// # Errors
/// - `SnapshotError::Io` when the destination cannot be written.
pub fn save_with_options<W: Write>(
    system: &LibrarySystem,
    mut destination: W,
    format: SnapshotFormat,
    options: &SnapshotOptions,
) -> SnapshotResult<()> {
    let started_at = Instant::now();
    let result = render(system, format, options.pretty).and_then(|bytes| {
        destination.write_all(&bytes)?;
        destination.flush()?;
        Ok(bytes.len())
    });

    match result {
        Ok(bytes) => {
            debug!(
                "event=snapshot_save module=snapshot status=ok format={} books={} librarians={} readers={} loans={} bytes={} duration_ms={}",
                format.as_str(),
                system.library.books.len(),
                system.library.librarians.len(),
                system.readers.len(),
                system.loans.len(),
                bytes,
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event=snapshot_save module=snapshot status=error format={} duration_ms={} error_code={}",
                format.as_str(),
                started_at.elapsed().as_millis(),
                error_code(&err)
            );
            Err(err)
        }
    }
}

/// Reads and decodes a system from `source`.
pub fn load<R: Read>(source: R, format: SnapshotFormat) -> SnapshotResult<LibrarySystem> {
    load_with_options(source, format, &SnapshotOptions::default())
}

/// Reads and decodes a system from `source` using `options`.
///
/// # Errors
/// - `Io` when reading fails.
/// - `Format` when the text does not parse into a document.
/// - `Validation`, `Integrity`, `DuplicateId` from graph reconstruction.
pub fn load_with_options<R: Read>(
    mut source: R,
    format: SnapshotFormat,
    options: &SnapshotOptions,
) -> SnapshotResult<LibrarySystem> {
    let started_at = Instant::now();
    let result = read_all(&mut source).and_then(|bytes| {
        let document = parse(&bytes, format)?;
        decode_document(document, options.dangling)
    });

    match result {
        Ok(system) => {
            debug!(
                "event=snapshot_load module=snapshot status=ok format={} books={} librarians={} readers={} loans={} duration_ms={}",
                format.as_str(),
                system.library.books.len(),
                system.library.librarians.len(),
                system.readers.len(),
                system.loans.len(),
                started_at.elapsed().as_millis()
            );
            Ok(system)
        }
        Err(err) => {
            error!(
                "event=snapshot_load module=snapshot status=error format={} duration_ms={} error_code={}",
                format.as_str(),
                started_at.elapsed().as_millis(),
                error_code(&err)
            );
            Err(err)
        }
    }
}

/// Loads from `source` and replaces `target` wholesale on success.
///
/// On error `target` is left exactly as it was.
pub fn load_into<R: Read>(
    target: &mut LibrarySystem,
    source: R,
    format: SnapshotFormat,
) -> SnapshotResult<()> {
    *target = load(source, format)?;
    Ok(())
}

/// Saves to a file, creating or truncating it.
pub fn save_to_path(
    system: &LibrarySystem,
    path: impl AsRef<Path>,
    format: SnapshotFormat,
) -> SnapshotResult<()> {
    save_to_path_with_options(system, path, format, &SnapshotOptions::default())
}

/// Saves to a file using `options`.
///
/// The file is only created once the snapshot has rendered.
pub fn save_to_path_with_options(
    system: &LibrarySystem,
    path: impl AsRef<Path>,
    format: SnapshotFormat,
    options: &SnapshotOptions,
) -> SnapshotResult<()> {
    let bytes = render(system, format, options.pretty)?;
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(&bytes)?;
    file.flush()?;
    Ok(())
}

/// Loads a system from a file.
pub fn load_from_path(
    path: impl AsRef<Path>,
    format: SnapshotFormat,
) -> SnapshotResult<LibrarySystem> {
    load_from_path_with_options(path, format, &SnapshotOptions::default())
}

pub fn load_from_path_with_options(
    path: impl AsRef<Path>,
    format: SnapshotFormat,
    options: &SnapshotOptions,
) -> SnapshotResult<LibrarySystem> {
    load_with_options(File::open(path)?, format, options)
}

fn render(
    system: &LibrarySystem,
    format: SnapshotFormat,
    pretty: bool,
) -> SnapshotResult<Vec<u8>> {
    let document = encode_system(system);
    let bytes = match format {
        SnapshotFormat::Json => json::write_json(&document, pretty)?,
        SnapshotFormat::Xml => xml::write_xml(&document, pretty)?,
    };
    Ok(bytes)
}

fn parse(bytes: &[u8], format: SnapshotFormat) -> SnapshotResult<SystemDocument> {
    let document = match format {
        SnapshotFormat::Json => json::read_json(bytes)?,
        SnapshotFormat::Xml => xml::read_xml(bytes)?,
    };
    Ok(document)
}

fn read_all<R: Read>(source: &mut R) -> SnapshotResult<Vec<u8>> {
    let mut bytes = Vec::new();
    source.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn error_code(err: &SnapshotError) -> &'static str {
    match err {
        SnapshotError::Io(_) => "io",
        SnapshotError::Format(_) => "format",
        SnapshotError::Validation(_) => "validation",
        SnapshotError::Integrity(_) => "referential_integrity",
        SnapshotError::DuplicateId { .. } => "duplicate_id",
    }
}

#[cfg(test)]
mod tests {
    use super::SnapshotFormat;

    #[test]
    fn format_is_inferred_from_extension() {
        assert_eq!(
            SnapshotFormat::from_path("library_system.json"),
            Some(SnapshotFormat::Json)
        );
        assert_eq!(
            SnapshotFormat::from_path("/tmp/Library.XML"),
            Some(SnapshotFormat::Xml)
        );
        assert_eq!(SnapshotFormat::from_path("notes.txt"), None);
        assert_eq!(SnapshotFormat::from_path("no_extension"), None);
    }
}
