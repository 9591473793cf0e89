//! JSON projection of `SystemDocument`.
//!
//! # Invariants
//! - Keys and sequence order follow the document exactly.
//! - Absent back-references are written as `null`, never omitted.

use super::document::SystemDocument;
use super::error::FormatError;

/// Renders the document as UTF-8 JSON bytes.
pub fn write_json(document: &SystemDocument, pretty: bool) -> Result<Vec<u8>, FormatError> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(document)?
    } else {
        serde_json::to_vec(document)?
    };
    Ok(bytes)
}

/// Parses a document from JSON bytes.
///
/// # Errors
/// - `FormatError::Json` for malformed syntax, missing keys, non-integer ids,
///   unknown status/kind values or unparsable dates.
pub fn read_json(bytes: &[u8]) -> Result<SystemDocument, FormatError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::{read_json, write_json};
    use crate::snapshot::document::BookVariantRecord;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "library": {
                "id": 1,
                "name": "Central",
                "address": "1 Book Street",
                "books": [{
                    "id": 2,
                    "title": "Brief history",
                    "author": "Hawking",
                    "year": 1988,
                    "status": "available",
                    "kind": "scientific",
                    "field": "physics"
                }],
                "librarians": [{
                    "id": 1,
                    "name": "Anna",
                    "employee_id": "LIB001",
                    "managed_loans": [3]
                }]
            },
            "readers": [{
                "id": 1,
                "full_name": "Sergey",
                "phone": "+79991234567",
                "loans": [3]
            }],
            "loans": [{
                "id": 3,
                "borrow_date": "2024-01-01",
                "return_date": "2024-01-15",
                "status": "active",
                "book_id": 2,
                "librarian_id": null
            }]
        })
    }

    fn bytes(value: &serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    #[test]
    fn reads_variant_tag_and_null_marker() {
        let document = read_json(&bytes(&sample())).unwrap();
        assert_eq!(
            document.library.books[0].variant,
            BookVariantRecord::Scientific {
                field: "physics".to_string()
            }
        );
        assert_eq!(document.loans[0].book_id, Some(2));
        assert_eq!(document.loans[0].librarian_id, None);
    }

    #[test]
    fn writes_null_instead_of_omitting_absent_reference() {
        let document = read_json(&bytes(&sample())).unwrap();
        let written: serde_json::Value =
            serde_json::from_slice(&write_json(&document, false).unwrap()).unwrap();

        let loan = &written["loans"][0];
        assert!(loan.as_object().unwrap().contains_key("librarian_id"));
        assert!(loan["librarian_id"].is_null());
        assert_eq!(loan["borrow_date"], "2024-01-01");
        assert_eq!(written["library"]["books"][0]["kind"], "scientific");
    }

    #[test]
    fn missing_reference_key_is_rejected() {
        let mut value = sample();
        value["loans"][0]
            .as_object_mut()
            .unwrap()
            .remove("librarian_id");

        let err = read_json(&bytes(&value)).unwrap_err();
        assert!(err.to_string().contains("librarian_id"), "unexpected error: {err}");
    }

    #[test]
    fn non_integer_id_is_rejected() {
        let mut value = sample();
        value["readers"][0]["loans"] = json!(["three"]);
        assert!(read_json(&bytes(&value)).is_err());
    }

    #[test]
    fn unparsable_date_is_rejected() {
        let mut value = sample();
        value["loans"][0]["return_date"] = json!("15/01/2024");
        assert!(read_json(&bytes(&value)).is_err());
    }

    #[test]
    fn missing_required_field_is_not_defaulted() {
        let mut value = sample();
        value["library"]["books"][0]
            .as_object_mut()
            .unwrap()
            .remove("year");
        assert!(read_json(&bytes(&value)).is_err());
    }
}
