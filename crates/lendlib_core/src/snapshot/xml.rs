//! XML projection of `SystemDocument`.
//!
//! # Responsibility
//! - Write the document as an element tree rooted at `library_system`.
//! - Parse that tree back into the same document shape.
//!
//! # Invariants
//! - Scalar fields are attributes; id lists and `*_id` references are child
//!   elements with the numeric id as text.
//! - An absent `book_id` / `librarian_id` is an empty element. A missing
//!   element is a format error.
//! - The reader never fills defaults for missing attributes.

use super::document::{
    BookRecord, BookVariantRecord, LibrarianRecord, LibraryRecord, LoanRecord, ReaderRecord,
    SystemDocument,
};
use super::error::FormatError;
use crate::model::{BookStatus, LoanStatus};
use chrono::NaiveDate;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::str::FromStr;

const ROOT: &str = "library_system";
const LOAN_ID: &str = "loan_id";
const DATE_FORMAT: &str = "%Y-%m-%d";
const INDENT_WIDTH: usize = 2;

/// Renders the document as UTF-8 XML bytes with an XML declaration.
pub fn write_xml(document: &SystemDocument, pretty: bool) -> Result<Vec<u8>, FormatError> {
    let mut writer = if pretty {
        Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH)
    } else {
        Writer::new(Vec::new())
    };

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new(ROOT)))?;
    write_library(&mut writer, &document.library)?;

    writer.write_event(Event::Start(BytesStart::new("readers")))?;
    for reader in &document.readers {
        write_reader(&mut writer, reader)?;
    }
    writer.write_event(Event::End(BytesEnd::new("readers")))?;

    writer.write_event(Event::Start(BytesStart::new("loans")))?;
    for loan in &document.loans {
        write_loan(&mut writer, loan)?;
    }
    writer.write_event(Event::End(BytesEnd::new("loans")))?;

    writer.write_event(Event::End(BytesEnd::new(ROOT)))?;
    Ok(writer.into_inner())
}

/// Parses a document from XML bytes.
///
/// # Errors
/// - `FormatError::Xml` / `InvalidUtf8` for malformed syntax.
/// - Structural variants for missing or unexpected elements and attributes,
///   non-integer ids, unparsable dates and unknown enumerated values.
pub fn read_xml(bytes: &[u8]) -> Result<SystemDocument, FormatError> {
    let text = std::str::from_utf8(bytes).map_err(FormatError::InvalidUtf8)?;
    let root = parse_tree(text)?;
    if root.name != ROOT {
        return Err(FormatError::UnexpectedRoot {
            expected: ROOT,
            found: root.name,
        });
    }

    let library = root.child("library")?;
    Ok(SystemDocument {
        library: LibraryRecord {
            id: library.number_attr("id")?,
            name: library.attr("name")?.to_string(),
            address: library.attr("address")?.to_string(),
            books: library
                .child("books")?
                .items("book")?
                .map(read_book)
                .collect::<Result<_, _>>()?,
            librarians: library
                .child("librarians")?
                .items("librarian")?
                .map(read_librarian)
                .collect::<Result<_, _>>()?,
        },
        readers: root
            .child("readers")?
            .items("reader")?
            .map(read_reader)
            .collect::<Result<_, _>>()?,
        loans: root
            .child("loans")?
            .items("loan")?
            .map(read_loan)
            .collect::<Result<_, _>>()?,
    })
}

type XmlWriter = Writer<Vec<u8>>;

fn element(name: &'static str, attributes: &[(&str, &str)]) -> BytesStart<'static> {
    let mut start = BytesStart::new(name);
    for &attribute in attributes {
        start.push_attribute(attribute);
    }
    start
}

fn write_library(writer: &mut XmlWriter, library: &LibraryRecord) -> Result<(), FormatError> {
    let id = library.id.to_string();
    writer.write_event(Event::Start(element(
        "library",
        &[
            ("id", id.as_str()),
            ("name", library.name.as_str()),
            ("address", library.address.as_str()),
        ],
    )))?;

    writer.write_event(Event::Start(BytesStart::new("books")))?;
    for book in &library.books {
        write_book(writer, book)?;
    }
    writer.write_event(Event::End(BytesEnd::new("books")))?;

    writer.write_event(Event::Start(BytesStart::new("librarians")))?;
    for librarian in &library.librarians {
        write_librarian(writer, librarian)?;
    }
    writer.write_event(Event::End(BytesEnd::new("librarians")))?;

    writer.write_event(Event::End(BytesEnd::new("library")))?;
    Ok(())
}

fn write_book(writer: &mut XmlWriter, book: &BookRecord) -> Result<(), FormatError> {
    let id = book.id.to_string();
    let year = book.year.to_string();
    writer.write_event(Event::Empty(element(
        "book",
        &[
            ("id", id.as_str()),
            ("title", book.title.as_str()),
            ("author", book.author.as_str()),
            ("year", year.as_str()),
            ("status", book.status.as_str()),
            ("kind", book.variant.tag()),
            (book.variant.detail_key(), book.variant.detail()),
        ],
    )))?;
    Ok(())
}

fn write_librarian(
    writer: &mut XmlWriter,
    librarian: &LibrarianRecord,
) -> Result<(), FormatError> {
    let id = librarian.id.to_string();
    writer.write_event(Event::Start(element(
        "librarian",
        &[
            ("id", id.as_str()),
            ("name", librarian.name.as_str()),
            ("employee_id", librarian.employee_id.as_str()),
        ],
    )))?;
    write_id_list(writer, "managed_loans", &librarian.managed_loans)?;
    writer.write_event(Event::End(BytesEnd::new("librarian")))?;
    Ok(())
}

fn write_reader(writer: &mut XmlWriter, reader: &ReaderRecord) -> Result<(), FormatError> {
    let id = reader.id.to_string();
    writer.write_event(Event::Start(element(
        "reader",
        &[
            ("id", id.as_str()),
            ("full_name", reader.full_name.as_str()),
            ("phone", reader.phone.as_str()),
        ],
    )))?;
    write_id_list(writer, "loans", &reader.loans)?;
    writer.write_event(Event::End(BytesEnd::new("reader")))?;
    Ok(())
}

fn write_loan(writer: &mut XmlWriter, loan: &LoanRecord) -> Result<(), FormatError> {
    let id = loan.id.to_string();
    let borrow_date = loan.borrow_date.format(DATE_FORMAT).to_string();
    let return_date = loan.return_date.format(DATE_FORMAT).to_string();
    writer.write_event(Event::Start(element(
        "loan",
        &[
            ("id", id.as_str()),
            ("borrow_date", borrow_date.as_str()),
            ("return_date", return_date.as_str()),
            ("status", loan.status.as_str()),
        ],
    )))?;
    write_optional_id(writer, "book_id", loan.book_id)?;
    write_optional_id(writer, "librarian_id", loan.librarian_id)?;
    writer.write_event(Event::End(BytesEnd::new("loan")))?;
    Ok(())
}

fn write_id_list(
    writer: &mut XmlWriter,
    name: &'static str,
    ids: &[u32],
) -> Result<(), FormatError> {
    if ids.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(name)))?;
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new(name)))?;
    for &id in ids {
        write_optional_id(writer, LOAN_ID, Some(id))?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_optional_id(
    writer: &mut XmlWriter,
    name: &'static str,
    id: Option<u32>,
) -> Result<(), FormatError> {
    match id {
        Some(id) => {
            let text = id.to_string();
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        None => writer.write_event(Event::Empty(BytesStart::new(name)))?,
    }
    Ok(())
}

fn read_book(node: &Node) -> Result<BookRecord, FormatError> {
    let kind = node.attr("kind")?;
    let detail_key =
        BookVariantRecord::detail_key_for(kind).ok_or_else(|| FormatError::UnknownValue {
            context: "book.kind".to_string(),
            value: kind.to_string(),
        })?;
    let variant = BookVariantRecord::from_tag(kind, node.attr(detail_key)?).ok_or_else(|| {
        FormatError::UnknownValue {
            context: "book.kind".to_string(),
            value: kind.to_string(),
        }
    })?;

    Ok(BookRecord {
        id: node.number_attr("id")?,
        title: node.attr("title")?.to_string(),
        author: node.attr("author")?.to_string(),
        year: node.number_attr("year")?,
        status: node.enum_attr("status", BookStatus::parse)?,
        variant,
    })
}

fn read_librarian(node: &Node) -> Result<LibrarianRecord, FormatError> {
    Ok(LibrarianRecord {
        id: node.number_attr("id")?,
        name: node.attr("name")?.to_string(),
        employee_id: node.attr("employee_id")?.to_string(),
        managed_loans: read_id_list(node.child("managed_loans")?)?,
    })
}

fn read_reader(node: &Node) -> Result<ReaderRecord, FormatError> {
    Ok(ReaderRecord {
        id: node.number_attr("id")?,
        full_name: node.attr("full_name")?.to_string(),
        phone: node.attr("phone")?.to_string(),
        loans: read_id_list(node.child("loans")?)?,
    })
}

fn read_loan(node: &Node) -> Result<LoanRecord, FormatError> {
    Ok(LoanRecord {
        id: node.number_attr("id")?,
        borrow_date: node.date_attr("borrow_date")?,
        return_date: node.date_attr("return_date")?,
        status: node.enum_attr("status", LoanStatus::parse)?,
        book_id: node.child("book_id")?.optional_id()?,
        librarian_id: node.child("librarian_id")?.optional_id()?,
    })
}

fn read_id_list(node: &Node) -> Result<Vec<u32>, FormatError> {
    node.items(LOAN_ID)?
        .map(|item| parse_number(&item.text, &item.name))
        .collect()
}

fn parse_number<T: FromStr>(value: &str, context: &str) -> Result<T, FormatError> {
    value.parse().map_err(|_| FormatError::InvalidNumber {
        context: context.to_string(),
        value: value.to_string(),
    })
}

/// Minimal owned element tree built from quick-xml events.
#[derive(Debug, Default)]
struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
    text: String,
}

impl Node {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, FormatError> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(FormatError::InvalidUtf8)?
            .to_string();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = std::str::from_utf8(attribute.key.as_ref())
                .map_err(FormatError::InvalidUtf8)?
                .to_string();
            let value = attribute.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    fn attr(&self, name: &'static str) -> Result<&str, FormatError> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| FormatError::MissingAttribute {
                element: self.name.clone(),
                attribute: name,
            })
    }

    fn number_attr<T: FromStr>(&self, name: &'static str) -> Result<T, FormatError> {
        parse_number(self.attr(name)?, &format!("{}.{name}", self.name))
    }

    fn date_attr(&self, name: &'static str) -> Result<NaiveDate, FormatError> {
        let value = self.attr(name)?;
        NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| FormatError::InvalidDate {
            context: format!("{}.{name}", self.name),
            value: value.to_string(),
        })
    }

    fn enum_attr<T>(
        &self,
        name: &'static str,
        parse: fn(&str) -> Option<T>,
    ) -> Result<T, FormatError> {
        let value = self.attr(name)?;
        parse(value).ok_or_else(|| FormatError::UnknownValue {
            context: format!("{}.{name}", self.name),
            value: value.to_string(),
        })
    }

    /// The single child named `name`; a repeated one is rejected.
    fn child(&self, name: &'static str) -> Result<&Node, FormatError> {
        let mut matches = self.children.iter().filter(|child| child.name == name);
        let found = matches.next().ok_or_else(|| FormatError::MissingElement {
            parent: self.name.clone(),
            element: name,
        })?;
        if matches.next().is_some() {
            return Err(FormatError::UnexpectedElement {
                parent: self.name.clone(),
                element: name.to_string(),
            });
        }
        Ok(found)
    }

    /// Children of a collection element, all of which must be named `item`.
    fn items(&self, item: &'static str) -> Result<std::slice::Iter<'_, Node>, FormatError> {
        if let Some(other) = self.children.iter().find(|child| child.name != item) {
            return Err(FormatError::UnexpectedElement {
                parent: self.name.clone(),
                element: other.name.clone(),
            });
        }
        Ok(self.children.iter())
    }

    /// Empty text is the absent marker.
    fn optional_id(&self) -> Result<Option<u32>, FormatError> {
        if self.text.is_empty() {
            return Ok(None);
        }
        parse_number(&self.text, &self.name).map(Some)
    }
}

fn parse_tree(text: &str) -> Result<Node, FormatError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Node::from_start(&start)?),
            Event::Empty(start) => attach(&mut stack, &mut root, Node::from_start(&start)?)?,
            Event::End(_) => {
                if let Some(node) = stack.pop() {
                    attach(&mut stack, &mut root, node)?;
                }
            }
            Event::Text(content) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&content.unescape()?);
                }
            }
            Event::CData(content) => {
                if let Some(node) = stack.last_mut() {
                    let value = std::str::from_utf8(&content).map_err(FormatError::InvalidUtf8)?;
                    node.text.push_str(value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(FormatError::UnclosedElement(open.name));
    }
    root.ok_or_else(|| FormatError::UnexpectedRoot {
        expected: ROOT,
        found: String::new(),
    })
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<(), FormatError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(FormatError::UnexpectedElement {
            parent: ROOT.to_string(),
            element: node.name,
        });
    }
    *root = Some(node);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{read_xml, write_xml};
    use crate::snapshot::error::FormatError;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<library_system>
  <library id="1" name="Central &amp; Co" address="1 Book Street">
    <books>
      <book id="3" title="Python basics" author="John Smith" year="2023" status="borrowed" kind="textbook" subject="programming"/>
    </books>
    <librarians>
      <librarian id="1" name="Anna" employee_id="LIB001">
        <managed_loans><loan_id>1</loan_id></managed_loans>
      </librarian>
    </librarians>
  </library>
  <readers>
    <reader id="1" full_name="Sergey" phone="+79991234567">
      <loans><loan_id>1</loan_id></loans>
    </reader>
  </readers>
  <loans>
    <loan id="1" borrow_date="2024-01-01" return_date="2024-01-15" status="active">
      <book_id>3</book_id>
      <librarian_id/>
    </loan>
  </loans>
</library_system>
"#;

    #[test]
    fn reads_attributes_and_id_children() {
        let document = read_xml(SAMPLE.as_bytes()).unwrap();
        assert_eq!(document.library.name, "Central & Co");
        assert_eq!(document.library.books[0].variant.detail(), "programming");
        assert_eq!(document.library.librarians[0].managed_loans, vec![1]);
        assert_eq!(document.readers[0].loans, vec![1]);
        assert_eq!(document.loans[0].book_id, Some(3));
        assert_eq!(document.loans[0].librarian_id, None);
    }

    #[test]
    fn rewritten_document_parses_to_same_shape() {
        let document = read_xml(SAMPLE.as_bytes()).unwrap();
        for pretty in [true, false] {
            let bytes = write_xml(&document, pretty).unwrap();
            assert_eq!(read_xml(&bytes).unwrap(), document);
        }
    }

    #[test]
    fn absent_reference_is_an_empty_element() {
        let document = read_xml(SAMPLE.as_bytes()).unwrap();
        let text = String::from_utf8(write_xml(&document, false).unwrap()).unwrap();
        assert!(text.contains("<librarian_id/>"), "unexpected xml: {text}");
        assert!(text.contains("<book_id>3</book_id>"));
    }

    #[test]
    fn missing_attribute_is_rejected() {
        let broken = SAMPLE.replace(r#" phone="+79991234567""#, "");
        let err = read_xml(broken.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            FormatError::MissingAttribute { attribute: "phone", .. }
        ));
    }

    #[test]
    fn missing_reference_element_is_rejected() {
        let broken = SAMPLE.replace("<librarian_id/>", "");
        let err = read_xml(broken.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            FormatError::MissingElement { element: "librarian_id", .. }
        ));
    }

    #[test]
    fn repeated_reference_element_is_rejected() {
        let broken = SAMPLE.replace(
            "<book_id>3</book_id>",
            "<book_id>3</book_id><book_id>4</book_id>",
        );
        let err = read_xml(broken.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            FormatError::UnexpectedElement { ref parent, ref element }
                if parent == "loan" && element == "book_id"
        ));
    }

    #[test]
    fn repeated_collection_element_is_rejected() {
        let broken = SAMPLE.replace("<readers>", "<readers/>\n  <readers>");
        let err = read_xml(broken.as_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::UnexpectedElement { .. }));
    }

    #[test]
    fn non_integer_id_is_rejected() {
        let broken = SAMPLE.replace("<book_id>3</book_id>", "<book_id>three</book_id>");
        let err = read_xml(broken.as_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::InvalidNumber { .. }));
    }

    #[test]
    fn unparsable_date_is_rejected() {
        let broken = SAMPLE.replace("2024-01-15", "15.01.2024");
        let err = read_xml(broken.as_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::InvalidDate { .. }));
    }

    #[test]
    fn unknown_book_kind_is_rejected() {
        let broken = SAMPLE.replace(r#"kind="textbook""#, r#"kind="comic""#);
        let err = read_xml(broken.as_bytes()).unwrap_err();
        assert!(matches!(err, FormatError::UnknownValue { .. }));
    }

    #[test]
    fn wrong_root_is_rejected() {
        let err = read_xml(b"<catalogue/>").unwrap_err();
        assert!(matches!(err, FormatError::UnexpectedRoot { .. }));
    }
}
