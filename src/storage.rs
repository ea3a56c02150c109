//! Whole-document JSON persistence. The document shape is the external
//! contract: `{"name": ..., "books": [...]}` with every date rendered as a
//! "YYYY-MM-DD" string. Reading classifies failures into two distinct
//! errors (`CorruptDocument` when the file does not parse as that structure,
//! `Schema` when a book record lacks its required title or author) and never
//! partially applies a broken document.

use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde_json::{json, Map, Value};

use crate::error::{LibraryError, Result};
use crate::library::DEFAULT_LIBRARY_NAME;
use crate::models::Book;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".personal-library-manager";
/// Document file name stored inside the application data directory.
const DOCUMENT_FILE_NAME: &str = "library.json";

/// A fully parsed persisted document.
#[derive(Debug)]
pub struct Document {
    pub name: String,
    pub books: Vec<Book>,
}

/// Resolve the default document path inside the user's home. `None` when no
/// home directory can be located.
pub fn default_document_path() -> Option<PathBuf> {
    let base_dirs = BaseDirs::new()?;
    Some(
        base_dirs
            .home_dir()
            .join(DATA_DIR_NAME)
            .join(DOCUMENT_FILE_NAME),
    )
}

/// Read and validate the document at `path`. Returns `Ok(None)` when the file
/// does not exist, so a fresh setup is not an error.
pub fn read_document(path: &Path) -> Result<Option<Document>> {
    if !path.exists() {
        return Ok(None);
    }

    let text = fs::read_to_string(path)?;
    parse_document(&text).map(Some)
}

/// Parse the document text, classifying failures per the error taxonomy.
pub(crate) fn parse_document(text: &str) -> Result<Document> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| LibraryError::CorruptDocument(err.to_string()))?;

    let root = value.as_object().ok_or_else(|| {
        LibraryError::CorruptDocument("top level is not an object".to_string())
    })?;

    let name = match root.get("name") {
        None => DEFAULT_LIBRARY_NAME.to_string(),
        Some(Value::String(name)) => name.clone(),
        Some(_) => {
            return Err(LibraryError::CorruptDocument(
                "\"name\" is not a string".to_string(),
            ))
        }
    };

    let entries = match root.get("books") {
        None => &[] as &[Value],
        Some(Value::Array(entries)) => entries.as_slice(),
        Some(_) => {
            return Err(LibraryError::CorruptDocument(
                "\"books\" is not an array".to_string(),
            ))
        }
    };

    let mut books = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        books.push(parse_book(index, entry)?);
    }

    Ok(Document { name, books })
}

/// Parse one book record. Missing or blank title/author is a schema error;
/// any other shape problem within the record is corruption.
fn parse_book(index: usize, entry: &Value) -> Result<Book> {
    let record = entry.as_object().ok_or_else(|| {
        LibraryError::CorruptDocument(format!("book entry {index} is not an object"))
    })?;

    require_text(record, index, "title")?;
    require_text(record, index, "author")?;

    serde_json::from_value(entry.clone())
        .map_err(|err| LibraryError::CorruptDocument(format!("book entry {index}: {err}")))
}

fn require_text(record: &Map<String, Value>, index: usize, field: &str) -> Result<()> {
    match record.get(field) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(()),
        _ => Err(LibraryError::Schema(format!(
            "book entry {index} is missing required field \"{field}\""
        ))),
    }
}

/// Serialize and write the full document to `path`, creating parent
/// directories as needed. The write goes to a temporary sibling first and is
/// renamed into place, so a crash mid-write cannot corrupt an existing
/// document.
pub fn write_document(path: &Path, name: &str, books: &[Book]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let document = json!({
        "name": name,
        "books": books,
    });
    let text = serde_json::to_string_pretty(&document)
        .map_err(|err| LibraryError::CorruptDocument(err.to_string()))?;

    let file_name = path.file_name().ok_or_else(|| {
        LibraryError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("cannot write document to {}", path.display()),
        ))
    })?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, text)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_classifies_unparseable_text_as_corrupt() {
        assert!(matches!(
            parse_document("not json at all"),
            Err(LibraryError::CorruptDocument(_))
        ));
        assert!(matches!(
            parse_document("[1, 2, 3]"),
            Err(LibraryError::CorruptDocument(_))
        ));
        assert!(matches!(
            parse_document(r#"{"name": "x", "books": 5}"#),
            Err(LibraryError::CorruptDocument(_))
        ));
    }

    #[test]
    fn parse_classifies_missing_title_as_schema_error() {
        let text = r#"{"name": "x", "books": [{"author": "Herbert"}]}"#;
        assert!(matches!(
            parse_document(text),
            Err(LibraryError::Schema(_))
        ));

        let blank = r#"{"name": "x", "books": [{"title": "  ", "author": "Herbert"}]}"#;
        assert!(matches!(
            parse_document(blank),
            Err(LibraryError::Schema(_))
        ));
    }

    #[test]
    fn parse_defaults_missing_name_and_books() {
        let document = parse_document("{}").unwrap();
        assert_eq!(document.name, DEFAULT_LIBRARY_NAME);
        assert!(document.books.is_empty());
    }

    #[test]
    fn parse_fills_optional_book_fields() {
        let text = r#"{"name": "Shelf", "books": [{"title": "Dune", "author": "Herbert"}]}"#;
        let document = parse_document(text).unwrap();
        assert_eq!(document.books.len(), 1);
        assert_eq!(document.books[0].location, "Shelf");
        assert_eq!(document.books[0].status, crate::models::STATUS_AVAILABLE);
    }
}
