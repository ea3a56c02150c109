//! Error taxonomy for the library core. Every fallible core operation returns
//! one of these variants so the UI can decide how to present the failure; the
//! core itself never logs or retries.

use thiserror::Error;

/// Errors surfaced by `Book` and `Library` operations.
#[derive(Error, Debug)]
pub enum LibraryError {
    /// A required field was missing or blank (construction, rename, lend).
    #[error("{0}")]
    Validation(String),

    /// A book with the same title and author (case-insensitive) already
    /// exists in the collection.
    #[error("book '{title}' by {author} already exists in the library")]
    Duplicate { title: String, author: String },

    /// A book ID outside `[0, len)` was supplied.
    #[error("invalid book id {id}: library holds {len} book(s)")]
    Range { id: usize, len: usize },

    /// An illegal lending transition was attempted. The book's state is left
    /// unchanged.
    #[error("{0}")]
    InvalidState(String),

    /// A persisted book record is missing its required title or author.
    #[error("invalid book record: {0}")]
    Schema(String),

    /// The persisted document could not be parsed as the expected structure.
    #[error("corrupt library document: {0}")]
    CorruptDocument(String),

    /// File system failure while reading or writing the document.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shorthand result alias used throughout the core.
pub type Result<T> = std::result::Result<T, LibraryError>;
