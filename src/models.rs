//! Domain model for a single catalog entry. `Book` stays a plain data holder
//! with a small amount of behavior (the lending state machine and tag
//! management) so the collection and UI layers can focus on bookkeeping and
//! presentation. The serde field order matches the persisted JSON document
//! exactly; changing it changes the on-disk contract.

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, Result};

/// Status value for a book that is on the shelf and lendable.
pub const STATUS_AVAILABLE: &str = "Available";
/// Status value for a book that is currently lent out.
pub const STATUS_BORROWED: &str = "Borrowed";
/// Default lending period applied when the caller does not choose one.
pub const DEFAULT_LOAN_DAYS: u64 = 14;
/// Rendering of every date field in the persisted document.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's date rendered in the document format.
pub(crate) fn today_string() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}

fn default_location() -> String {
    "Shelf".to_string()
}

fn default_status() -> String {
    STATUS_AVAILABLE.to_string()
}

/// One catalog entry with bibliographic fields plus lending sub-state.
///
/// Invariant: `status == "Borrowed"` exactly when `borrowed_by`,
/// `borrowed_date`, and `due_date` are all non-empty; `status == "Available"`
/// exactly when all three are empty. Other status strings (for example
/// "Lost") round-trip through persistence untouched, but only the
/// Available/Borrowed pair participates in the lending cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub rating: Option<u8>,
    /// Set once at creation time and never mutated afterwards.
    #[serde(default = "today_string")]
    pub date_added: String,
    #[serde(default)]
    pub borrowed_by: String,
    #[serde(default)]
    pub borrowed_date: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Book {
    /// Create a book with the two required fields. Everything else starts at
    /// its documented default and can be filled in afterwards.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Result<Self> {
        let title = title.into();
        let author = author.into();
        if title.trim().is_empty() {
            return Err(LibraryError::Validation("Title is required.".to_string()));
        }
        if author.trim().is_empty() {
            return Err(LibraryError::Validation("Author is required.".to_string()));
        }

        Ok(Self {
            title,
            author,
            isbn: String::new(),
            genre: String::new(),
            year: None,
            publisher: String::new(),
            pages: None,
            description: String::new(),
            location: default_location(),
            status: default_status(),
            rating: None,
            date_added: today_string(),
            borrowed_by: String::new(),
            borrowed_date: String::new(),
            due_date: String::new(),
            tags: Vec::new(),
        })
    }

    /// Whether the book is on the shelf and lendable.
    pub fn is_available(&self) -> bool {
        self.status == STATUS_AVAILABLE
    }

    /// Whether the book is currently lent out.
    pub fn is_borrowed(&self) -> bool {
        self.status == STATUS_BORROWED
    }

    /// Mark the book as lent to `borrower` for `days` days starting today.
    ///
    /// Fails with `InvalidState` unless the book is Available, leaving every
    /// field untouched. An empty borrower name is rejected up front.
    pub fn lend(&mut self, borrower: &str, days: u64) -> Result<()> {
        let borrower = borrower.trim();
        if borrower.is_empty() {
            return Err(LibraryError::Validation(
                "Borrower name is required.".to_string(),
            ));
        }
        if !self.is_available() {
            return Err(LibraryError::InvalidState(format!(
                "book is not available (current status: {})",
                self.status
            )));
        }

        let today = Local::now().date_naive();
        let due = today.checked_add_days(Days::new(days)).ok_or_else(|| {
            LibraryError::Validation(format!("lending period of {days} days is out of range"))
        })?;

        self.status = STATUS_BORROWED.to_string();
        self.borrowed_by = borrower.to_string();
        self.borrowed_date = today.format(DATE_FORMAT).to_string();
        self.due_date = due.format(DATE_FORMAT).to_string();
        Ok(())
    }

    /// Mark the book as returned, clearing all lending fields.
    ///
    /// Fails with `InvalidState` unless the book is Borrowed.
    pub fn return_book(&mut self) -> Result<()> {
        if !self.is_borrowed() {
            return Err(LibraryError::InvalidState(format!(
                "book is not borrowed (current status: {})",
                self.status
            )));
        }

        self.status = STATUS_AVAILABLE.to_string();
        self.borrowed_by.clear();
        self.borrowed_date.clear();
        self.due_date.clear();
        Ok(())
    }

    /// Attach a tag. No-op when the exact tag (case-sensitive) is already
    /// present, so repeated calls are idempotent.
    pub fn add_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        if tag.is_empty() {
            return;
        }
        if !self.tags.iter().any(|existing| existing == tag) {
            self.tags.push(tag.to_string());
        }
    }

    /// Detach a tag. No-op when the tag is absent.
    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|existing| existing != tag);
    }

    /// Parse the due date back into a typed date. Empty or malformed fields
    /// yield `None`; the UI uses this for overdue highlighting.
    pub fn due_date_parsed(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.due_date, DATE_FORMAT).ok()
    }

    /// Compose the `Title by Author` string used in lists and prompts.
    pub fn display_title(&self) -> String {
        format!("{} by {}", self.title, self.author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> Book {
        Book::new("Dune", "Frank Herbert").unwrap()
    }

    #[test]
    fn new_requires_title_and_author() {
        assert!(matches!(
            Book::new("", "Herbert"),
            Err(LibraryError::Validation(_))
        ));
        assert!(matches!(
            Book::new("Dune", "   "),
            Err(LibraryError::Validation(_))
        ));
    }

    #[test]
    fn new_book_starts_available_with_defaults() {
        let b = book();
        assert!(b.is_available());
        assert_eq!(b.location, "Shelf");
        assert!(b.borrowed_by.is_empty());
        assert!(b.borrowed_date.is_empty());
        assert!(b.due_date.is_empty());
        assert!(!b.date_added.is_empty());
    }

    #[test]
    fn lend_sets_due_date_relative_to_borrowed_date() {
        let mut b = book();
        b.lend("Paul", 14).unwrap();
        assert!(b.is_borrowed());
        assert_eq!(b.borrowed_by, "Paul");

        let borrowed = NaiveDate::parse_from_str(&b.borrowed_date, DATE_FORMAT).unwrap();
        let due = NaiveDate::parse_from_str(&b.due_date, DATE_FORMAT).unwrap();
        assert_eq!(due - borrowed, chrono::Duration::days(14));
    }

    #[test]
    fn lend_twice_fails_and_leaves_state_unchanged() {
        let mut b = book();
        b.lend("Paul", 7).unwrap();
        let before = b.clone();
        assert!(matches!(
            b.lend("Leto", 7),
            Err(LibraryError::InvalidState(_))
        ));
        assert_eq!(b, before);
    }

    #[test]
    fn lend_rejects_empty_borrower() {
        let mut b = book();
        assert!(matches!(b.lend("  ", 7), Err(LibraryError::Validation(_))));
        assert!(b.is_available());
    }

    #[test]
    fn return_clears_lending_fields() {
        let mut b = book();
        b.lend("Paul", 14).unwrap();
        b.return_book().unwrap();
        assert!(b.is_available());
        assert!(b.borrowed_by.is_empty());
        assert!(b.borrowed_date.is_empty());
        assert!(b.due_date.is_empty());
    }

    #[test]
    fn return_on_available_book_fails() {
        let mut b = book();
        let before = b.clone();
        assert!(matches!(b.return_book(), Err(LibraryError::InvalidState(_))));
        assert_eq!(b, before);
    }

    #[test]
    fn tags_are_idempotent() {
        let mut b = book();
        b.add_tag("sci-fi");
        b.add_tag("sci-fi");
        b.add_tag("classic");
        assert_eq!(b.tags, vec!["sci-fi", "classic"]);

        b.remove_tag("missing");
        b.remove_tag("sci-fi");
        assert_eq!(b.tags, vec!["classic"]);
    }

    #[test]
    fn serde_round_trip_is_stable() {
        let mut b = book();
        b.year = Some(1965);
        b.rating = Some(4);
        b.add_tag("sci-fi");
        b.lend("Paul", 14).unwrap();

        let first = serde_json::to_string(&b).unwrap();
        let reparsed: Book = serde_json::from_str(&first).unwrap();
        let second = serde_json::to_string(&reparsed).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn deserialization_fills_missing_optional_fields() {
        let b: Book = serde_json::from_str(r#"{"title": "Dune", "author": "Herbert"}"#).unwrap();
        assert_eq!(b.location, "Shelf");
        assert_eq!(b.status, STATUS_AVAILABLE);
        assert_eq!(b.year, None);
        assert!(b.tags.is_empty());
        assert!(!b.date_added.is_empty());
    }
}
