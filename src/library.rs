//! The owning collection of catalog entries. Every operation here works over
//! the in-memory ordered book list; persistence is delegated to the storage
//! module and statistics to the stats module. A book's ID is its current
//! index in the list, so removing a book shifts every later ID down by one;
//! callers must re-derive IDs after any removal.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Local};

use crate::error::{LibraryError, Result};
use crate::models::Book;
use crate::stats::{self, LibraryStats};
use crate::storage;

/// Library name used when nothing was configured or persisted.
pub const DEFAULT_LIBRARY_NAME: &str = "My Personal Library";

/// Fields that free-text search can inspect. `Year` matches against the
/// decimal rendering of the publication year; `Tags` matches against each
/// tag individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Author,
    Isbn,
    Genre,
    Publisher,
    Description,
    Tags,
    Year,
}

impl SearchField {
    /// The default field set: every free-text field plus tags.
    pub const TEXT: &'static [SearchField] = &[
        SearchField::Title,
        SearchField::Author,
        SearchField::Isbn,
        SearchField::Genre,
        SearchField::Publisher,
        SearchField::Description,
        SearchField::Tags,
    ];

    fn matches(self, book: &Book, needle: &str) -> bool {
        let contains = |haystack: &str| haystack.to_lowercase().contains(needle);
        match self {
            SearchField::Title => contains(&book.title),
            SearchField::Author => contains(&book.author),
            SearchField::Isbn => contains(&book.isbn),
            SearchField::Genre => contains(&book.genre),
            SearchField::Publisher => contains(&book.publisher),
            SearchField::Description => contains(&book.description),
            SearchField::Tags => book.tags.iter().any(|tag| contains(tag)),
            SearchField::Year => book
                .year
                .is_some_and(|year| year.to_string().contains(needle)),
        }
    }
}

/// Typed filter criteria. Each supplied predicate must hold (logical AND);
/// unset predicates are skipped. The ranged pairs are inclusive, and a
/// year/rating bound excludes books that carry no year/rating at all.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub status: Option<String>,
    pub genre: Option<String>,
    pub author: Option<String>,
    pub location: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub rating_from: Option<u8>,
    pub rating_to: Option<u8>,
}

impl FilterCriteria {
    /// Whether no predicate is set at all (such a filter matches everything).
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.genre.is_none()
            && self.author.is_none()
            && self.location.is_none()
            && self.year_from.is_none()
            && self.year_to.is_none()
            && self.rating_from.is_none()
            && self.rating_to.is_none()
    }

    fn matches(&self, book: &Book) -> bool {
        if let Some(status) = &self.status {
            if &book.status != status {
                return false;
            }
        }
        if let Some(genre) = &self.genre {
            if &book.genre != genre {
                return false;
            }
        }
        if let Some(author) = &self.author {
            if &book.author != author {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if &book.location != location {
                return false;
            }
        }

        if self.year_from.is_some() || self.year_to.is_some() {
            let Some(year) = book.year else {
                return false;
            };
            if self.year_from.is_some_and(|from| year < from) {
                return false;
            }
            if self.year_to.is_some_and(|to| year > to) {
                return false;
            }
        }

        if self.rating_from.is_some() || self.rating_to.is_some() {
            let Some(rating) = book.rating else {
                return false;
            };
            if self.rating_from.is_some_and(|from| rating < from) {
                return false;
            }
            if self.rating_to.is_some_and(|to| rating > to) {
                return false;
            }
        }

        true
    }
}

/// Typed field updates for `Library::update`. Only set fields are applied;
/// `date_added` is deliberately not part of the patch because it is immutable
/// after creation. The nested options distinguish "leave alone" (outer
/// `None`) from "clear the value" (inner `None`).
#[derive(Debug, Clone, Default)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub year: Option<Option<i32>>,
    pub publisher: Option<String>,
    pub pages: Option<Option<u32>>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub rating: Option<Option<u8>>,
    pub tags: Option<Vec<String>>,
}

/// The catalog: a named, ordered collection of books plus the path of its
/// persisted document.
#[derive(Debug)]
pub struct Library {
    name: String,
    books: Vec<Book>,
    file_path: PathBuf,
}

impl Library {
    /// Create an empty library persisting to `path`.
    pub fn with_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            books: Vec::new(),
            file_path: path.into(),
        }
    }

    /// Create an empty library with the default name, persisting to `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self::with_path(DEFAULT_LIBRARY_NAME, path)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Change the library name. A blank name is rejected.
    pub fn rename(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::Validation(
                "Library name cannot be empty.".to_string(),
            ));
        }
        self.name = name.to_string();
        Ok(())
    }

    fn check_id(&self, id: usize) -> Result<()> {
        if id < self.books.len() {
            Ok(())
        } else {
            Err(LibraryError::Range {
                id,
                len: self.books.len(),
            })
        }
    }

    /// Reject `candidate` when another book (any index except `skip`) already
    /// carries the same title and author, compared case-insensitively.
    fn check_duplicate(&self, title: &str, author: &str, skip: Option<usize>) -> Result<()> {
        let title_lower = title.to_lowercase();
        let author_lower = author.to_lowercase();
        for (idx, existing) in self.books.iter().enumerate() {
            if Some(idx) == skip {
                continue;
            }
            if existing.title.to_lowercase() == title_lower
                && existing.author.to_lowercase() == author_lower
            {
                return Err(LibraryError::Duplicate {
                    title: title.to_string(),
                    author: author.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Append a book, preserving insertion order. Fails with `Duplicate` when
    /// a book with the same (title, author) pair already exists.
    pub fn add(&mut self, book: Book) -> Result<()> {
        self.check_duplicate(&book.title, &book.author, None)?;
        self.books.push(book);
        Ok(())
    }

    /// Remove and return the book at `id`. Every later ID shifts down by one.
    pub fn remove(&mut self, id: usize) -> Result<Book> {
        self.check_id(id)?;
        Ok(self.books.remove(id))
    }

    /// Borrow the book at `id`.
    pub fn get(&self, id: usize) -> Result<&Book> {
        self.check_id(id)?;
        Ok(&self.books[id])
    }

    /// Mutably borrow the book at `id`. Mutations are visible to the
    /// collection; callers that change title or author must uphold the
    /// duplicate invariant themselves (prefer `update` for that).
    pub fn get_mut(&mut self, id: usize) -> Result<&mut Book> {
        self.check_id(id)?;
        Ok(&mut self.books[id])
    }

    /// Apply a typed patch to the book at `id`. Title/author edits are
    /// re-validated against the non-empty and duplicate invariants; year,
    /// pages, and rating bounds are enforced here so no caller can push an
    /// out-of-range value into the collection.
    pub fn update(&mut self, id: usize, patch: BookPatch) -> Result<()> {
        self.check_id(id)?;

        let new_title = patch.title.as_deref().unwrap_or(&self.books[id].title);
        let new_author = patch.author.as_deref().unwrap_or(&self.books[id].author);
        if new_title.trim().is_empty() {
            return Err(LibraryError::Validation("Title is required.".to_string()));
        }
        if new_author.trim().is_empty() {
            return Err(LibraryError::Validation("Author is required.".to_string()));
        }
        self.check_duplicate(new_title, new_author, Some(id))?;

        if let Some(Some(year)) = patch.year {
            let current_year = Local::now().date_naive().year();
            if year <= 0 || year > current_year {
                return Err(LibraryError::Validation(format!(
                    "Publication year must be between 1 and {current_year}."
                )));
            }
        }
        if let Some(Some(pages)) = patch.pages {
            if pages == 0 {
                return Err(LibraryError::Validation(
                    "Page count must be positive.".to_string(),
                ));
            }
        }
        if let Some(Some(rating)) = patch.rating {
            if !(1..=5).contains(&rating) {
                return Err(LibraryError::Validation(
                    "Rating must be between 1 and 5.".to_string(),
                ));
            }
        }

        let book = &mut self.books[id];
        if let Some(title) = patch.title {
            book.title = title;
        }
        if let Some(author) = patch.author {
            book.author = author;
        }
        if let Some(isbn) = patch.isbn {
            book.isbn = isbn;
        }
        if let Some(genre) = patch.genre {
            book.genre = genre;
        }
        if let Some(year) = patch.year {
            book.year = year;
        }
        if let Some(publisher) = patch.publisher {
            book.publisher = publisher;
        }
        if let Some(pages) = patch.pages {
            book.pages = pages;
        }
        if let Some(description) = patch.description {
            book.description = description;
        }
        if let Some(location) = patch.location {
            book.location = location;
        }
        if let Some(rating) = patch.rating {
            book.rating = rating;
        }
        if let Some(tags) = patch.tags {
            book.tags.clear();
            for tag in &tags {
                book.add_tag(tag);
            }
        }
        Ok(())
    }

    /// Case-insensitive substring search over `fields`, returning matching
    /// IDs in ascending order. An empty query matches nothing.
    pub fn search(&self, query: &str, fields: &[SearchField]) -> Vec<usize> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.books
            .iter()
            .enumerate()
            .filter(|(_, book)| fields.iter().any(|field| field.matches(book, &needle)))
            .map(|(id, _)| id)
            .collect()
    }

    /// Apply `criteria` to every book, returning matching IDs in ascending
    /// order.
    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<usize> {
        self.books
            .iter()
            .enumerate()
            .filter(|(_, book)| criteria.matches(book))
            .map(|(id, _)| id)
            .collect()
    }

    /// Aggregate statistics in one pass over the collection.
    pub fn statistics(&self) -> LibraryStats {
        stats::compute(&self.books)
    }

    /// Persist the full document to the library's configured path.
    pub fn save(&self) -> Result<()> {
        storage::write_document(&self.file_path, &self.name, &self.books)
    }

    /// Rebind the persistence path, then save.
    pub fn save_to(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.file_path = path.into();
        self.save()
    }

    /// Load the document from the configured path, replacing the in-memory
    /// name and book list. A missing file is a no-op: the current state is
    /// kept untouched. A corrupt or schema-violating document surfaces its
    /// error and also leaves the current state untouched.
    pub fn load(&mut self) -> Result<()> {
        if let Some(document) = storage::read_document(&self.file_path)? {
            self.name = document.name;
            self.books = document.books;
        }
        Ok(())
    }

    /// Rebind the persistence path, then load.
    pub fn load_from(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.file_path = path.into();
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_library() -> Library {
        let mut library = Library::at("unused.json");
        let mut dune = Book::new("Dune", "Frank Herbert").unwrap();
        dune.year = Some(1965);
        dune.genre = "Science Fiction".to_string();
        dune.rating = Some(5);
        dune.add_tag("desert");
        library.add(dune).unwrap();

        let mut hobbit = Book::new("The Hobbit", "J.R.R. Tolkien").unwrap();
        hobbit.year = Some(1937);
        hobbit.genre = "Fantasy".to_string();
        library.add(hobbit).unwrap();

        let mut essays = Book::new("Essays", "Michel de Montaigne").unwrap();
        essays.rating = Some(4);
        library.add(essays).unwrap();

        library
    }

    #[test]
    fn add_rejects_case_insensitive_duplicate() {
        let mut library = sample_library();
        let len = library.len();
        let result = library.add(Book::new("dune", "FRANK HERBERT").unwrap());
        assert!(matches!(result, Err(LibraryError::Duplicate { .. })));
        assert_eq!(library.len(), len);
    }

    #[test]
    fn remove_shifts_later_ids() {
        let mut library = sample_library();
        let removed = library.remove(0).unwrap();
        assert_eq!(removed.title, "Dune");
        assert_eq!(library.get(0).unwrap().title, "The Hobbit");
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn remove_out_of_bounds_is_a_range_error() {
        let mut library = sample_library();
        assert!(matches!(
            library.remove(99),
            Err(LibraryError::Range { id: 99, len: 3 })
        ));
    }

    #[test]
    fn get_mut_mutations_are_visible() {
        let mut library = sample_library();
        library.get_mut(1).unwrap().add_tag("middle-earth");
        assert_eq!(library.get(1).unwrap().tags, vec!["middle-earth"]);
    }

    #[test]
    fn update_applies_only_set_fields() {
        let mut library = sample_library();
        library
            .update(
                0,
                BookPatch {
                    rating: Some(Some(3)),
                    location: Some("Box 7".to_string()),
                    ..BookPatch::default()
                },
            )
            .unwrap();
        let book = library.get(0).unwrap();
        assert_eq!(book.rating, Some(3));
        assert_eq!(book.location, "Box 7");
        assert_eq!(book.title, "Dune");
        assert_eq!(book.year, Some(1965));
    }

    #[test]
    fn update_cannot_create_a_duplicate() {
        let mut library = sample_library();
        let result = library.update(
            1,
            BookPatch {
                title: Some("DUNE".to_string()),
                author: Some("frank herbert".to_string()),
                ..BookPatch::default()
            },
        );
        assert!(matches!(result, Err(LibraryError::Duplicate { .. })));
        assert_eq!(library.get(1).unwrap().title, "The Hobbit");
    }

    #[test]
    fn update_rejects_out_of_range_rating() {
        let mut library = sample_library();
        let result = library.update(
            0,
            BookPatch {
                rating: Some(Some(6)),
                ..BookPatch::default()
            },
        );
        assert!(matches!(result, Err(LibraryError::Validation(_))));
    }

    #[test]
    fn update_can_clear_an_optional_field() {
        let mut library = sample_library();
        library
            .update(
                0,
                BookPatch {
                    year: Some(None),
                    ..BookPatch::default()
                },
            )
            .unwrap();
        assert_eq!(library.get(0).unwrap().year, None);
    }

    #[test]
    fn search_is_case_insensitive() {
        let library = sample_library();
        assert_eq!(library.search("dUnE", SearchField::TEXT), vec![0]);
        assert_eq!(library.search("tolkien", SearchField::TEXT), vec![1]);
    }

    #[test]
    fn search_covers_tags() {
        let library = sample_library();
        assert_eq!(library.search("desert", SearchField::TEXT), vec![0]);
        assert!(library
            .search("desert", &[SearchField::Title])
            .is_empty());
    }

    #[test]
    fn empty_query_matches_nothing() {
        let library = sample_library();
        assert!(library.search("", SearchField::TEXT).is_empty());
        assert!(library.search("   ", SearchField::TEXT).is_empty());
    }

    #[test]
    fn year_field_matches_the_decimal_rendering() {
        let library = sample_library();
        assert_eq!(library.search("196", &[SearchField::Year]), vec![0]);
        assert_eq!(library.search("19", &[SearchField::Year]), vec![0, 1]);
        // The undated book never matches, and the default field set does not
        // look at years.
        assert!(library.search("1965", SearchField::TEXT).is_empty());
    }

    #[test]
    fn year_range_filter_excludes_books_without_a_year() {
        let library = sample_library();
        let criteria = FilterCriteria {
            year_from: Some(1900),
            year_to: Some(1970),
            ..FilterCriteria::default()
        };
        // "Essays" has no year and must not appear.
        assert_eq!(library.filter(&criteria), vec![0, 1]);

        let narrow = FilterCriteria {
            year_from: Some(1960),
            ..FilterCriteria::default()
        };
        assert_eq!(library.filter(&narrow), vec![0]);
    }

    #[test]
    fn filter_predicates_combine_with_and() {
        let mut library = sample_library();
        library.get_mut(0).unwrap().lend("Paul", 14).unwrap();

        let criteria = FilterCriteria {
            status: Some(crate::models::STATUS_BORROWED.to_string()),
            genre: Some("Science Fiction".to_string()),
            ..FilterCriteria::default()
        };
        assert_eq!(library.filter(&criteria), vec![0]);

        let mismatch = FilterCriteria {
            status: Some(crate::models::STATUS_BORROWED.to_string()),
            genre: Some("Fantasy".to_string()),
            ..FilterCriteria::default()
        };
        assert!(library.filter(&mismatch).is_empty());
    }

    #[test]
    fn empty_criteria_match_every_book() {
        let library = sample_library();
        assert_eq!(library.filter(&FilterCriteria::default()), vec![0, 1, 2]);
    }

    #[test]
    fn rename_rejects_blank_names() {
        let mut library = sample_library();
        assert!(matches!(
            library.rename("  "),
            Err(LibraryError::Validation(_))
        ));
        library.rename("Home Shelf").unwrap();
        assert_eq!(library.name(), "Home Shelf");
    }
}
