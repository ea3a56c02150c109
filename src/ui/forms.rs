//! Form state for the modal dialogs: the full book form, the lending form,
//! the filter form, the rename dialog, and delete confirmation. Each form
//! owns raw text buffers plus a focus marker and validates on submit,
//! returning typed values ready for the core collection.

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, Local};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::library::{BookPatch, FilterCriteria};
use crate::models::Book;

/// Split a comma-separated tag string, dropping blanks and duplicates while
/// preserving first-occurrence order.
fn parse_tags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for raw in input.split(',') {
        let tag = raw.trim();
        if !tag.is_empty() && !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Shared rendering for one `Label: value` form line with focus styling.
fn form_line(label: &str, value: &str, active: bool, placeholder: &str) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    };

    let style = if active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{label}: ")),
        Span::styled(display, style),
    ])
}

/// Fields available within the book form, in display order.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Isbn,
    Genre,
    Year,
    Publisher,
    Pages,
    Description,
    Location,
    Rating,
    Tags,
}

impl BookField {
    /// Display order shared by rendering and focus cycling.
    pub(crate) const ORDER: [(BookField, &'static str); 11] = [
        (BookField::Title, "Title"),
        (BookField::Author, "Author"),
        (BookField::Isbn, "ISBN"),
        (BookField::Genre, "Genre"),
        (BookField::Year, "Year"),
        (BookField::Publisher, "Publisher"),
        (BookField::Pages, "Pages"),
        (BookField::Description, "Description"),
        (BookField::Location, "Location"),
        (BookField::Rating, "Rating"),
        (BookField::Tags, "Tags (comma-separated)"),
    ];

    pub(crate) fn label(self) -> &'static str {
        Self::ORDER
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, label)| *label)
            .unwrap_or("")
    }

    /// Row index of this field within the rendered form.
    pub(crate) fn row(self) -> usize {
        Self::ORDER
            .iter()
            .position(|(field, _)| *field == self)
            .unwrap_or(0)
    }

    fn numeric(self) -> bool {
        matches!(self, BookField::Year | BookField::Pages | BookField::Rating)
    }
}

/// Parsed, validated book form values shared by creation and editing.
pub(crate) struct ParsedBook {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) isbn: String,
    pub(crate) genre: String,
    pub(crate) year: Option<i32>,
    pub(crate) publisher: String,
    pub(crate) pages: Option<u32>,
    pub(crate) description: String,
    pub(crate) location: String,
    pub(crate) rating: Option<u8>,
    pub(crate) tags: Vec<String>,
}

/// Raw text state of the add/edit book form.
#[derive(Clone)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) isbn: String,
    pub(crate) genre: String,
    pub(crate) year: String,
    pub(crate) publisher: String,
    pub(crate) pages: String,
    pub(crate) description: String,
    pub(crate) location: String,
    pub(crate) rating: String,
    pub(crate) tags: String,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

impl Default for BookForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            isbn: String::new(),
            genre: String::new(),
            year: String::new(),
            publisher: String::new(),
            pages: String::new(),
            description: String::new(),
            // Matches the Book default so an untouched field changes nothing.
            location: "Shelf".to_string(),
            rating: String::new(),
            tags: String::new(),
            active: BookField::Title,
            error: None,
        }
    }
}

impl BookForm {
    /// Populate the form from an existing book when entering edit mode.
    pub(crate) fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            genre: book.genre.clone(),
            year: book.year.map(|y| y.to_string()).unwrap_or_default(),
            publisher: book.publisher.clone(),
            pages: book.pages.map(|p| p.to_string()).unwrap_or_default(),
            description: book.description.clone(),
            location: book.location.clone(),
            rating: book.rating.map(|r| r.to_string()).unwrap_or_default(),
            tags: book.tags.join(", "),
            active: BookField::Title,
            error: None,
        }
    }

    fn value(&self, field: BookField) -> &String {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Isbn => &self.isbn,
            BookField::Genre => &self.genre,
            BookField::Year => &self.year,
            BookField::Publisher => &self.publisher,
            BookField::Pages => &self.pages,
            BookField::Description => &self.description,
            BookField::Location => &self.location,
            BookField::Rating => &self.rating,
            BookField::Tags => &self.tags,
        }
    }

    fn value_mut(&mut self, field: BookField) -> &mut String {
        match field {
            BookField::Title => &mut self.title,
            BookField::Author => &mut self.author,
            BookField::Isbn => &mut self.isbn,
            BookField::Genre => &mut self.genre,
            BookField::Year => &mut self.year,
            BookField::Publisher => &mut self.publisher,
            BookField::Pages => &mut self.pages,
            BookField::Description => &mut self.description,
            BookField::Location => &mut self.location,
            BookField::Rating => &mut self.rating,
            BookField::Tags => &mut self.tags,
        }
    }

    /// Move focus to the next field in display order, wrapping around.
    pub(crate) fn next_field(&mut self) {
        let next = (self.active.row() + 1) % BookField::ORDER.len();
        self.active = BookField::ORDER[next].0;
    }

    /// Move focus to the previous field in display order, wrapping around.
    pub(crate) fn prev_field(&mut self) {
        let len = BookField::ORDER.len();
        let prev = (self.active.row() + len - 1) % len;
        self.active = BookField::ORDER[prev].0;
    }

    /// Append a character to the active field. Numeric fields accept only
    /// ASCII digits.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        if self.active.numeric() && !ch.is_ascii_digit() {
            return false;
        }
        self.value_mut(self.active).push(ch);
        true
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        self.value_mut(self.active).pop();
    }

    /// Validate and normalize every field, returning values ready for the
    /// collection. Empty numeric fields (and explicit zero, matching the
    /// original form widgets) mean "not set".
    pub(crate) fn parse_inputs(&self) -> Result<ParsedBook> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Title is required."));
        }
        let author = self.author.trim();
        if author.is_empty() {
            return Err(anyhow!("Author is required."));
        }

        let year = match self.year.trim() {
            "" => None,
            raw => {
                let year: i32 = raw.parse().context("Publication year must be a number.")?;
                if year == 0 {
                    None
                } else {
                    let current_year = Local::now().date_naive().year();
                    if year > current_year {
                        return Err(anyhow!(
                            "Publication year must be between 1 and {current_year}."
                        ));
                    }
                    Some(year)
                }
            }
        };

        let pages = match self.pages.trim() {
            "" => None,
            raw => {
                let pages: u32 = raw.parse().context("Page count must be a number.")?;
                if pages == 0 {
                    None
                } else {
                    Some(pages)
                }
            }
        };

        let rating = match self.rating.trim() {
            "" => None,
            raw => {
                let rating: u8 = raw.parse().context("Rating must be a number.")?;
                match rating {
                    0 => None,
                    1..=5 => Some(rating),
                    _ => return Err(anyhow!("Rating must be between 1 and 5.")),
                }
            }
        };

        let location = match self.location.trim() {
            "" => "Shelf".to_string(),
            raw => raw.to_string(),
        };

        Ok(ParsedBook {
            title: title.to_string(),
            author: author.to_string(),
            isbn: self.isbn.trim().to_string(),
            genre: self.genre.trim().to_string(),
            year,
            publisher: self.publisher.trim().to_string(),
            pages,
            description: self.description.trim().to_string(),
            location,
            rating,
            tags: parse_tags(&self.tags),
        })
    }

    /// Build a new book from the parsed inputs.
    pub(crate) fn to_book(&self) -> Result<Book> {
        let parsed = self.parse_inputs()?;
        let mut book = Book::new(parsed.title, parsed.author)?;
        book.isbn = parsed.isbn;
        book.genre = parsed.genre;
        book.year = parsed.year;
        book.publisher = parsed.publisher;
        book.pages = parsed.pages;
        book.description = parsed.description;
        book.location = parsed.location;
        book.rating = parsed.rating;
        book.tags = parsed.tags;
        Ok(book)
    }

    /// Build a full patch from the parsed inputs. The form shows every
    /// editable field, so each one is authoritative on submit.
    pub(crate) fn to_patch(&self) -> Result<BookPatch> {
        let parsed = self.parse_inputs()?;
        Ok(BookPatch {
            title: Some(parsed.title),
            author: Some(parsed.author),
            isbn: Some(parsed.isbn),
            genre: Some(parsed.genre),
            year: Some(parsed.year),
            publisher: Some(parsed.publisher),
            pages: Some(parsed.pages),
            description: Some(parsed.description),
            location: Some(parsed.location),
            rating: Some(parsed.rating),
            tags: Some(parsed.tags),
        })
    }

    /// Render a styled line for the modal form.
    pub(crate) fn build_line(&self, field: BookField) -> Line<'static> {
        let placeholder = match field {
            BookField::Title | BookField::Author => "<required>",
            _ => "<optional>",
        };
        form_line(
            field.label(),
            self.value(field),
            self.active == field,
            placeholder,
        )
    }

    /// Character length of the requested field.
    pub(crate) fn value_len(&self, field: BookField) -> usize {
        self.value(field).chars().count()
    }
}

/// Fields within the lending form.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum LendField {
    #[default]
    Borrower,
    Days,
}

/// Form state for lending a book to someone.
#[derive(Clone)]
pub(crate) struct LendForm {
    pub(crate) borrower: String,
    pub(crate) days: String,
    pub(crate) active: LendField,
    pub(crate) error: Option<String>,
}

impl Default for LendForm {
    fn default() -> Self {
        Self {
            borrower: String::new(),
            days: crate::models::DEFAULT_LOAN_DAYS.to_string(),
            active: LendField::Borrower,
            error: None,
        }
    }
}

impl LendForm {
    /// Swap focus between the borrower and days fields.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            LendField::Borrower => LendField::Days,
            LendField::Days => LendField::Borrower,
        };
    }

    /// Append a character to the active field; the days field accepts only
    /// ASCII digits.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            LendField::Borrower => {
                if ch.is_control() {
                    return false;
                }
                self.borrower.push(ch);
            }
            LendField::Days => {
                if !ch.is_ascii_digit() {
                    return false;
                }
                self.days.push(ch);
            }
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            LendField::Borrower => {
                self.borrower.pop();
            }
            LendField::Days => {
                self.days.pop();
            }
        }
    }

    /// Validate the inputs and return the borrower plus lending period.
    pub(crate) fn parse_inputs(&self) -> Result<(String, u64)> {
        let borrower = self.borrower.trim();
        if borrower.is_empty() {
            return Err(anyhow!("Borrower name is required."));
        }
        let days: u64 = self
            .days
            .trim()
            .parse()
            .context("Lending period must be a number of days.")?;
        if !(1..=365).contains(&days) {
            return Err(anyhow!("Lending period must be between 1 and 365 days."));
        }
        Ok((borrower.to_string(), days))
    }

    pub(crate) fn build_line(&self, field: LendField) -> Line<'static> {
        let (label, value, placeholder) = match field {
            LendField::Borrower => ("Borrower", &self.borrower, "<required>"),
            LendField::Days => ("Days", &self.days, "<required>"),
        };
        form_line(label, value, self.active == field, placeholder)
    }

    pub(crate) fn value_len(&self, field: LendField) -> usize {
        match field {
            LendField::Borrower => self.borrower.chars().count(),
            LendField::Days => self.days.chars().count(),
        }
    }
}

/// Fields within the filter form, in display order.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum FilterField {
    #[default]
    Status,
    Genre,
    Author,
    Location,
    YearFrom,
    YearTo,
    RatingFrom,
    RatingTo,
}

impl FilterField {
    pub(crate) const ORDER: [(FilterField, &'static str); 8] = [
        (FilterField::Status, "Status"),
        (FilterField::Genre, "Genre"),
        (FilterField::Author, "Author"),
        (FilterField::Location, "Location"),
        (FilterField::YearFrom, "Year from"),
        (FilterField::YearTo, "Year to"),
        (FilterField::RatingFrom, "Rating from"),
        (FilterField::RatingTo, "Rating to"),
    ];

    pub(crate) fn label(self) -> &'static str {
        Self::ORDER
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, label)| *label)
            .unwrap_or("")
    }

    pub(crate) fn row(self) -> usize {
        Self::ORDER
            .iter()
            .position(|(field, _)| *field == self)
            .unwrap_or(0)
    }

    fn numeric(self) -> bool {
        matches!(
            self,
            FilterField::YearFrom
                | FilterField::YearTo
                | FilterField::RatingFrom
                | FilterField::RatingTo
        )
    }
}

/// Form state for attribute filtering. Every field left empty is simply not
/// part of the criteria.
#[derive(Default, Clone)]
pub(crate) struct FilterForm {
    pub(crate) status: String,
    pub(crate) genre: String,
    pub(crate) author: String,
    pub(crate) location: String,
    pub(crate) year_from: String,
    pub(crate) year_to: String,
    pub(crate) rating_from: String,
    pub(crate) rating_to: String,
    pub(crate) active: FilterField,
    pub(crate) error: Option<String>,
}

impl FilterForm {
    fn value(&self, field: FilterField) -> &String {
        match field {
            FilterField::Status => &self.status,
            FilterField::Genre => &self.genre,
            FilterField::Author => &self.author,
            FilterField::Location => &self.location,
            FilterField::YearFrom => &self.year_from,
            FilterField::YearTo => &self.year_to,
            FilterField::RatingFrom => &self.rating_from,
            FilterField::RatingTo => &self.rating_to,
        }
    }

    fn value_mut(&mut self, field: FilterField) -> &mut String {
        match field {
            FilterField::Status => &mut self.status,
            FilterField::Genre => &mut self.genre,
            FilterField::Author => &mut self.author,
            FilterField::Location => &mut self.location,
            FilterField::YearFrom => &mut self.year_from,
            FilterField::YearTo => &mut self.year_to,
            FilterField::RatingFrom => &mut self.rating_from,
            FilterField::RatingTo => &mut self.rating_to,
        }
    }

    pub(crate) fn next_field(&mut self) {
        let next = (self.active.row() + 1) % FilterField::ORDER.len();
        self.active = FilterField::ORDER[next].0;
    }

    pub(crate) fn prev_field(&mut self) {
        let len = FilterField::ORDER.len();
        let prev = (self.active.row() + len - 1) % len;
        self.active = FilterField::ORDER[prev].0;
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        if self.active.numeric() && !ch.is_ascii_digit() {
            return false;
        }
        self.value_mut(self.active).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.value_mut(self.active).pop();
    }

    /// Assemble the typed criteria. Returns the criteria plus a short human
    /// summary used as the catalog view label.
    pub(crate) fn parse_inputs(&self) -> Result<(FilterCriteria, String)> {
        let text = |raw: &str| {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        let number = |raw: &str, what: &str| -> Result<Option<i32>> {
            match raw.trim() {
                "" => Ok(None),
                value => value
                    .parse()
                    .map(Some)
                    .with_context(|| format!("{what} must be a number.")),
            }
        };
        let rating = |raw: &str, what: &str| -> Result<Option<u8>> {
            match raw.trim() {
                "" => Ok(None),
                value => {
                    let rating: u8 = value
                        .parse()
                        .with_context(|| format!("{what} must be a number."))?;
                    if (1..=5).contains(&rating) {
                        Ok(Some(rating))
                    } else {
                        Err(anyhow!("{what} must be between 1 and 5."))
                    }
                }
            }
        };

        let criteria = FilterCriteria {
            status: text(&self.status),
            genre: text(&self.genre),
            author: text(&self.author),
            location: text(&self.location),
            year_from: number(&self.year_from, "Year from")?,
            year_to: number(&self.year_to, "Year to")?,
            rating_from: rating(&self.rating_from, "Rating from")?,
            rating_to: rating(&self.rating_to, "Rating to")?,
        };

        let mut parts = Vec::new();
        if let Some(status) = &criteria.status {
            parts.push(format!("status={status}"));
        }
        if let Some(genre) = &criteria.genre {
            parts.push(format!("genre={genre}"));
        }
        if let Some(author) = &criteria.author {
            parts.push(format!("author={author}"));
        }
        if let Some(location) = &criteria.location {
            parts.push(format!("location={location}"));
        }
        match (criteria.year_from, criteria.year_to) {
            (Some(from), Some(to)) => parts.push(format!("year {from}-{to}")),
            (Some(from), None) => parts.push(format!("year ≥{from}")),
            (None, Some(to)) => parts.push(format!("year ≤{to}")),
            (None, None) => {}
        }
        match (criteria.rating_from, criteria.rating_to) {
            (Some(from), Some(to)) => parts.push(format!("rating {from}-{to}")),
            (Some(from), None) => parts.push(format!("rating ≥{from}")),
            (None, Some(to)) => parts.push(format!("rating ≤{to}")),
            (None, None) => {}
        }

        Ok((criteria, parts.join(", ")))
    }

    pub(crate) fn build_line(&self, field: FilterField) -> Line<'static> {
        form_line(
            field.label(),
            self.value(field),
            self.active == field,
            "<any>",
        )
    }

    pub(crate) fn value_len(&self, field: FilterField) -> usize {
        self.value(field).chars().count()
    }
}

/// Form state for renaming the library.
#[derive(Clone)]
pub(crate) struct RenameForm {
    pub(crate) name: String,
    pub(crate) error: Option<String>,
}

impl RenameForm {
    pub(crate) fn with_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.name.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.name.pop();
    }
}

/// State of the tag editor modal: a text entry for new tags plus a selection
/// over the book's existing tags.
#[derive(Default, Clone)]
pub(crate) struct TagEditor {
    pub(crate) input: String,
    pub(crate) selected: usize,
}

impl TagEditor {
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.input.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.input.pop();
    }

    /// Take the pending input, leaving the entry box empty.
    pub(crate) fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input).trim().to_string()
    }

    pub(crate) fn move_selection(&mut self, offset: isize, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        let max = len as isize - 1;
        let next = (self.selected as isize + offset).clamp(0, max);
        self.selected = next as usize;
    }

    pub(crate) fn clamp_selection(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

/// Confirmation state for removing a book from the catalog.
#[derive(Clone)]
pub(crate) struct ConfirmDeleteBook {
    pub(crate) id: usize,
    pub(crate) title: String,
    pub(crate) author: String,
}

impl ConfirmDeleteBook {
    pub(crate) fn from_book(id: usize, book: &Book) -> Self {
        Self {
            id,
            title: book.title.clone(),
            author: book.author.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_parsing_trims_and_dedupes() {
        assert_eq!(
            parse_tags("sci-fi, classic , ,sci-fi,desert"),
            vec!["sci-fi", "classic", "desert"]
        );
        assert!(parse_tags("  ,  ").is_empty());
    }

    #[test]
    fn book_form_requires_title_and_author() {
        let form = BookForm::default();
        assert!(form.parse_inputs().is_err());

        let mut form = BookForm::default();
        form.title = "Dune".to_string();
        form.author = "Herbert".to_string();
        assert!(form.parse_inputs().is_ok());
    }

    #[test]
    fn book_form_treats_zero_numerics_as_unset() {
        let mut form = BookForm::default();
        form.title = "Dune".to_string();
        form.author = "Herbert".to_string();
        form.year = "0".to_string();
        form.pages = "0".to_string();
        form.rating = "0".to_string();

        let parsed = form.parse_inputs().unwrap();
        assert_eq!(parsed.year, None);
        assert_eq!(parsed.pages, None);
        assert_eq!(parsed.rating, None);
    }

    #[test]
    fn book_form_rejects_out_of_range_rating() {
        let mut form = BookForm::default();
        form.title = "Dune".to_string();
        form.author = "Herbert".to_string();
        form.rating = "7".to_string();
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn lend_form_validates_days_range() {
        let mut form = LendForm::default();
        form.borrower = "Paul".to_string();
        assert_eq!(form.parse_inputs().unwrap(), ("Paul".to_string(), 14));

        form.days = "366".to_string();
        assert!(form.parse_inputs().is_err());
        form.days = "0".to_string();
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn filter_form_builds_criteria_and_summary() {
        let mut form = FilterForm::default();
        form.genre = "Fantasy".to_string();
        form.year_from = "1930".to_string();
        form.year_to = "1960".to_string();

        let (criteria, summary) = form.parse_inputs().unwrap();
        assert_eq!(criteria.genre.as_deref(), Some("Fantasy"));
        assert_eq!(criteria.year_from, Some(1930));
        assert_eq!(criteria.year_to, Some(1960));
        assert!(criteria.status.is_none());
        assert_eq!(summary, "genre=Fantasy, year 1930-1960");
    }

    #[test]
    fn empty_filter_form_yields_empty_criteria() {
        let (criteria, summary) = FilterForm::default().parse_inputs().unwrap();
        assert!(criteria.is_empty());
        assert!(summary.is_empty());
    }
}
