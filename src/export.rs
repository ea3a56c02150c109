//! Read-only CSV projection of the book list. This is a convenience for
//! spreadsheet tooling, not part of the persisted contract; nothing here ever
//! feeds back into the collection.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::models::Book;

/// Column headers, matching the persisted field set.
const HEADERS: [&str; 16] = [
    "Title",
    "Author",
    "ISBN",
    "Genre",
    "Year",
    "Publisher",
    "Pages",
    "Description",
    "Location",
    "Status",
    "Rating",
    "Date Added",
    "Tags",
    "Borrowed By",
    "Borrowed Date",
    "Due Date",
];

/// Quote a field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

/// Render the full catalog as CSV text, one row per book.
pub fn to_csv(books: &[Book]) -> String {
    let mut out = String::new();
    out.push_str(&HEADERS.join(","));
    out.push('\n');

    for book in books {
        let fields = vec![
            book.title.clone(),
            book.author.clone(),
            book.isbn.clone(),
            book.genre.clone(),
            book.year.map(|y| y.to_string()).unwrap_or_default(),
            book.publisher.clone(),
            book.pages.map(|p| p.to_string()).unwrap_or_default(),
            book.description.clone(),
            book.location.clone(),
            book.status.clone(),
            book.rating.map(|r| r.to_string()).unwrap_or_default(),
            book.date_added.clone(),
            book.tags.join(", "),
            book.borrowed_by.clone(),
            book.borrowed_date.clone(),
            book.due_date.clone(),
        ];
        out.push_str(&csv_row(&fields));
        out.push('\n');
    }

    out
}

/// Write the CSV projection to `path`.
pub fn write_csv(path: &Path, books: &[Book]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, to_csv(books))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_with_commas_and_quotes_are_escaped() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a, b"), "\"a, b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn export_contains_header_and_one_row_per_book() {
        let mut book = Book::new("Dune, Messiah", "Frank Herbert").unwrap();
        book.year = Some(1969);
        book.add_tag("sci-fi");
        book.add_tag("sequel");

        let csv = to_csv(&[book]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Title,Author,"));
        assert!(lines[1].starts_with("\"Dune, Messiah\",Frank Herbert,"));
        assert!(lines[1].contains("\"sci-fi, sequel\""));
    }
}
