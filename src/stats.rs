//! Aggregate statistics over the catalog, computed in a single pass. The
//! histograms keep first-encounter insertion order while counting and are
//! then stably sorted by descending frequency, so ties stay in the order the
//! keys were first seen.

use indexmap::IndexMap;

use crate::models::Book;

/// Snapshot of the catalog's aggregate numbers. An empty catalog yields the
/// all-zero/empty default rather than an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryStats {
    pub total_books: usize,
    pub available_books: usize,
    pub borrowed_books: usize,
    /// Genre frequency; books without a genre are not counted.
    pub genres: IndexMap<String, usize>,
    /// Author frequency over every book.
    pub authors: IndexMap<String, usize>,
    /// Publication year frequency; books without a year are not counted.
    pub years: IndexMap<i32, usize>,
    /// Rating buckets 1 through 5 (index 0 holds the count of 1-star books).
    pub ratings: [usize; 5],
    /// Count of books without a rating.
    pub unrated: usize,
    /// Tag frequency across all books.
    pub tags: IndexMap<String, usize>,
    /// Average over rated books only, rounded to 2 decimal places; 0 when no
    /// book is rated.
    pub avg_rating: f64,
    /// (title, year) of the earliest dated book; first occurrence wins ties.
    pub oldest_book: Option<(String, i32)>,
    /// (title, year) of the latest dated book; replaced only on strict
    /// improvement, so the first occurrence also wins ties here.
    pub newest_book: Option<(String, i32)>,
}

/// Sort a histogram by descending count. `IndexMap::sort_by` is stable, so
/// equal counts keep their first-encounter order.
fn sort_descending<K>(map: &mut IndexMap<K, usize>) {
    map.sort_by(|_, a, _, b| b.cmp(a));
}

/// Walk the book list once and fill every aggregate.
pub fn compute(books: &[Book]) -> LibraryStats {
    let mut stats = LibraryStats {
        total_books: books.len(),
        ..LibraryStats::default()
    };

    let mut rating_total = 0u64;
    let mut rated_books = 0u64;

    for book in books {
        if book.is_available() {
            stats.available_books += 1;
        } else if book.is_borrowed() {
            stats.borrowed_books += 1;
        }

        if !book.genre.is_empty() {
            *stats.genres.entry(book.genre.clone()).or_insert(0) += 1;
        }

        *stats.authors.entry(book.author.clone()).or_insert(0) += 1;

        if let Some(year) = book.year {
            *stats.years.entry(year).or_insert(0) += 1;

            match &stats.oldest_book {
                Some((_, oldest)) if year >= *oldest => {}
                _ => stats.oldest_book = Some((book.title.clone(), year)),
            }
            match &stats.newest_book {
                Some((_, newest)) if year <= *newest => {}
                _ => stats.newest_book = Some((book.title.clone(), year)),
            }
        }

        match book.rating {
            Some(rating @ 1..=5) => {
                stats.ratings[usize::from(rating) - 1] += 1;
                rating_total += u64::from(rating);
                rated_books += 1;
            }
            _ => stats.unrated += 1,
        }

        for tag in &book.tags {
            *stats.tags.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    if rated_books > 0 {
        let avg = rating_total as f64 / rated_books as f64;
        stats.avg_rating = (avg * 100.0).round() / 100.0;
    }

    sort_descending(&mut stats.genres);
    sort_descending(&mut stats.authors);
    sort_descending(&mut stats.years);
    sort_descending(&mut stats.tags);

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, author: &str) -> Book {
        Book::new(title, author).unwrap()
    }

    #[test]
    fn empty_catalog_yields_all_zero_stats() {
        let stats = compute(&[]);
        assert_eq!(stats.total_books, 0);
        assert_eq!(stats.available_books, 0);
        assert_eq!(stats.borrowed_books, 0);
        assert!(stats.genres.is_empty());
        assert!(stats.authors.is_empty());
        assert!(stats.years.is_empty());
        assert_eq!(stats.ratings, [0; 5]);
        assert_eq!(stats.unrated, 0);
        assert!(stats.tags.is_empty());
        assert_eq!(stats.avg_rating, 0.0);
        assert_eq!(stats.oldest_book, None);
        assert_eq!(stats.newest_book, None);
    }

    #[test]
    fn single_rated_book() {
        let mut b = book("Dune", "Herbert");
        b.rating = Some(4);
        let stats = compute(&[b]);
        assert_eq!(stats.total_books, 1);
        assert_eq!(stats.avg_rating, 4.0);
        assert_eq!(stats.ratings, [0, 0, 0, 1, 0]);
        assert_eq!(stats.unrated, 0);
    }

    #[test]
    fn average_rating_rounds_to_two_decimals() {
        let mut a = book("A", "X");
        a.rating = Some(5);
        let mut b = book("B", "Y");
        b.rating = Some(4);
        let mut c = book("C", "Z");
        c.rating = Some(4);
        let d = book("D", "W");

        let stats = compute(&[a, b, c, d]);
        // (5 + 4 + 4) / 3 = 4.333... -> 4.33; the unrated book is excluded.
        assert_eq!(stats.avg_rating, 4.33);
        assert_eq!(stats.unrated, 1);
    }

    #[test]
    fn histograms_sort_by_count_with_stable_ties() {
        let mut books = Vec::new();
        for (title, genre) in [
            ("A", "Poetry"),
            ("B", "Fantasy"),
            ("C", "Fantasy"),
            ("D", "History"),
            ("E", "Poetry"),
            ("F", "Fantasy"),
            ("G", "History"),
        ] {
            let mut b = book(title, title);
            b.genre = genre.to_string();
            books.push(b);
        }

        let stats = compute(&books);
        let genres: Vec<(&str, usize)> = stats
            .genres
            .iter()
            .map(|(genre, count)| (genre.as_str(), *count))
            .collect();
        // Poetry and History tie at two; Poetry was encountered first.
        assert_eq!(genres, vec![("Fantasy", 3), ("Poetry", 2), ("History", 2)]);
    }

    #[test]
    fn oldest_and_newest_break_ties_by_first_occurrence() {
        let mut first = book("First", "A");
        first.year = Some(1950);
        let mut tied = book("Tied", "B");
        tied.year = Some(1950);
        let mut newest = book("Newest", "C");
        newest.year = Some(1999);
        let undated = book("Undated", "D");

        let stats = compute(&[first, tied, newest, undated]);
        assert_eq!(stats.oldest_book, Some(("First".to_string(), 1950)));
        assert_eq!(stats.newest_book, Some(("Newest".to_string(), 1999)));

        let mut a = book("A", "A");
        a.year = Some(2000);
        let mut b = book("B", "B");
        b.year = Some(2000);
        let stats = compute(&[a, b]);
        assert_eq!(stats.newest_book, Some(("A".to_string(), 2000)));
    }

    #[test]
    fn borrowed_and_available_counts() {
        let mut lent = book("Lent", "A");
        lent.lend("Paul", 14).unwrap();
        let shelf = book("Shelf", "B");
        let mut lost = book("Lost", "C");
        lost.status = "Lost".to_string();

        let stats = compute(&[lent, shelf, lost]);
        assert_eq!(stats.total_books, 3);
        assert_eq!(stats.available_books, 1);
        assert_eq!(stats.borrowed_books, 1);
    }

    #[test]
    fn tag_frequency_spans_books() {
        let mut a = book("A", "X");
        a.add_tag("classic");
        a.add_tag("long");
        let mut b = book("B", "Y");
        b.add_tag("classic");

        let stats = compute(&[a, b]);
        assert_eq!(stats.tags.get("classic"), Some(&2));
        assert_eq!(stats.tags.get("long"), Some(&1));
        assert_eq!(
            stats.tags.first(),
            Some((&"classic".to_string(), &2))
        );
    }
}
