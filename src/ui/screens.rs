//! Screen state that survives across key events: the catalog listing with
//! its active view and the statistics summary.

use crate::library::{FilterCriteria, Library, SearchField};
use crate::stats::LibraryStats;
use crate::ui::helpers::{bar, stars};

/// What subset of the collection the catalog currently shows.
#[derive(Default, Clone)]
pub(crate) enum CatalogView {
    #[default]
    All,
    Search {
        query: String,
    },
    Filtered {
        criteria: FilterCriteria,
        summary: String,
    },
}

/// Catalog listing state: the ids on display plus the cursor position.
#[derive(Default)]
pub(crate) struct CatalogScreen {
    pub(crate) view: CatalogView,
    pub(crate) ids: Vec<usize>,
    pub(crate) selected: usize,
}

impl CatalogScreen {
    /// Recompute the visible ids from the current view. Ids shift when books
    /// are added or removed, so every mutation goes through here.
    pub(crate) fn refresh(&mut self, library: &Library) {
        self.ids = match &self.view {
            CatalogView::All => (0..library.len()).collect(),
            CatalogView::Search { query } => library.search(query, SearchField::TEXT),
            CatalogView::Filtered { criteria, .. } => library.filter(criteria),
        };
        if self.ids.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.ids.len() {
            self.selected = self.ids.len() - 1;
        }
    }

    /// Switch back to the unfiltered listing.
    pub(crate) fn show_all(&mut self, library: &Library) {
        self.view = CatalogView::All;
        self.selected = 0;
        self.refresh(library);
    }

    pub(crate) fn show_search(&mut self, library: &Library, query: String) {
        self.view = CatalogView::Search { query };
        self.selected = 0;
        self.refresh(library);
    }

    pub(crate) fn show_filtered(
        &mut self,
        library: &Library,
        criteria: FilterCriteria,
        summary: String,
    ) {
        self.view = CatalogView::Filtered { criteria, summary };
        self.selected = 0;
        self.refresh(library);
    }

    /// Id of the book under the cursor, if any.
    pub(crate) fn current_id(&self) -> Option<usize> {
        self.ids.get(self.selected).copied()
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.ids.is_empty() {
            self.selected = 0;
            return;
        }
        let max = self.ids.len() as isize - 1;
        let next = (self.selected as isize + offset).clamp(0, max);
        self.selected = next as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.ids.len().saturating_sub(1);
    }

    /// Title of the catalog block, reflecting the active view.
    pub(crate) fn block_title(&self, library: &Library) -> String {
        match &self.view {
            CatalogView::All => format!("{} ({} books)", library.name(), library.len()),
            CatalogView::Search { query } => {
                format!("Search \"{}\" ({} matches)", query, self.ids.len())
            }
            CatalogView::Filtered { summary, .. } => {
                format!("Filter [{}] ({} matches)", summary, self.ids.len())
            }
        }
    }
}

/// Statistics screen: a computed snapshot plus vertical scroll offset.
pub(crate) struct StatsScreen {
    pub(crate) stats: LibraryStats,
    pub(crate) scroll: u16,
}

impl StatsScreen {
    pub(crate) fn new(library: &Library) -> Self {
        Self {
            stats: library.statistics(),
            scroll: 0,
        }
    }

    pub(crate) fn scroll_by(&mut self, offset: i32) {
        let next = self.scroll as i32 + offset;
        self.scroll = next.clamp(0, u16::MAX as i32) as u16;
    }

    /// Render the statistics report as plain display lines.
    pub(crate) fn display_lines(&self) -> Vec<String> {
        let stats = &self.stats;
        let mut lines = Vec::new();

        lines.push(format!("Total books:    {}", stats.total_books));
        lines.push(format!("Available:      {}", stats.available_books));
        lines.push(format!("Borrowed:       {}", stats.borrowed_books));
        if stats.avg_rating > 0.0 {
            lines.push(format!("Average rating: {:.2}", stats.avg_rating));
        }
        if let Some((title, year)) = &stats.oldest_book {
            lines.push(format!("Oldest book:    {title} ({year})"));
        }
        if let Some((title, year)) = &stats.newest_book {
            lines.push(format!("Newest book:    {title} ({year})"));
        }

        if !stats.genres.is_empty() {
            lines.push(String::new());
            lines.push("Genres".to_string());
            let max = stats.genres.values().copied().max().unwrap_or(1);
            for (genre, count) in &stats.genres {
                lines.push(format!("  {genre:<20} {:<12} {count}", bar(*count, max, 12)));
            }
        }

        if !stats.authors.is_empty() {
            lines.push(String::new());
            lines.push("Authors".to_string());
            let max = stats.authors.values().copied().max().unwrap_or(1);
            for (author, count) in &stats.authors {
                lines.push(format!("  {author:<20} {:<12} {count}", bar(*count, max, 12)));
            }
        }

        if !stats.years.is_empty() {
            lines.push(String::new());
            lines.push("Publication years".to_string());
            let max = stats.years.values().copied().max().unwrap_or(1);
            for (year, count) in &stats.years {
                lines.push(format!("  {year:<20} {:<12} {count}", bar(*count, max, 12)));
            }
        }

        let rated: usize = stats.ratings.iter().sum();
        if rated > 0 {
            lines.push(String::new());
            lines.push("Ratings".to_string());
            let max = stats.ratings.iter().copied().max().unwrap_or(1);
            for value in (1..=5u8).rev() {
                let count = stats.ratings[value as usize - 1];
                lines.push(format!(
                    "  {:<20} {:<12} {count}",
                    stars(Some(value)),
                    bar(count, max, 12)
                ));
            }
            if stats.unrated > 0 {
                lines.push(format!("  {:<33} {}", "unrated", stats.unrated));
            }
        }

        if !stats.tags.is_empty() {
            lines.push(String::new());
            lines.push("Tags".to_string());
            let max = stats.tags.values().copied().max().unwrap_or(1);
            for (tag, count) in &stats.tags {
                lines.push(format!("  {tag:<20} {:<12} {count}", bar(*count, max, 12)));
            }
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Book;

    fn sample_library() -> Library {
        let mut library = Library::at("unused.json");
        let mut dune = Book::new("Dune", "Frank Herbert").unwrap();
        dune.genre = "Science Fiction".to_string();
        dune.year = Some(1965);
        library.add(dune).unwrap();
        let mut hobbit = Book::new("The Hobbit", "J.R.R. Tolkien").unwrap();
        hobbit.genre = "Fantasy".to_string();
        hobbit.year = Some(1937);
        library.add(hobbit).unwrap();
        library
    }

    #[test]
    fn refresh_tracks_the_active_view() {
        let library = sample_library();
        let mut screen = CatalogScreen::default();
        screen.refresh(&library);
        assert_eq!(screen.ids, vec![0, 1]);

        screen.show_search(&library, "hobbit".to_string());
        assert_eq!(screen.ids, vec![1]);
        assert_eq!(screen.current_id(), Some(1));

        screen.show_all(&library);
        assert_eq!(screen.ids, vec![0, 1]);
    }

    #[test]
    fn selection_stays_in_bounds_after_shrinking() {
        let mut library = sample_library();
        let mut screen = CatalogScreen::default();
        screen.refresh(&library);
        screen.select_last();
        assert_eq!(screen.selected, 1);

        library.remove(1).unwrap();
        screen.refresh(&library);
        assert_eq!(screen.selected, 0);
        assert_eq!(screen.current_id(), Some(0));
    }

    #[test]
    fn stats_lines_include_counts_and_histograms() {
        let library = sample_library();
        let screen = StatsScreen::new(&library);
        let lines = screen.display_lines();
        assert!(lines.iter().any(|l| l.contains("Total books:    2")));
        assert!(lines.iter().any(|l| l == "Genres"));
        assert!(lines.iter().any(|l| l.contains("Fantasy")));
    }
}
