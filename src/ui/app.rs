use std::mem;

use anyhow::Result;
use chrono::Local;
use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::export::write_csv;
use crate::library::Library;
use crate::models::Book;

use super::forms::{
    BookField, BookForm, ConfirmDeleteBook, FilterField, FilterForm, LendField, LendForm,
    RenameForm, TagEditor,
};
use super::helpers::{centered_rect, stars, surface_error};
use super::screens::{CatalogScreen, CatalogView, StatsScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// File name used for CSV exports, written next to the library document.
const EXPORT_FILE_NAME: &str = "library_export.csv";

/// High-level navigation states. Keeping this explicit makes it easy to reason
/// about which rendering path runs and what keyboard shortcuts should do.
enum Screen {
    Catalog,
    Detail(usize),
    Stats(StatsScreen),
}

/// Fine-grained modes layered over the current screen.
enum Mode {
    Normal,
    AddingBook(BookForm),
    EditingBook { id: usize, form: BookForm },
    ConfirmDelete(ConfirmDeleteBook),
    Lending { id: usize, form: LendForm },
    EditingTags { id: usize, editor: TagEditor },
    Searching(SearchState),
    Filtering(FilterForm),
    Renaming(RenameForm),
}

/// State for an active inline search.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    library: Library,
    catalog: CatalogScreen,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(library: Library) -> Self {
        let mut catalog = CatalogScreen::default();
        catalog.refresh(&library);
        Self {
            library,
            catalog,
            screen: Screen::Catalog,
            mode: Mode::Normal,
            status: None,
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingBook(form) => self.handle_add_book(code, form)?,
            Mode::EditingBook { id, form } => self.handle_edit_book(code, id, form)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::Lending { id, form } => self.handle_lend(code, id, form)?,
            Mode::EditingTags { id, editor } => self.handle_edit_tags(code, id, editor)?,
            Mode::Searching(state) => self.handle_search(code, state)?,
            Mode::Filtering(form) => self.handle_filter(code, form)?,
            Mode::Renaming(form) => self.handle_rename(code, form)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match &mut self.screen {
            Screen::Catalog => {
                match code {
                    KeyCode::Char('q') => {
                        *exit = true;
                    }
                    KeyCode::Esc => {
                        if matches!(self.catalog.view, CatalogView::All) {
                            *exit = true;
                        } else {
                            self.clear_status();
                            self.catalog.show_all(&self.library);
                        }
                    }
                    KeyCode::Up => self.catalog.move_selection(-1),
                    KeyCode::Down => self.catalog.move_selection(1),
                    KeyCode::PageUp => self.catalog.move_selection(-10),
                    KeyCode::PageDown => self.catalog.move_selection(10),
                    KeyCode::Home => self.catalog.select_first(),
                    KeyCode::End => self.catalog.select_last(),
                    KeyCode::Enter => {
                        if let Some(id) = self.catalog.current_id() {
                            self.clear_status();
                            self.screen = Screen::Detail(id);
                        } else {
                            self.set_status("No book selected.", StatusKind::Error);
                        }
                    }
                    KeyCode::Char('+') => {
                        self.clear_status();
                        return Ok(Mode::AddingBook(BookForm::default()));
                    }
                    KeyCode::Char('e') | KeyCode::Char('E') => return self.begin_edit(),
                    KeyCode::Char('-') => return self.begin_delete(),
                    KeyCode::Char('l') | KeyCode::Char('L') => return self.begin_lend(),
                    KeyCode::Char('r') | KeyCode::Char('R') => self.return_selected(),
                    KeyCode::Char('t') | KeyCode::Char('T') => return self.begin_tags(),
                    KeyCode::Char('f') => {
                        self.clear_status();
                        return Ok(Mode::Searching(SearchState {
                            query: String::new(),
                        }));
                    }
                    KeyCode::Char('F') => {
                        self.clear_status();
                        return Ok(Mode::Filtering(FilterForm::default()));
                    }
                    KeyCode::Char('s') | KeyCode::Char('S') => {
                        self.clear_status();
                        self.screen = Screen::Stats(StatsScreen::new(&self.library));
                    }
                    KeyCode::Char('n') | KeyCode::Char('N') => {
                        self.clear_status();
                        return Ok(Mode::Renaming(RenameForm::with_name(self.library.name())));
                    }
                    KeyCode::Char('x') | KeyCode::Char('X') => self.export_csv(),
                    _ => {}
                }
                Ok(Mode::Normal)
            }
            Screen::Detail(_) => {
                match code {
                    KeyCode::Char('q') => {
                        *exit = true;
                    }
                    KeyCode::Esc | KeyCode::Enter => {
                        self.clear_status();
                        self.screen = Screen::Catalog;
                    }
                    KeyCode::Char('e') | KeyCode::Char('E') => return self.begin_edit(),
                    KeyCode::Char('-') => return self.begin_delete(),
                    KeyCode::Char('l') | KeyCode::Char('L') => return self.begin_lend(),
                    KeyCode::Char('r') | KeyCode::Char('R') => self.return_selected(),
                    KeyCode::Char('t') | KeyCode::Char('T') => return self.begin_tags(),
                    _ => {}
                }
                Ok(Mode::Normal)
            }
            Screen::Stats(report) => {
                match code {
                    KeyCode::Char('q') => {
                        *exit = true;
                    }
                    KeyCode::Esc | KeyCode::Char('s') | KeyCode::Char('S') => {
                        self.screen = Screen::Catalog;
                    }
                    KeyCode::Up => report.scroll_by(-1),
                    KeyCode::Down => report.scroll_by(1),
                    KeyCode::PageUp => report.scroll_by(-10),
                    KeyCode::PageDown => report.scroll_by(10),
                    KeyCode::Home => report.scroll_by(i32::MIN / 2),
                    _ => {}
                }
                Ok(Mode::Normal)
            }
        }
    }

    /// Id of the book the catalog cursor or the detail screen points at.
    fn acting_id(&self) -> Option<usize> {
        match &self.screen {
            Screen::Detail(id) => Some(*id),
            _ => self.catalog.current_id(),
        }
    }

    fn begin_edit(&mut self) -> Result<Mode> {
        match self.acting_id() {
            Some(id) => {
                self.clear_status();
                let book = self.library.get(id)?;
                Ok(Mode::EditingBook {
                    id,
                    form: BookForm::from_book(book),
                })
            }
            None => {
                self.set_status("No book selected to edit.", StatusKind::Error);
                Ok(Mode::Normal)
            }
        }
    }

    fn begin_delete(&mut self) -> Result<Mode> {
        match self.acting_id() {
            Some(id) => {
                self.clear_status();
                let book = self.library.get(id)?;
                Ok(Mode::ConfirmDelete(ConfirmDeleteBook::from_book(id, book)))
            }
            None => {
                self.set_status("No book selected to remove.", StatusKind::Error);
                Ok(Mode::Normal)
            }
        }
    }

    fn begin_lend(&mut self) -> Result<Mode> {
        match self.acting_id() {
            Some(id) => {
                let book = self.library.get(id)?;
                if !book.is_available() {
                    self.set_status(
                        format!("\"{}\" is not available to lend.", book.title),
                        StatusKind::Error,
                    );
                    return Ok(Mode::Normal);
                }
                self.clear_status();
                Ok(Mode::Lending {
                    id,
                    form: LendForm::default(),
                })
            }
            None => {
                self.set_status("No book selected to lend.", StatusKind::Error);
                Ok(Mode::Normal)
            }
        }
    }

    fn begin_tags(&mut self) -> Result<Mode> {
        match self.acting_id() {
            Some(id) => {
                self.clear_status();
                Ok(Mode::EditingTags {
                    id,
                    editor: TagEditor::default(),
                })
            }
            None => {
                self.set_status("No book selected.", StatusKind::Error);
                Ok(Mode::Normal)
            }
        }
    }

    fn return_selected(&mut self) {
        let Some(id) = self.acting_id() else {
            self.set_status("No book selected to return.", StatusKind::Error);
            return;
        };
        let result = self
            .library
            .get_mut(id)
            .and_then(|book| book.return_book());
        match result {
            Ok(()) => {
                let title = self
                    .library
                    .get(id)
                    .map(|book| book.title.clone())
                    .unwrap_or_default();
                self.persist();
                self.catalog.refresh(&self.library);
                self.set_status(format!("Returned \"{title}\"."), StatusKind::Info);
            }
            Err(err) => self.set_status(surface_error(&err.into()), StatusKind::Error),
        }
    }

    fn export_csv(&mut self) {
        let path = match self.library.file_path().parent() {
            Some(parent) => parent.join(EXPORT_FILE_NAME),
            None => EXPORT_FILE_NAME.into(),
        };
        match write_csv(&path, self.library.books()) {
            Ok(()) => self.set_status(
                format!("Exported {} books to {}.", self.library.len(), path.display()),
                StatusKind::Info,
            ),
            Err(err) => self.set_status(surface_error(&err.into()), StatusKind::Error),
        }
    }

    fn handle_add_book(&mut self, code: KeyCode, mut form: BookForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add book cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_book(&form) {
                Ok(title) => {
                    self.set_status(format!("Added \"{title}\"."), StatusKind::Info);
                    keep_open = false;
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingBook(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn save_new_book(&mut self, form: &BookForm) -> Result<String> {
        let book = form.to_book()?;
        let title = book.title.clone();
        self.library.add(book)?;
        self.persist();
        self.catalog.refresh(&self.library);
        self.catalog.select_last();
        Ok(title)
    }

    fn handle_edit_book(&mut self, code: KeyCode, id: usize, mut form: BookForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_existing_book(id, &form) {
                Ok(title) => {
                    self.set_status(format!("Updated \"{title}\"."), StatusKind::Info);
                    keep_open = false;
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::EditingBook { id, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn save_existing_book(&mut self, id: usize, form: &BookForm) -> Result<String> {
        let patch = form.to_patch()?;
        self.library.update(id, patch)?;
        let title = self.library.get(id)?.title.clone();
        self.persist();
        self.catalog.refresh(&self.library);
        Ok(title)
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDeleteBook) -> Result<Mode> {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let removed = self.library.remove(confirm.id)?;
                self.persist();
                // Remaining ids shift down, so leave the detail view.
                self.screen = Screen::Catalog;
                self.catalog.refresh(&self.library);
                self.set_status(format!("Removed \"{}\".", removed.title), StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.set_status("Delete cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn handle_lend(&mut self, code: KeyCode, id: usize, mut form: LendForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Lend cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.lend_book(id, &form) {
                Ok((title, borrower)) => {
                    self.set_status(
                        format!("Lent \"{title}\" to {borrower}."),
                        StatusKind::Info,
                    );
                    keep_open = false;
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::Lending { id, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn lend_book(&mut self, id: usize, form: &LendForm) -> Result<(String, String)> {
        let (borrower, days) = form.parse_inputs()?;
        let book = self.library.get_mut(id)?;
        book.lend(&borrower, days)?;
        let title = book.title.clone();
        self.persist();
        self.catalog.refresh(&self.library);
        Ok((title, borrower))
    }

    fn handle_edit_tags(&mut self, code: KeyCode, id: usize, mut editor: TagEditor) -> Result<Mode> {
        let tag_count = self.library.get(id).map(|book| book.tags.len()).unwrap_or(0);
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.clear_status();
                keep_open = false;
            }
            KeyCode::Up => editor.move_selection(-1, tag_count),
            KeyCode::Down => editor.move_selection(1, tag_count),
            KeyCode::Backspace => editor.backspace(),
            KeyCode::Enter => {
                let tag = editor.take_input();
                if tag.is_empty() {
                    self.set_status("Type a tag to add.", StatusKind::Error);
                } else {
                    self.library.get_mut(id)?.add_tag(&tag);
                    self.persist();
                    self.catalog.refresh(&self.library);
                }
            }
            KeyCode::Delete => {
                let selected = self
                    .library
                    .get(id)?
                    .tags
                    .get(editor.selected)
                    .cloned();
                if let Some(tag) = selected {
                    self.library.get_mut(id)?.remove_tag(&tag);
                    self.persist();
                    self.catalog.refresh(&self.library);
                    let remaining = self.library.get(id)?.tags.len();
                    editor.clamp_selection(remaining);
                }
            }
            KeyCode::Char(ch) => {
                editor.push_char(ch);
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::EditingTags { id, editor })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.clear_status();
                Ok(Mode::Normal)
            }
            KeyCode::Enter => {
                let query = state.query.trim().to_string();
                if query.is_empty() {
                    self.set_status("Search query is empty.", StatusKind::Error);
                    Ok(Mode::Searching(state))
                } else {
                    self.clear_status();
                    self.catalog.show_search(&self.library, query);
                    Ok(Mode::Normal)
                }
            }
            KeyCode::Backspace => {
                state.query.pop();
                Ok(Mode::Searching(state))
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() {
                    state.query.push(ch);
                }
                Ok(Mode::Searching(state))
            }
            _ => Ok(Mode::Searching(state)),
        }
    }

    fn handle_filter(&mut self, code: KeyCode, mut form: FilterForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.clear_status();
                keep_open = false;
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok((criteria, summary)) => {
                    if criteria.is_empty() {
                        self.clear_status();
                        self.catalog.show_all(&self.library);
                    } else {
                        self.clear_status();
                        self.catalog.show_filtered(&self.library, criteria, summary);
                    }
                    keep_open = false;
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::Filtering(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_rename(&mut self, code: KeyCode, mut form: RenameForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Rename cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.library.rename(&form.name) {
                Ok(()) => {
                    self.persist();
                    self.set_status(
                        format!("Library renamed to \"{}\".", self.library.name()),
                        StatusKind::Info,
                    );
                    keep_open = false;
                }
                Err(err) => {
                    let message = surface_error(&err.into());
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::Renaming(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    /// Write the collection to disk, surfacing a footer error on failure.
    /// The in-memory change stays either way.
    fn persist(&mut self) {
        if let Err(err) = self.library.save() {
            self.set_status(
                format!("Failed to save library: {err}"),
                StatusKind::Error,
            );
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Catalog => self.draw_catalog(frame, content_area),
            Screen::Detail(id) => self.draw_detail(frame, content_area, *id),
            Screen::Stats(report) => self.draw_stats(frame, content_area, report),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingBook(form) => self.draw_book_form(frame, area, "Add Book", form),
            Mode::EditingBook { form, .. } => self.draw_book_form(frame, area, "Edit Book", form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Lending { id, form } => self.draw_lend_form(frame, area, *id, form),
            Mode::EditingTags { id, editor } => self.draw_tag_editor(frame, area, *id, editor),
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::Filtering(form) => self.draw_filter_form(frame, area, form),
            Mode::Renaming(form) => self.draw_rename_form(frame, area, form),
            Mode::Normal => {}
        }
    }

    fn catalog_row(&self, id: usize, book: &Book) -> ListItem<'static> {
        let status_style = if book.is_borrowed() {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Green)
        };
        let mut spans = vec![
            Span::raw(format!("{id:>3}  ")),
            Span::raw(book.display_title()),
            Span::raw("  "),
            Span::styled(format!("[{}]", book.status), status_style),
        ];
        if book.rating.is_some() {
            spans.push(Span::raw(format!("  {}", stars(book.rating))));
        }
        ListItem::new(Line::from(spans))
    }

    fn draw_catalog(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.catalog.block_title(&self.library));

        if self.catalog.ids.is_empty() {
            let message = match &self.catalog.view {
                CatalogView::All => "No books yet. Press + to add one.",
                _ => "No books match. Press Esc to show all.",
            };
            let paragraph = Paragraph::new(message)
                .block(block)
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = self
            .catalog
            .ids
            .iter()
            .filter_map(|&id| self.library.get(id).ok().map(|book| self.catalog_row(id, book)))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(Color::Cyan)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(self.catalog.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect, id: usize) {
        let Ok(book) = self.library.get(id) else {
            return;
        };

        let field = |label: &str, value: String| -> Line<'static> {
            Line::from(vec![
                Span::styled(
                    format!("{label:<12}"),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(value),
            ])
        };

        let mut lines = vec![
            field("Title", book.title.clone()),
            field("Author", book.author.clone()),
        ];
        if !book.isbn.is_empty() {
            lines.push(field("ISBN", book.isbn.clone()));
        }
        if !book.genre.is_empty() {
            lines.push(field("Genre", book.genre.clone()));
        }
        if let Some(year) = book.year {
            lines.push(field("Year", year.to_string()));
        }
        if !book.publisher.is_empty() {
            lines.push(field("Publisher", book.publisher.clone()));
        }
        if let Some(pages) = book.pages {
            lines.push(field("Pages", pages.to_string()));
        }
        lines.push(field("Location", book.location.clone()));
        lines.push(field("Status", book.status.clone()));
        if book.is_borrowed() {
            lines.push(field("Borrower", book.borrowed_by.clone()));
            lines.push(field("Since", book.borrowed_date.clone()));
            let overdue = book
                .due_date_parsed()
                .is_some_and(|due| due < Local::now().date_naive());
            if overdue {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{:<12}", "Due"),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("{} (overdue)", book.due_date),
                        Style::default().fg(Color::Red),
                    ),
                ]));
            } else {
                lines.push(field("Due", book.due_date.clone()));
            }
        }
        if book.rating.is_some() {
            lines.push(field("Rating", stars(book.rating)));
        }
        if !book.tags.is_empty() {
            lines.push(field("Tags", book.tags.join(", ")));
        }
        lines.push(field("Added", book.date_added.clone()));
        if !book.description.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(book.description.clone()));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Book {id}"));
        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_stats(&self, frame: &mut Frame, area: Rect, report: &StatsScreen) {
        let lines: Vec<Line> = report
            .display_lines()
            .into_iter()
            .map(Line::from)
            .collect();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Statistics: {}", self.library.name()));
        let paragraph = Paragraph::new(lines)
            .block(block)
            .scroll((report.scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let pair = |key: &str, action: &str| {
            vec![
                Span::styled(key.to_string(), key_style),
                Span::raw(format!(" {action}   ")),
            ]
        };

        match (&self.screen, &self.mode) {
            (_, Mode::Searching(_)) => Line::from(
                [pair("[Enter]", "Search"), pair("[Esc]", "Cancel")].concat(),
            ),
            (_, Mode::Filtering(_)) => Line::from(
                [
                    pair("[Tab]", "Next Field"),
                    pair("[Enter]", "Apply"),
                    pair("[Esc]", "Cancel"),
                ]
                .concat(),
            ),
            (_, Mode::AddingBook(_) | Mode::EditingBook { .. }) => Line::from(
                [
                    pair("[Tab]", "Next Field"),
                    pair("[Enter]", "Save"),
                    pair("[Esc]", "Cancel"),
                ]
                .concat(),
            ),
            (_, Mode::Lending { .. }) => Line::from(
                [
                    pair("[Tab]", "Switch Field"),
                    pair("[Enter]", "Lend"),
                    pair("[Esc]", "Cancel"),
                ]
                .concat(),
            ),
            (_, Mode::EditingTags { .. }) => Line::from(
                [
                    pair("[Enter]", "Add Tag"),
                    pair("[↑↓]", "Select"),
                    pair("[Del]", "Remove"),
                    pair("[Esc]", "Done"),
                ]
                .concat(),
            ),
            (_, Mode::ConfirmDelete(_)) => Line::from(
                [pair("[y]", "Delete"), pair("[n]", "Keep")].concat(),
            ),
            (_, Mode::Renaming(_)) => Line::from(
                [pair("[Enter]", "Rename"), pair("[Esc]", "Cancel")].concat(),
            ),
            (Screen::Catalog, Mode::Normal) => Line::from(
                [
                    pair("[Enter]", "Open"),
                    pair("[+]", "Add"),
                    pair("[e]", "Edit"),
                    pair("[-]", "Remove"),
                    pair("[l]", "Lend"),
                    pair("[r]", "Return"),
                    pair("[t]", "Tags"),
                    pair("[f]", "Search"),
                    pair("[F]", "Filter"),
                    pair("[s]", "Stats"),
                    pair("[n]", "Rename"),
                    pair("[x]", "Export"),
                    pair("[q]", "Quit"),
                ]
                .concat(),
            ),
            (Screen::Detail(_), Mode::Normal) => Line::from(
                [
                    pair("[e]", "Edit"),
                    pair("[-]", "Remove"),
                    pair("[l]", "Lend"),
                    pair("[r]", "Return"),
                    pair("[t]", "Tags"),
                    pair("[Esc]", "Back"),
                ]
                .concat(),
            ),
            (Screen::Stats(_), Mode::Normal) => Line::from(
                [pair("[↑↓]", "Scroll"), pair("[Esc]", "Back")].concat(),
            ),
        }
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        let cursor_y = inner.y;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BookForm) {
        let popup_area = centered_rect(70, 70, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = BookField::ORDER
            .iter()
            .map(|(field, _)| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch fields • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let prefix = form.active.label().len() as u16 + 2;
        let cursor_x = inner.x + prefix + form.value_len(form.active) as u16;
        let cursor_y = inner.y + form.active.row() as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_lend_form(&self, frame: &mut Frame, area: Rect, id: usize, form: &LendForm) {
        let popup_area = centered_rect(60, 35, area);
        frame.render_widget(Clear, popup_area);

        let title = self
            .library
            .get(id)
            .map(|book| format!("Lend \"{}\"", book.title))
            .unwrap_or_else(|_| "Lend Book".to_string());
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line(LendField::Borrower),
            form.build_line(LendField::Days),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to lend • Tab to switch fields • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (cursor_x, cursor_y) = match form.active {
            LendField::Borrower => (
                inner.x + "Borrower: ".len() as u16 + form.value_len(LendField::Borrower) as u16,
                inner.y,
            ),
            LendField::Days => (
                inner.x + "Days: ".len() as u16 + form.value_len(LendField::Days) as u16,
                inner.y + 1,
            ),
        };
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_filter_form(&self, frame: &mut Frame, area: Rect, form: &FilterForm) {
        let popup_area = centered_rect(60, 55, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Filter Books").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = FilterField::ORDER
            .iter()
            .map(|(field, _)| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Empty fields match anything • Enter to apply • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let prefix = form.active.label().len() as u16 + 2;
        let cursor_x = inner.x + prefix + form.value_len(form.active) as u16;
        let cursor_y = inner.y + form.active.row() as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_rename_form(&self, frame: &mut Frame, area: Rect, form: &RenameForm) {
        let popup_area = centered_rect(60, 25, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Rename Library").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![Line::from(vec![
            Span::raw("Name: "),
            Span::styled(form.name.clone(), Style::default().fg(Color::Yellow)),
        ])];
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to rename • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + "Name: ".len() as u16 + form.name.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_tag_editor(&self, frame: &mut Frame, area: Rect, id: usize, editor: &TagEditor) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let title = self
            .library
            .get(id)
            .map(|book| format!("Tags for \"{}\"", book.title))
            .unwrap_or_else(|_| "Tags".to_string());
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            Line::from(vec![
                Span::raw("New tag: "),
                Span::styled(editor.input.clone(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(""),
        ];

        if let Ok(book) = self.library.get(id) {
            if book.tags.is_empty() {
                lines.push(Line::from(Span::styled(
                    "No tags yet.",
                    Style::default().fg(Color::DarkGray),
                )));
            } else {
                for (index, tag) in book.tags.iter().enumerate() {
                    let style = if index == editor.selected {
                        Style::default().bg(Color::Cyan).fg(Color::Black)
                    } else {
                        Style::default()
                    };
                    lines.push(Line::from(Span::styled(format!("  {tag}"), style)));
                }
            }
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + "New tag: ".len() as u16 + editor.input.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDeleteBook) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Remove Book").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Remove \"{}\" by {}?",
                confirm.title, confirm.author
            )),
            Line::from(""),
            Line::from(Span::styled(
                "y to remove • n or Esc to keep",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Book;

    fn app_with_one_book() -> App {
        let mut library = Library::at("unused.json");
        library
            .add(Book::new("Dune", "Frank Herbert").unwrap())
            .unwrap();
        App::new(library)
    }

    #[test]
    fn edit_key_opens_a_prefilled_form() {
        let mut app = app_with_one_book();
        app.set_status("stale", StatusKind::Info);

        let exit = app.handle_key(KeyCode::Char('e')).unwrap();
        assert!(!exit);
        assert!(app.status.is_none());
        match &app.mode {
            Mode::EditingBook { id, form } => {
                assert_eq!(*id, 0);
                assert_eq!(form.title, "Dune");
                assert_eq!(form.author, "Frank Herbert");
            }
            _ => panic!("expected the edit form to open"),
        }
    }

    #[test]
    fn delete_key_opens_a_confirmation() {
        let mut app = app_with_one_book();
        app.set_status("stale", StatusKind::Info);

        app.handle_key(KeyCode::Char('-')).unwrap();
        assert!(app.status.is_none());
        assert!(
            matches!(&app.mode, Mode::ConfirmDelete(confirm) if confirm.id == 0 && confirm.title == "Dune")
        );
    }

    #[test]
    fn edit_key_without_a_selection_reports_an_error() {
        let mut app = App::new(Library::at("unused.json"));
        app.handle_key(KeyCode::Char('e')).unwrap();
        assert!(matches!(app.mode, Mode::Normal));
        assert!(matches!(
            &app.status,
            Some(StatusMessage { kind: StatusKind::Error, .. })
        ));
    }
}
