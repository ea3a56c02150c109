//! Core library surface for the Personal Library Manager TUI application.
//!
//! The public modules exposed here keep the API intentionally small so the
//! `bin` target as well as potential external tooling can reuse the same
//! pieces: the `Book`/`Library` data layer, the JSON document persistence,
//! and the interactive front end.
pub mod error;
pub mod export;
pub mod library;
pub mod models;
pub mod stats;
pub mod storage;
pub mod ui;

/// Error taxonomy shared by every core operation.
pub use error::{LibraryError, Result};

/// The catalog collection and its typed query/update inputs.
pub use library::{BookPatch, FilterCriteria, Library, SearchField, DEFAULT_LIBRARY_NAME};

/// The primary domain type other layers manipulate.
pub use models::{Book, DEFAULT_LOAN_DAYS, STATUS_AVAILABLE, STATUS_BORROWED};

/// Aggregates rendered by the statistics screen.
pub use stats::LibraryStats;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
