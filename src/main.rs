//! Binary entry point that glues the JSON-backed catalog to the TUI. The
//! bootstrapping pipeline is short: resolve the document path, hydrate the
//! library from disk, and drive the Ratatui event loop until the user exits.
use anyhow::{anyhow, Context};
use personal_library_manager::{run_app, storage, App, Library};

/// Load the persisted library (a missing file just starts empty) and launch
/// the event loop. Returning a `Result` bubbles fatal initialization problems
/// to the terminal instead of crashing silently.
fn main() -> anyhow::Result<()> {
    let path = storage::default_document_path()
        .ok_or_else(|| anyhow!("could not locate home directory"))?;

    let mut library = Library::at(&path);
    library
        .load()
        .with_context(|| format!("failed to load library from {}", path.display()))?;

    let mut app = App::new(library);
    run_app(&mut app)
}
