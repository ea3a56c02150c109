//! End-to-end persistence coverage: a library written to disk can be read
//! back intact, and broken documents fail loudly without touching state.

use personal_library_manager::{Book, Library, LibraryError};
use tempfile::TempDir;

fn sample_library(path: &std::path::Path) -> Library {
    let mut library = Library::with_path("Home Shelf", path);

    let mut dune = Book::new("Dune", "Frank Herbert").unwrap();
    dune.genre = "Science Fiction".to_string();
    dune.year = Some(1965);
    dune.rating = Some(5);
    dune.add_tag("desert");
    dune.add_tag("classic");
    library.add(dune).unwrap();

    let mut hobbit = Book::new("The Hobbit", "J.R.R. Tolkien").unwrap();
    hobbit.genre = "Fantasy".to_string();
    hobbit.year = Some(1937);
    library.add(hobbit).unwrap();

    library
}

#[test]
fn save_then_load_reproduces_the_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("library.json");

    let mut original = sample_library(&path);
    original
        .get_mut(1)
        .unwrap()
        .lend("Paul Atreides", 14)
        .unwrap();
    original.save().unwrap();

    let mut loaded = Library::at(&path);
    loaded.load().unwrap();

    assert_eq!(loaded.name(), "Home Shelf");
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.get(0).unwrap().title, "Dune");
    assert_eq!(loaded.get(0).unwrap().tags, vec!["desert", "classic"]);
    assert_eq!(loaded.get(1).unwrap().borrowed_by, "Paul Atreides");
    assert!(loaded.get(1).unwrap().is_borrowed());
    assert_eq!(loaded.get(1).unwrap().due_date, original.get(1).unwrap().due_date);
}

#[test]
fn load_missing_file_keeps_current_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.json");

    let mut library = sample_library(&path);
    library.load().unwrap();

    assert_eq!(library.name(), "Home Shelf");
    assert_eq!(library.len(), 2);
}

#[test]
fn corrupt_document_fails_and_leaves_state_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("library.json");
    std::fs::write(&path, "{not json at all").unwrap();

    let mut library = sample_library(&path);
    let err = library.load().unwrap_err();

    assert!(matches!(err, LibraryError::CorruptDocument(_)));
    assert_eq!(library.len(), 2);
    assert_eq!(library.get(0).unwrap().title, "Dune");
}

#[test]
fn record_missing_title_is_a_schema_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("library.json");
    std::fs::write(
        &path,
        r#"{"name": "Home Shelf", "books": [{"author": "Frank Herbert"}]}"#,
    )
    .unwrap();

    let mut library = Library::at(&path);
    let err = library.load().unwrap_err();
    assert!(matches!(err, LibraryError::Schema(_)));
}

#[test]
fn save_replaces_atomically_with_no_leftover_temp_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("library.json");

    let library = sample_library(&path);
    library.save().unwrap();
    library.save().unwrap();

    let entries: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["library.json"]);
}

#[test]
fn save_to_and_load_from_rebind_the_path() {
    let dir = TempDir::new().unwrap();
    let original_path = dir.path().join("library.json");
    let copy_path = dir.path().join("backup.json");

    let mut library = sample_library(&original_path);
    library.save_to(&copy_path).unwrap();
    assert_eq!(library.file_path(), copy_path.as_path());
    assert!(copy_path.is_file());
    assert!(!original_path.exists());

    let mut restored = Library::at(&original_path);
    restored.load_from(&copy_path).unwrap();
    assert_eq!(restored.file_path(), copy_path.as_path());
    assert_eq!(restored.name(), "Home Shelf");
    assert_eq!(restored.len(), 2);
}

#[test]
fn save_creates_missing_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deep").join("library.json");

    let library = sample_library(&path);
    library.save().unwrap();

    assert!(path.is_file());
}

#[test]
fn unknown_status_round_trips_unchanged() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("library.json");
    std::fs::write(
        &path,
        r#"{"name": "Home Shelf", "books": [{"title": "Dune", "author": "Frank Herbert", "status": "Lost"}]}"#,
    )
    .unwrap();

    let mut library = Library::at(&path);
    library.load().unwrap();
    assert_eq!(library.get(0).unwrap().status, "Lost");

    library.save().unwrap();
    let mut reloaded = Library::at(&path);
    reloaded.load().unwrap();
    assert_eq!(reloaded.get(0).unwrap().status, "Lost");
}
