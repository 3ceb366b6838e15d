use std::fs;

use tempfile::TempDir;
use vidgen_engine::{ensure_dir, AtomicFileWriter, PersistError};

#[test]
fn creates_missing_target_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("downloads").join("abc123");
    assert!(!new_dir.exists());
    ensure_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path());

    let first = writer.write("abc123.mp4", b"first").unwrap();
    assert_eq!(first.file_name().unwrap(), "abc123.mp4");
    assert_eq!(fs::read(&first).unwrap(), b"first");

    let second = writer.write("abc123.mp4", b"second").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"second");
}

#[test]
fn file_in_place_of_directory_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("abc123.mp4", b"data");
    assert!(matches!(result, Err(PersistError::TargetDir(_))));
    assert!(!file_path.with_file_name("abc123.mp4").exists());
}
