//! Startup loading: file on disk → projector.

use std::io::Write;

use tempfile::NamedTempFile;

use common::{FilesystemOps, ProjectionError};
use xmlfs_daemon::{load, LoadError};

const DOC: &str = "<?xml version=\"1.0\"?>\n<!-- export -->\n<root>\n  <a/>\n  <b>x</b>\n  <a/>\n</root>\n";

fn write_doc(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_preserves_original_text() {
    let file = write_doc(DOC);
    let projector = load(file.path()).unwrap();

    let attr = projector.get_attributes("/#contents").unwrap();
    assert_eq!(attr.size, DOC.len() as u64);

    let bytes = projector.read("/#contents", DOC.len() * 2, 0).unwrap();
    assert_eq!(&*bytes, DOC.as_bytes());
}

#[test]
fn test_load_copies_file_timestamps() {
    let file = write_doc(DOC);
    let metadata = std::fs::metadata(file.path()).unwrap();
    let projector = load(file.path()).unwrap();

    let times = projector.times();
    assert_eq!(times.modified, metadata.modified().unwrap());

    let dir = projector.get_attributes("/root").unwrap();
    let contents = projector.get_attributes("/root/b/#contents").unwrap();
    assert_eq!(dir.times, times);
    assert_eq!(contents.times, times);
}

#[test]
fn test_loaded_projection() {
    let file = write_doc(DOC);
    let projector = load(file.path()).unwrap();

    assert_eq!(
        projector.list_directory("/root", 0),
        [".", "..", "#contents", "a[1]", "b", "a[2]"]
    );
    assert_eq!(
        &*projector.read("/root/b/#contents", 64, 0).unwrap(),
        b"<b>x</b>"
    );
    assert!(matches!(
        projector.get_attributes("/root/c"),
        Err(ProjectionError::NotFound { .. })
    ));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("absent.xml");
    let err = load(&path).unwrap_err();
    assert!(matches!(err, LoadError::Read { .. }));
    assert!(err.to_string().contains("absent.xml"));
}

#[test]
fn test_unparsable_file() {
    let file = write_doc("<root><unclosed></root>");
    assert!(matches!(
        load(file.path()).unwrap_err(),
        LoadError::Document { .. }
    ));
}

#[test]
fn test_non_utf8_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&[0x3c, 0x72, 0x3e, 0xff, 0x3c, 0x2f, 0x72, 0x3e])
        .unwrap();
    assert!(matches!(
        load(file.path()).unwrap_err(),
        LoadError::Read { .. }
    ));
}
