use super::*;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("should write test file");
    path
}

#[test]
fn detects_kind_from_extension() {
    assert_eq!(
        DocumentKind::from_path(Path::new("report.PDF")),
        Some(DocumentKind::Pdf)
    );
    assert_eq!(
        DocumentKind::from_path(Path::new("notes.txt")),
        Some(DocumentKind::PlainText)
    );
    assert_eq!(DocumentKind::from_path(Path::new("image.png")), None);
    assert_eq!(DocumentKind::from_path(Path::new("no_extension")), None);
}

#[test]
fn missing_file_is_unreadable() {
    let dir = TempDir::new().expect("temp dir");
    let result = DocumentLoader::new().load(&dir.path().join("missing.pdf"));

    assert!(matches!(result, Err(RagError::UnreadableDocument(_))));
}

#[test]
fn unsupported_extension_is_unreadable() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(&dir, "slides.pptx", b"binary");

    assert!(matches!(
        DocumentLoader::new().load(&path),
        Err(RagError::UnreadableDocument(_))
    ));
}

#[test]
fn non_pdf_bytes_are_unreadable() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(&dir, "fake.pdf", b"this is not a pdf at all");

    let err = DocumentLoader::new().load(&path).expect_err("not a pdf");
    assert!(matches!(err, RagError::UnreadableDocument(ref m) if m.contains("not a PDF")));
}

#[test]
fn blank_text_counts_as_unreadable() {
    let dir = TempDir::new().expect("temp dir");
    let empty = write(&dir, "empty.txt", b"");
    let blank = write(&dir, "blank.txt", b"  \n\t \n");

    for path in [empty, blank] {
        let err = DocumentLoader::new().load(&path).expect_err("no text");
        assert!(matches!(err, RagError::UnreadableDocument(ref m) if m.contains("could not extract")));
    }
}

#[test]
fn plain_text_loads_as_one_unit() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(&dir, "notes.md", "# Title\n\nSome body text.".as_bytes());

    let units = DocumentLoader::new().load(&path).expect("loads");
    assert_eq!(units, vec!["# Title\n\nSome body text.".to_string()]);
}

#[test]
fn directory_is_unreadable() {
    let dir = TempDir::new().expect("temp dir");
    let nested = dir.path().join("folder.pdf");
    fs::create_dir(&nested).expect("create dir");

    assert!(matches!(
        DocumentLoader::new().load(&nested),
        Err(RagError::UnreadableDocument(_))
    ));
}
