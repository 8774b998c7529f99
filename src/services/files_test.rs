use super::*;

fn store() -> (tempfile::TempDir, DiagramFiles) {
    let dir = tempfile::tempdir().unwrap();
    let files = DiagramFiles::new(dir.path());
    (dir, files)
}

#[test]
fn name_validation() {
    assert!(validate_name("flow.mmd").is_ok());
    assert!(validate_name("seq.mermaid").is_ok());
    assert!(validate_name("notes.txt").is_err());
    assert!(validate_name("../secret.mmd").is_err());
    assert!(validate_name("sub/flow.mmd").is_err());
    assert!(validate_name("sub\\flow.mmd").is_err());
    assert!(validate_name(".mmd").is_err());
    assert!(validate_name("").is_err());
}

#[tokio::test]
async fn save_then_load() {
    let (_dir, files) = store();
    files.save("flow.mmd", "flowchart TD\nA-->B").await.unwrap();
    assert_eq!(files.load("flow.mmd").await.unwrap(), "flowchart TD\nA-->B");
}

#[tokio::test]
async fn load_missing_is_not_found() {
    let (_dir, files) = store();
    assert!(matches!(files.load("nope.mmd").await, Err(FileError::NotFound)));
}

#[tokio::test]
async fn rejects_other_extensions() {
    let (dir, files) = store();
    std::fs::write(dir.path().join("server.js"), "x").unwrap();
    assert!(matches!(files.load("server.js").await, Err(FileError::InvalidName)));
    assert!(matches!(files.save("evil.sh", "rm -rf").await, Err(FileError::InvalidName)));
    assert!(!dir.path().join("evil.sh").exists());
}

#[tokio::test]
async fn list_returns_sorted_diagram_files_only() {
    let (dir, files) = store();
    for name in ["b.mmd", "a.mermaid", "readme.md", "c.mmd.bak"] {
        std::fs::write(dir.path().join(name), "x").unwrap();
    }
    assert_eq!(files.list().await.unwrap(), vec!["a.mermaid".to_owned(), "b.mmd".to_owned()]);
}

#[tokio::test]
async fn list_missing_directory_is_io_error() {
    let files = DiagramFiles::new("/nonexistent/mermaid-live-dir");
    assert!(matches!(files.list().await, Err(FileError::Io(_))));
}
