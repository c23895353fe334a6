use md5::{Digest, Md5};
use tempfile::TempDir;
use unistore::vfs::{EntryKind, StorageFacade, UploadFields, VfsError};

fn facade() -> (TempDir, StorageFacade) {
    let tmp = TempDir::new().unwrap();
    let facade = StorageFacade::local(tmp.path().to_string_lossy().to_string());
    (tmp, facade)
}

fn names(entries: Vec<unistore::vfs::Entry>) -> Vec<String> {
    entries.into_iter().map(|e| e.name).collect()
}

#[tokio::test]
async fn directory_scenario() {
    let (_tmp, mut storage) = facade();

    storage.mkdir("foo").await.unwrap();
    storage.put_file_contents("foo/a.txt", b"1").await.unwrap();

    assert!(names(storage.list_dirs(None).await.unwrap()).contains(&"foo/".to_string()));

    assert_eq!(
        storage.md5_file("foo/a.txt").await.unwrap(),
        Some(hex::encode(Md5::digest(b"1")))
    );

    storage.chdir(Some("foo")).await.unwrap();
    assert!(names(storage.list_files(None).await.unwrap()).contains(&"a.txt".to_string()));

    storage.chdir(None).await.unwrap();
    assert_eq!(storage.current_dir(), storage.base_dir());
}

#[tokio::test]
async fn contents_round_trip() {
    let (_tmp, storage) = facade();

    storage.put_file_contents("x.txt", b"hello").await.unwrap();
    assert_eq!(
        storage.fetch_file("x.txt").await.unwrap().as_deref(),
        Some(&b"hello"[..])
    );
    assert!(storage.replace_file_contents("x.txt", b"world").await.unwrap());
    assert_eq!(storage.get_file_size("x.txt").await.unwrap(), Some(5));

    assert!(storage.delete_file("x.txt").await.unwrap());
    assert!(!storage.file_exists("x.txt").await.unwrap());
}

#[tokio::test]
async fn listing_puts_directories_first_and_filters() {
    let (_tmp, storage) = facade();
    storage.mkdir("logs").await.unwrap();
    storage.mkdir("assets").await.unwrap();
    for name in ["a.txt", "b.log", "a.log"] {
        storage.put_file_contents(name, b"x").await.unwrap();
    }

    assert_eq!(
        names(storage.list_all(None).await.unwrap()),
        vec!["assets/", "logs/", "a.log", "a.txt", "b.log"]
    );
    assert_eq!(
        names(storage.list_files(Some("*.log")).await.unwrap()),
        vec!["a.log", "b.log"]
    );
    assert_eq!(
        names(storage.list_all(Some("a*")).await.unwrap()),
        vec!["assets/", "a.log", "a.txt"]
    );
    assert_eq!(
        names(storage.list_dirs(Some("logs")).await.unwrap()),
        vec!["logs/"]
    );
}

#[tokio::test]
async fn leading_separators_resolve_to_the_same_file() {
    let (_tmp, storage) = facade();
    storage.put_file_contents("/a.txt", b"1").await.unwrap();
    assert!(storage.is_file("a.txt").await.unwrap());
    assert!(storage.is_file("./a.txt").await.unwrap());
    assert!(storage.is_file("\\a.txt").await.unwrap());
}

#[tokio::test]
async fn rename_and_external_moves() {
    let (_tmp, storage) = facade();
    let outside = TempDir::new().unwrap();
    let external = outside.path().join("out.txt");
    let external = external.to_string_lossy().to_string();

    storage.put_file_contents("a.txt", b"data").await.unwrap();
    assert!(storage.rename_file("a.txt", "b.txt").await.unwrap());
    assert!(!storage.file_exists("a.txt").await.unwrap());

    assert!(storage.move_file_to_external("b.txt", &external).await.unwrap());
    assert!(!storage.file_exists("b.txt").await.unwrap());
    assert_eq!(std::fs::read(&external).unwrap(), b"data");

    assert!(storage.copy_file_from_external(&external, "c.txt").await.unwrap());
    assert!(storage.move_file_from_external(&external, "d.txt").await.unwrap());
    assert!(!std::path::Path::new(&external).exists());
    assert!(!storage.move_file_from_external(&external, "e.txt").await.unwrap());
    assert_eq!(
        storage.fetch_file("d.txt").await.unwrap().as_deref(),
        Some(&b"data"[..])
    );
}

#[tokio::test]
async fn put_file_copies_or_moves_the_source() {
    let (_tmp, storage) = facade();
    let incoming = TempDir::new().unwrap();
    let source = incoming.path().join("photo.png");
    std::fs::write(&source, b"png").unwrap();

    assert!(storage.put_file(&source, true).await.unwrap());
    assert!(source.exists());
    storage.delete_file("photo.png").await.unwrap();

    assert!(storage.put_file(&source, false).await.unwrap());
    assert!(!source.exists());
    assert!(storage.is_file("photo.png").await.unwrap());

    assert!(!storage.put_file(&source, true).await.unwrap());
}

#[tokio::test]
async fn upload_needs_an_existing_temporary_file() {
    let (_tmp, storage) = facade();
    let err = storage
        .upload_file(UploadFields {
            tmp_name: Some("/definitely/not/here".to_string()),
            name: Some("a.txt".to_string()),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, VfsError::NotFound(_)));
}

#[tokio::test]
async fn metadata_for_files_and_directories() {
    let (_tmp, storage) = facade();
    storage.mkdir("d").await.unwrap();
    storage.put_file_contents("f.txt", b"12345").await.unwrap();

    let info = storage.fetch_file_info("f.txt").await.unwrap().unwrap();
    assert_eq!(info.kind, Some(EntryKind::File));
    assert_eq!(info.size, Some(5));
    assert!(info.modified.is_some());
    assert_eq!(info.checksum, Some(hex::encode(Md5::digest(b"12345"))));

    assert!(storage.is_dir("d").await.unwrap());
    assert!(!storage.is_file("d").await.unwrap());
    assert!(storage.get_file_mtime("d").await.unwrap().is_some());
    assert_eq!(storage.fetch_file_info("missing").await.unwrap(), None);

    storage.rmdir("d").await.unwrap();
    assert!(!storage.is_dir("d").await.unwrap());
}
