use async_trait::async_trait;
use std::sync::Arc;
use tempfile::TempDir;
use unistore::vfs::storage::object_store::{ObjectListing, ObjectMeta, StoredObject};
use unistore::vfs::storage::ObjectStoreClient;
use unistore::vfs::{
    EntryKind, MemoryObjectStore, StorageFacade, UploadFields, VfsError, VfsResult,
};

fn names(entries: Vec<unistore::vfs::Entry>) -> Vec<String> {
    entries.into_iter().map(|e| e.name).collect()
}

fn facade() -> (Arc<MemoryObjectStore>, StorageFacade) {
    let client = Arc::new(MemoryObjectStore::new());
    let facade = StorageFacade::object_store("s3://media", client.clone());
    (client, facade)
}

#[tokio::test]
async fn directories_are_markers_or_common_prefixes() {
    let (client, mut storage) = facade();

    storage.mkdir("empty").await.unwrap();
    storage.put_file_contents("photos/cat.jpg", b"meow").await.unwrap();
    storage.put_file_contents("readme.md", b"# hi").await.unwrap();

    assert!(client.head_object("media", "empty/").await.unwrap().is_some());
    assert_eq!(
        names(storage.list_all(None).await.unwrap()),
        vec!["empty/", "photos/", "readme.md"]
    );
    assert!(storage.is_dir("photos").await.unwrap());
    assert!(storage.is_dir("empty").await.unwrap());
    assert!(!storage.is_dir("readme.md").await.unwrap());

    storage.chdir(Some("photos")).await.unwrap();
    assert_eq!(storage.current_dir(), "s3://media/photos");
    assert_eq!(names(storage.list_files(None).await.unwrap()), vec!["cat.jpg"]);
    assert!(storage.list_dirs(None).await.unwrap().is_empty());

    let info = storage.fetch_file_info("cat.jpg").await.unwrap().unwrap();
    assert_eq!(info.kind, Some(EntryKind::File));
    assert_eq!(info.size, Some(4));
    assert_eq!(info.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(info.checksum, storage.md5_file("cat.jpg").await.unwrap());
}

#[tokio::test]
async fn base_dir_may_carry_a_key_root() {
    let client = Arc::new(MemoryObjectStore::new());
    let mut storage = StorageFacade::object_store("s3://media/tenant-a", client.clone());

    storage.put_file_contents("a.txt", b"1").await.unwrap();
    assert!(client.head_object("media", "tenant-a/a.txt").await.unwrap().is_some());

    storage.mkdir("docs").await.unwrap();
    storage.chdir(Some("docs")).await.unwrap();
    storage.put_file_contents("b.txt", b"2").await.unwrap();
    assert!(client
        .head_object("media", "tenant-a/docs/b.txt")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn md5_is_the_unquoted_etag() {
    let (_client, storage) = facade();
    storage.put_file_contents("x.txt", b"hello").await.unwrap();
    assert_eq!(
        storage.md5_file("x.txt").await.unwrap().as_deref(),
        Some("5d41402abc4b2a76b9719d911017c592")
    );
    assert_eq!(storage.md5_file("y.txt").await.unwrap(), None);
}

#[tokio::test]
async fn missing_sources_are_tolerated() {
    let (_client, storage) = facade();
    assert!(!storage.copy_file("a", "b").await.unwrap());
    assert!(!storage.rename_file("a", "b").await.unwrap());
    assert!(!storage.delete_file("a").await.unwrap());
    assert!(!storage.replace_file_contents("a", b"x").await.unwrap());
    assert!(!storage.delete_external("s3://other/a").await.unwrap());
    assert_eq!(storage.fetch_file("a").await.unwrap(), None);
    assert_eq!(storage.fetch_file_info("a").await.unwrap(), None);
    assert_eq!(storage.get_file_type("a").await.unwrap(), None);
    storage.rmdir("nothing").await.unwrap();
}

#[tokio::test]
async fn rmdir_removes_everything_under_the_prefix() {
    let (client, storage) = facade();
    storage.mkdir("tmp").await.unwrap();
    storage.put_file_contents("tmp/a", b"1").await.unwrap();
    storage.put_file_contents("tmp/deep/b", b"2").await.unwrap();
    storage.put_file_contents("tmpfile", b"3").await.unwrap();

    storage.rmdir("tmp").await.unwrap();

    let left = client.list_objects("media", None, None).await.unwrap();
    let keys: Vec<_> = left.contents.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(keys, vec!["tmpfile"]);
}

#[tokio::test]
async fn external_targets_in_other_buckets_and_on_disk() {
    let (client, storage) = facade();
    let outside = TempDir::new().unwrap();
    let local = outside.path().join("copy.bin");
    let local = local.to_string_lossy().to_string();

    storage.put_file_contents("a.bin", b"abc").await.unwrap();

    assert!(storage
        .copy_file_to_external("a.bin", "s3://backup/2025/a.bin")
        .await
        .unwrap());
    assert!(client.head_object("backup", "2025/a.bin").await.unwrap().is_some());

    assert!(storage.move_file_to_external("a.bin", &local).await.unwrap());
    assert!(!storage.file_exists("a.bin").await.unwrap());
    assert_eq!(std::fs::read(&local).unwrap(), b"abc");

    assert!(storage
        .move_file_from_external("s3://backup/2025/a.bin", "restored.bin")
        .await
        .unwrap());
    assert!(client.head_object("backup", "2025/a.bin").await.unwrap().is_none());
    assert!(storage.is_file("restored.bin").await.unwrap());

    let err = storage
        .copy_file_to_external("restored.bin", "s3://bucket-only")
        .await
        .unwrap_err();
    assert!(matches!(err, VfsError::InvalidArgument(_)));
}

/// 删除总是失败的对象存储，其余操作交给内存实现
struct RejectingDeletes {
    inner: MemoryObjectStore,
}

#[async_trait]
impl ObjectStoreClient for RejectingDeletes {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> VfsResult<()> {
        self.inner.put_object(bucket, key, body).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> VfsResult<Option<StoredObject>> {
        self.inner.get_object(bucket, key).await
    }

    async fn head_object(&self, bucket: &str, key: &str) -> VfsResult<Option<ObjectMeta>> {
        self.inner.head_object(bucket, key).await
    }

    async fn delete_object(&self, _bucket: &str, key: &str) -> VfsResult<()> {
        Err(VfsError::RemoteFailure(format!("delete denied: {}", key)))
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        delimiter: Option<&str>,
    ) -> VfsResult<ObjectListing> {
        self.inner.list_objects(bucket, prefix, delimiter).await
    }
}

#[tokio::test]
async fn failed_delete_leaves_both_copies_and_reports_the_error() {
    let client = Arc::new(RejectingDeletes {
        inner: MemoryObjectStore::new(),
    });
    let storage = StorageFacade::object_store("s3://media", client.clone());
    storage.put_file_contents("a.bin", b"abc").await.unwrap();

    let err = storage
        .move_file_to_external("a.bin", "s3://backup/a.bin")
        .await
        .unwrap_err();
    assert!(matches!(err, VfsError::RemoteFailure(_)));
    assert!(client.head_object("media", "a.bin").await.unwrap().is_some());
    assert!(client.head_object("backup", "a.bin").await.unwrap().is_some());

    assert!(storage.rename_file("a.bin", "b.bin").await.is_err());
    assert!(storage.is_file("a.bin").await.unwrap());
    assert!(storage.is_file("b.bin").await.unwrap());

    assert!(storage
        .move_file_from_external("s3://backup/a.bin", "c.bin")
        .await
        .is_err());
    assert!(client.head_object("backup", "a.bin").await.unwrap().is_some());
    assert!(storage.is_file("c.bin").await.unwrap());
}

#[tokio::test]
async fn upload_moves_the_temporary_file_into_the_bucket() {
    let (_client, mut storage) = facade();
    let incoming = TempDir::new().unwrap();
    let tmp = incoming.path().join("upload_1");
    std::fs::write(&tmp, b"report").unwrap();

    storage.mkdir("inbox").await.unwrap();
    storage.chdir(Some("inbox")).await.unwrap();
    storage
        .upload_file(UploadFields {
            tmp_name: Some(tmp.to_string_lossy().to_string()),
            name: Some("report.pdf".to_string()),
        })
        .await
        .unwrap();

    assert!(!tmp.exists());
    assert_eq!(
        storage.fetch_file("report.pdf").await.unwrap().as_deref(),
        Some(&b"report"[..])
    );
    assert_eq!(
        storage.get_file_type("report.pdf").await.unwrap().as_deref(),
        Some("application/pdf")
    );
}
