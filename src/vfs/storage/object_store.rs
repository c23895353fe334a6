//! 前缀寻址的对象存储适配器 (S3 风格)。
//!
//! 对象存储里没有真实目录：目录要么是若干对象键的公共前缀，
//! 要么是一个以 `/` 结尾的零字节标记对象。

use crate::vfs::{
    directory::VirtualDirectory,
    model::{Entry, EntryKind, FileInfo, VfsError, VfsResult},
    path_normalizer::PathScrubber,
    storage::{apply_search, read_local, StorageAdapter},
    upload::UploadPayload,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// 基准目录里的 URI 前缀，去掉后即为桶名
pub const S3_SCHEME: &str = "s3://";

const DELIMITER: &str = "/";

/// 对象元数据 (headObject / listObjects 的单项)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
    pub content_type: Option<String>,
}

/// getObject 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub meta: ObjectMeta,
    pub body: Vec<u8>,
}

/// listObjects 的结果；带分隔符时，更深层的键折叠进 `common_prefixes`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    pub contents: Vec<ObjectMeta>,
    pub common_prefixes: Vec<String>,
}

/// S3 兼容客户端。不存在的对象返回 `None`，其余失败返回 `RemoteFailure`
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> VfsResult<()>;

    async fn get_object(&self, bucket: &str, key: &str) -> VfsResult<Option<StoredObject>>;

    async fn head_object(&self, bucket: &str, key: &str) -> VfsResult<Option<ObjectMeta>>;

    async fn delete_object(&self, bucket: &str, key: &str) -> VfsResult<()>;

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        delimiter: Option<&str>,
    ) -> VfsResult<ObjectListing>;
}

/// 外部目标：同一客户端下的 `s3://bucket/key`，或本地文件路径
#[derive(Debug, Clone, PartialEq, Eq)]
enum External {
    Object { bucket: String, key: String },
    Local(PathBuf),
}

impl External {
    fn parse(target: &str) -> VfsResult<Self> {
        match target.strip_prefix(S3_SCHEME) {
            Some(rest) => match rest.split_once('/') {
                Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
                    Ok(External::Object {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    })
                }
                _ => Err(VfsError::InvalidArgument(format!(
                    "外部对象路径无效: {}",
                    target
                ))),
            },
            None => Ok(External::Local(PathBuf::from(target))),
        }
    }
}

pub struct ObjectStoreAdapter {
    directory: VirtualDirectory,
    client: Arc<dyn ObjectStoreClient>,
}

impl ObjectStoreAdapter {
    /// `base_dir` 形如 `s3://bucket` 或 `s3://bucket/root`
    pub fn new(base_dir: impl Into<String>, client: Arc<dyn ObjectStoreClient>) -> Self {
        let directory = VirtualDirectory::new(base_dir);
        info!("初始化对象存储适配器: {}", directory.base_dir());
        Self { directory, client }
    }

    pub fn client(&self) -> &Arc<dyn ObjectStoreClient> {
        &self.client
    }

    /// 桶名：去掉 `s3://` 后的第一段
    pub fn bucket(&self) -> &str {
        let base = self.directory.base_dir();
        let base = base.strip_prefix(S3_SCHEME).unwrap_or(base);
        base.split('/').next().unwrap_or(base)
    }

    /// 当前目录对应的键前缀；位于桶根时为空，否则以 `/` 结尾
    pub fn key_prefix(&self) -> String {
        let base = self.directory.base_dir();
        let base = base.strip_prefix(S3_SCHEME).unwrap_or(base);
        let root = base.split_once('/').map(|(_, root)| root).unwrap_or("");

        let parts: Vec<&str> = [root, self.directory.relative_current()]
            .into_iter()
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            String::new()
        } else {
            format!("{}/", parts.join("/"))
        }
    }

    fn key_of(&self, name: &str) -> String {
        format!("{}{}", self.key_prefix(), PathScrubber::scrub(name))
    }

    fn dir_key_of(&self, name: &str) -> String {
        format!("{}/", self.key_of(name).trim_end_matches('/'))
    }

    fn prefix_param(prefix: &str) -> Option<&str> {
        if prefix.is_empty() {
            None
        } else {
            Some(prefix)
        }
    }

    async fn read_external(&self, external: &External) -> VfsResult<Option<Vec<u8>>> {
        match external {
            External::Object { bucket, key } => Ok(self
                .client
                .get_object(bucket, key)
                .await?
                .map(|object| object.body)),
            External::Local(path) => read_local(path).await,
        }
    }
}

fn unquote(etag: &str) -> String {
    etag.replace('"', "")
}

#[async_trait]
impl StorageAdapter for ObjectStoreAdapter {
    fn directory(&self) -> &VirtualDirectory {
        &self.directory
    }

    fn directory_mut(&mut self) -> &mut VirtualDirectory {
        &mut self.directory
    }

    /// 写入零字节标记对象 `name/`
    async fn mkdir(&self, name: &str) -> VfsResult<()> {
        let key = self.dir_key_of(name);
        self.client.put_object(self.bucket(), &key, Vec::new()).await?;
        info!("创建目录标记: {}/{}", self.bucket(), key);
        Ok(())
    }

    /// 删除前缀下的所有对象（含标记对象）
    async fn rmdir(&self, name: &str) -> VfsResult<()> {
        let prefix = self.dir_key_of(name);
        let listing = self
            .client
            .list_objects(self.bucket(), Some(&prefix), None)
            .await?;
        if listing.contents.is_empty() {
            warn!("目录为空或不存在: {}", prefix);
        }
        for object in listing.contents {
            debug!("删除对象: {}", object.key);
            self.client.delete_object(self.bucket(), &object.key).await?;
        }
        info!("成功删除目录: {}", prefix);
        Ok(())
    }

    async fn list_dirs(&self, search: Option<&str>) -> VfsResult<Vec<Entry>> {
        let prefix = self.key_prefix();
        let listing = self
            .client
            .list_objects(self.bucket(), Self::prefix_param(&prefix), Some(DELIMITER))
            .await?;

        let mut seen = HashSet::new();
        let mut dirs = Vec::new();
        let markers = listing
            .contents
            .iter()
            .filter(|object| object.size == 0 && object.key.ends_with('/'))
            .map(|object| object.key.as_str());
        for key in listing.common_prefixes.iter().map(|p| p.as_str()).chain(markers) {
            let name = key.strip_prefix(prefix.as_str()).unwrap_or(key);
            // 只要直接子目录：去掉前缀后恰好一个 `/`，且在末尾
            if name.is_empty() || name.matches('/').count() != 1 || !name.ends_with('/') {
                continue;
            }
            if seen.insert(name.to_string()) {
                dirs.push(Entry::directory(name));
            }
        }
        Ok(apply_search(dirs, search))
    }

    async fn list_files(&self, search: Option<&str>) -> VfsResult<Vec<Entry>> {
        let prefix = self.key_prefix();
        let listing = self
            .client
            .list_objects(self.bucket(), Self::prefix_param(&prefix), Some(DELIMITER))
            .await?;

        let files = listing
            .contents
            .into_iter()
            .filter(|object| object.key != prefix && !object.key.ends_with('/'))
            .map(|object| {
                let name = object
                    .key
                    .strip_prefix(prefix.as_str())
                    .unwrap_or(&object.key)
                    .to_string();
                Entry::file(name)
            })
            .collect();
        Ok(apply_search(files, search))
    }

    async fn put_file(&self, from: &Path, copy: bool) -> VfsResult<bool> {
        let Some(bytes) = read_local(from).await? else {
            warn!("源文件不存在: {}", from.display());
            return Ok(false);
        };
        let name = PathScrubber::basename(&from.to_string_lossy())
            .ok_or_else(|| VfsError::InvalidArgument(from.display().to_string()))?;
        self.client
            .put_object(self.bucket(), &self.key_of(&name), bytes)
            .await?;
        if !copy {
            fs::remove_file(from).await?;
        }
        Ok(true)
    }

    async fn put_file_contents(&self, name: &str, contents: &[u8]) -> VfsResult<()> {
        let key = self.key_of(name);
        debug!("写入对象: {}/{} ({} 字节)", self.bucket(), key, contents.len());
        self.client
            .put_object(self.bucket(), &key, contents.to_vec())
            .await
    }

    async fn upload_file(&self, payload: &UploadPayload) -> VfsResult<()> {
        let tmp = payload.temporary_path();
        let bytes = read_local(tmp)
            .await?
            .ok_or_else(|| VfsError::NotFound(tmp.display().to_string()))?;
        let key = self.key_of(payload.destination_name());
        self.client.put_object(self.bucket(), &key, bytes).await?;
        fs::remove_file(tmp).await?;
        info!("上传文件: {} -> {}/{}", tmp.display(), self.bucket(), key);
        Ok(())
    }

    async fn copy_file(&self, source: &str, dest: &str) -> VfsResult<bool> {
        let Some(object) = self.client.get_object(self.bucket(), &self.key_of(source)).await?
        else {
            return Ok(false);
        };
        self.client
            .put_object(self.bucket(), &self.key_of(dest), object.body)
            .await?;
        Ok(true)
    }

    async fn copy_file_to_external(&self, source: &str, external: &str) -> VfsResult<bool> {
        let target = External::parse(external)?;
        let Some(object) = self.client.get_object(self.bucket(), &self.key_of(source)).await?
        else {
            return Ok(false);
        };
        match target {
            External::Object { bucket, key } => {
                self.client.put_object(&bucket, &key, object.body).await?
            }
            External::Local(path) => fs::write(path, object.body).await?,
        }
        Ok(true)
    }

    async fn copy_file_from_external(&self, external: &str, dest: &str) -> VfsResult<bool> {
        let source = External::parse(external)?;
        let Some(bytes) = self.read_external(&source).await? else {
            return Ok(false);
        };
        self.client
            .put_object(self.bucket(), &self.key_of(dest), bytes)
            .await?;
        Ok(true)
    }

    async fn delete_external(&self, external: &str) -> VfsResult<bool> {
        match External::parse(external)? {
            External::Object { bucket, key } => {
                if self.client.head_object(&bucket, &key).await?.is_none() {
                    return Ok(false);
                }
                self.client.delete_object(&bucket, &key).await?;
                Ok(true)
            }
            External::Local(path) => match fs::remove_file(&path).await {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(VfsError::Io(e)),
            },
        }
    }

    async fn replace_file_contents(&self, name: &str, contents: &[u8]) -> VfsResult<bool> {
        let key = self.key_of(name);
        if self.client.head_object(self.bucket(), &key).await?.is_none() {
            return Ok(false);
        }
        self.client
            .put_object(self.bucket(), &key, contents.to_vec())
            .await?;
        Ok(true)
    }

    async fn delete_file(&self, name: &str) -> VfsResult<bool> {
        let key = self.key_of(name);
        if self.client.head_object(self.bucket(), &key).await?.is_none() {
            return Ok(false);
        }
        self.client.delete_object(self.bucket(), &key).await?;
        debug!("删除对象: {}/{}", self.bucket(), key);
        Ok(true)
    }

    async fn fetch_file(&self, name: &str) -> VfsResult<Option<Vec<u8>>> {
        Ok(self
            .client
            .get_object(self.bucket(), &self.key_of(name))
            .await?
            .map(|object| object.body))
    }

    async fn fetch_file_info(&self, name: &str) -> VfsResult<Option<FileInfo>> {
        let Some(meta) = self.client.head_object(self.bucket(), &self.key_of(name)).await?
        else {
            return Ok(None);
        };
        let kind = if meta.key.ends_with('/') {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        let mut info = FileInfo::new(PathScrubber::scrub(name))
            .with_kind(kind)
            .with_size(meta.size);
        if let Some(modified) = meta.last_modified {
            info = info.with_modified(modified);
        }
        if let Some(etag) = meta.etag {
            info = info.with_checksum(unquote(&etag));
        }
        if let Some(content_type) = meta.content_type {
            info = info.with_content_type(content_type);
        }
        Ok(Some(info))
    }

    async fn is_dir(&self, name: &str) -> VfsResult<bool> {
        let prefix = self.dir_key_of(name);
        if self.client.head_object(self.bucket(), &prefix).await?.is_some() {
            return Ok(true);
        }
        let listing = self
            .client
            .list_objects(self.bucket(), Some(&prefix), Some(DELIMITER))
            .await?;
        Ok(!listing.contents.is_empty() || !listing.common_prefixes.is_empty())
    }

    async fn is_file(&self, name: &str) -> VfsResult<bool> {
        let key = self.key_of(name);
        if key.ends_with('/') {
            return Ok(false);
        }
        Ok(self.client.head_object(self.bucket(), &key).await?.is_some())
    }

    /// 校验和取 getObject 返回的 ETag（去掉引号）
    async fn md5_file(&self, name: &str) -> VfsResult<Option<String>> {
        Ok(self
            .client
            .get_object(self.bucket(), &self.key_of(name))
            .await?
            .and_then(|object| object.meta.etag)
            .map(|etag| unquote(&etag)))
    }
}
