use crate::vfs::{
    directory::VirtualDirectory,
    model::{Entry, FileInfo, VfsError, VfsResult},
    search::SearchFilter,
    upload::UploadPayload,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::path::Path;

pub mod azure;
pub mod local;
pub mod memory;
pub mod object_store;

pub use azure::BlobAdapter;
pub use local::LocalAdapter;
pub use memory::MemoryObjectStore;
pub use object_store::{ObjectStoreAdapter, ObjectStoreClient};

/// 存储适配器：一个物理后端上的完整文件/目录操作集合。
///
/// 所有名字都先经过 `PathScrubber` 清理，再相对当前目录解析。
/// 需要源文件的操作在源不存在时返回 `false`/`None`，不报错。
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    fn directory(&self) -> &VirtualDirectory;

    fn directory_mut(&mut self) -> &mut VirtualDirectory;

    fn set_base_dir(&mut self, dir: &str) {
        self.directory_mut().set_base_dir(dir);
    }

    fn base_dir(&self) -> &str {
        self.directory().base_dir()
    }

    fn current_dir(&self) -> &str {
        self.directory().current_dir()
    }

    /// 切换当前目录。对象存储没有真实目录，不做存在性检查
    async fn chdir(&mut self, dir: Option<&str>) -> VfsResult<()> {
        self.directory_mut().chdir(dir);
        Ok(())
    }

    /// 创建目录
    async fn mkdir(&self, name: &str) -> VfsResult<()>;

    /// 递归删除目录
    async fn rmdir(&self, name: &str) -> VfsResult<()>;

    /// 列出当前目录下的子目录，名字带末尾 `/`
    async fn list_dirs(&self, search: Option<&str>) -> VfsResult<Vec<Entry>>;

    /// 列出当前目录下的文件
    async fn list_files(&self, search: Option<&str>) -> VfsResult<Vec<Entry>>;

    /// 目录在前，文件在后
    async fn list_all(&self, search: Option<&str>) -> VfsResult<Vec<Entry>> {
        let mut entries = self.list_dirs(search).await?;
        entries.extend(self.list_files(search).await?);
        Ok(entries)
    }

    /// 把本地文件放到当前目录。`copy` 为 false 时移动（删除源文件）
    async fn put_file(&self, from: &Path, copy: bool) -> VfsResult<bool>;

    async fn put_file_contents(&self, name: &str, contents: &[u8]) -> VfsResult<()>;

    /// 把上传助手产出的临时文件搬到当前目录
    async fn upload_file(&self, payload: &UploadPayload) -> VfsResult<()>;

    async fn copy_file(&self, source: &str, dest: &str) -> VfsResult<bool>;

    async fn copy_file_to_external(&self, source: &str, external: &str) -> VfsResult<bool>;

    async fn copy_file_from_external(&self, external: &str, dest: &str) -> VfsResult<bool>;

    /// 删除适配器目录树之外的文件
    async fn delete_external(&self, external: &str) -> VfsResult<bool>;

    /// 复制 + 删除源文件。两步之间没有原子性：第二步失败时两份都保留
    async fn move_file_to_external(&self, source: &str, external: &str) -> VfsResult<bool> {
        if !self.copy_file_to_external(source, external).await? {
            warn!("源文件不存在，跳过移动: {}", source);
            return Ok(false);
        }
        self.delete_file(source).await
    }

    async fn move_file_from_external(&self, external: &str, dest: &str) -> VfsResult<bool> {
        if !self.copy_file_from_external(external, dest).await? {
            warn!("外部文件不存在，跳过移动: {}", external);
            return Ok(false);
        }
        self.delete_external(external).await
    }

    async fn rename_file(&self, old: &str, new: &str) -> VfsResult<bool> {
        debug!("重命名: {} -> {}", old, new);
        if !self.copy_file(old, new).await? {
            return Ok(false);
        }
        self.delete_file(old).await
    }

    /// 仅当文件已存在时覆盖内容
    async fn replace_file_contents(&self, name: &str, contents: &[u8]) -> VfsResult<bool>;

    async fn delete_file(&self, name: &str) -> VfsResult<bool>;

    async fn fetch_file(&self, name: &str) -> VfsResult<Option<Vec<u8>>>;

    async fn fetch_file_info(&self, name: &str) -> VfsResult<Option<FileInfo>>;

    async fn file_exists(&self, name: &str) -> VfsResult<bool> {
        Ok(self.existing_info(name).await?.is_some())
    }

    async fn is_dir(&self, name: &str) -> VfsResult<bool>;

    async fn is_file(&self, name: &str) -> VfsResult<bool>;

    async fn get_file_size(&self, name: &str) -> VfsResult<Option<u64>> {
        Ok(self.existing_info(name).await?.and_then(|info| info.size))
    }

    async fn get_file_type(&self, name: &str) -> VfsResult<Option<String>> {
        Ok(self.existing_info(name).await?.and_then(|info| {
            info.content_type
                .or_else(|| info.kind.map(|kind| kind.to_string()))
        }))
    }

    async fn get_file_mtime(&self, name: &str) -> VfsResult<Option<DateTime<Utc>>> {
        Ok(self.existing_info(name).await?.and_then(|info| info.modified))
    }

    async fn md5_file(&self, name: &str) -> VfsResult<Option<String>> {
        Ok(self.existing_info(name).await?.and_then(|info| info.checksum))
    }

    /// 过滤掉远程错误响应后的元数据
    async fn existing_info(&self, name: &str) -> VfsResult<Option<FileInfo>> {
        Ok(self
            .fetch_file_info(name)
            .await?
            .filter(|info| info.exists()))
    }
}

/// 对列表结果应用可选的搜索模式
pub(crate) fn apply_search(entries: Vec<Entry>, search: Option<&str>) -> Vec<Entry> {
    SearchFilter::filter_entries(entries, search)
}

/// 读取本地文件，不存在时返回 None
pub(crate) async fn read_local(path: &Path) -> VfsResult<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(VfsError::Io(e)),
    }
}

/// 内容的 MD5 十六进制摘要
pub(crate) fn md5_hex(data: &[u8]) -> String {
    use md5::{Digest, Md5};
    hex::encode(Md5::digest(data))
}
