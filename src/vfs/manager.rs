use crate::config::StorageBackend;
use crate::vfs::{
    model::{Entry, FileInfo, VfsResult},
    storage::{
        BlobAdapter, LocalAdapter, MemoryObjectStore, ObjectStoreAdapter, ObjectStoreClient,
        StorageAdapter,
    },
    upload::{UploadFields, UploadPayload},
};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

/// 应用代码唯一接触的存储入口，持有一个当前生效的适配器
pub struct StorageFacade {
    adapter: Box<dyn StorageAdapter>,
}

impl StorageFacade {
    pub fn new(adapter: Box<dyn StorageAdapter>) -> Self {
        Self { adapter }
    }

    pub fn local(base_dir: impl Into<String>) -> Self {
        Self::new(Box::new(LocalAdapter::new(base_dir)))
    }

    pub fn object_store(base_dir: impl Into<String>, client: Arc<dyn ObjectStoreClient>) -> Self {
        Self::new(Box::new(ObjectStoreAdapter::new(base_dir, client)))
    }

    /// 给出容器时，构造后立即进入该容器
    pub async fn azure(
        account_name: &str,
        account_key: &str,
        container: Option<&str>,
    ) -> VfsResult<Self> {
        let mut facade = Self::new(Box::new(BlobAdapter::connect(account_name, account_key)?));
        if let Some(container) = container {
            facade.chdir(Some(container)).await?;
        }
        Ok(facade)
    }

    /// 按配置建立门面。`memory` 后端每次调用都得到一个独立的空存储
    pub async fn from_config(backend: &StorageBackend) -> VfsResult<Self> {
        match backend {
            StorageBackend::Local { base_dir } => Ok(Self::local(base_dir.clone())),
            StorageBackend::Memory { base_dir } => Ok(Self::object_store(
                base_dir.clone(),
                Arc::new(MemoryObjectStore::new()),
            )),
            StorageBackend::Azure {
                account_name,
                account_key,
                container,
            } => Self::azure(account_name, account_key, container.as_deref()).await,
        }
    }

    /// 替换当前适配器
    pub fn set_adapter(&mut self, adapter: Box<dyn StorageAdapter>) {
        info!("切换存储适配器: {}", adapter.base_dir());
        self.adapter = adapter;
    }

    pub fn adapter(&self) -> &dyn StorageAdapter {
        self.adapter.as_ref()
    }

    pub fn set_base_dir(&mut self, dir: &str) {
        info!("设置基准目录: {}", dir);
        self.adapter.set_base_dir(dir);
    }

    pub fn base_dir(&self) -> &str {
        self.adapter.base_dir()
    }

    pub fn current_dir(&self) -> &str {
        self.adapter.current_dir()
    }

    pub async fn chdir(&mut self, dir: Option<&str>) -> VfsResult<()> {
        info!("切换目录: {:?}", dir);
        self.adapter.chdir(dir).await?;
        debug!("当前目录: {}", self.adapter.current_dir());
        Ok(())
    }

    pub async fn mkdir(&self, name: &str) -> VfsResult<()> {
        info!("创建目录: {}", name);
        self.adapter.mkdir(name).await
    }

    pub async fn rmdir(&self, name: &str) -> VfsResult<()> {
        info!("删除目录: {}", name);
        self.adapter.rmdir(name).await
    }

    pub async fn list_dirs(&self, search: Option<&str>) -> VfsResult<Vec<Entry>> {
        info!("列出目录: {} {:?}", self.current_dir(), search);
        self.adapter.list_dirs(search).await
    }

    pub async fn list_files(&self, search: Option<&str>) -> VfsResult<Vec<Entry>> {
        info!("列出文件: {} {:?}", self.current_dir(), search);
        self.adapter.list_files(search).await
    }

    pub async fn list_all(&self, search: Option<&str>) -> VfsResult<Vec<Entry>> {
        info!("列出目录内容: {} {:?}", self.current_dir(), search);
        self.adapter.list_all(search).await
    }

    pub async fn put_file(&self, from: &Path, copy: bool) -> VfsResult<bool> {
        info!("放入文件: {} (copy={})", from.display(), copy);
        self.adapter.put_file(from, copy).await
    }

    pub async fn put_file_contents(&self, name: &str, contents: &[u8]) -> VfsResult<()> {
        info!("写入文件: {} ({} 字节)", name, contents.len());
        self.adapter.put_file_contents(name, contents).await
    }

    /// 先校验字段再交给适配器，字段缺失时返回 InvalidArgument
    pub async fn upload_file(&self, fields: UploadFields) -> VfsResult<()> {
        let payload = UploadPayload::try_from(fields)?;
        info!("上传文件: {}", payload.destination_name());
        self.adapter.upload_file(&payload).await
    }

    /// 依次上传，遇到第一个错误即停止
    pub async fn upload_files(&self, uploads: Vec<UploadFields>) -> VfsResult<usize> {
        let total = uploads.len();
        for fields in uploads {
            self.upload_file(fields).await?;
        }
        info!("批量上传完成: {} 个文件", total);
        Ok(total)
    }

    pub async fn copy_file(&self, source: &str, dest: &str) -> VfsResult<bool> {
        info!("复制文件: {} -> {}", source, dest);
        self.adapter.copy_file(source, dest).await
    }

    pub async fn copy_file_to_external(&self, source: &str, external: &str) -> VfsResult<bool> {
        info!("复制到外部: {} -> {}", source, external);
        self.adapter.copy_file_to_external(source, external).await
    }

    pub async fn copy_file_from_external(&self, external: &str, dest: &str) -> VfsResult<bool> {
        info!("从外部复制: {} -> {}", external, dest);
        self.adapter.copy_file_from_external(external, dest).await
    }

    pub async fn delete_external(&self, external: &str) -> VfsResult<bool> {
        info!("删除外部文件: {}", external);
        self.adapter.delete_external(external).await
    }

    pub async fn move_file_to_external(&self, source: &str, external: &str) -> VfsResult<bool> {
        info!("移动到外部: {} -> {}", source, external);
        self.adapter.move_file_to_external(source, external).await
    }

    pub async fn move_file_from_external(&self, external: &str, dest: &str) -> VfsResult<bool> {
        info!("从外部移动: {} -> {}", external, dest);
        self.adapter.move_file_from_external(external, dest).await
    }

    pub async fn rename_file(&self, old: &str, new: &str) -> VfsResult<bool> {
        info!("重命名文件: {} -> {}", old, new);
        self.adapter.rename_file(old, new).await
    }

    pub async fn replace_file_contents(&self, name: &str, contents: &[u8]) -> VfsResult<bool> {
        info!("覆盖文件: {} ({} 字节)", name, contents.len());
        self.adapter.replace_file_contents(name, contents).await
    }

    pub async fn delete_file(&self, name: &str) -> VfsResult<bool> {
        info!("删除文件: {}", name);
        self.adapter.delete_file(name).await
    }

    pub async fn fetch_file(&self, name: &str) -> VfsResult<Option<Vec<u8>>> {
        info!("读取文件: {}", name);
        self.adapter.fetch_file(name).await
    }

    pub async fn fetch_file_info(&self, name: &str) -> VfsResult<Option<FileInfo>> {
        info!("读取文件信息: {}", name);
        self.adapter.fetch_file_info(name).await
    }

    pub async fn file_exists(&self, name: &str) -> VfsResult<bool> {
        self.adapter.file_exists(name).await
    }

    pub async fn is_dir(&self, name: &str) -> VfsResult<bool> {
        self.adapter.is_dir(name).await
    }

    pub async fn is_file(&self, name: &str) -> VfsResult<bool> {
        self.adapter.is_file(name).await
    }

    pub async fn get_file_size(&self, name: &str) -> VfsResult<Option<u64>> {
        self.adapter.get_file_size(name).await
    }

    pub async fn get_file_type(&self, name: &str) -> VfsResult<Option<String>> {
        self.adapter.get_file_type(name).await
    }

    pub async fn get_file_mtime(&self, name: &str) -> VfsResult<Option<DateTime<Utc>>> {
        self.adapter.get_file_mtime(name).await
    }

    pub async fn md5_file(&self, name: &str) -> VfsResult<Option<String>> {
        info!("计算 MD5: {}", name);
        self.adapter.md5_file(name).await
    }
}
