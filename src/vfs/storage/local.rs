use crate::vfs::{
    directory::VirtualDirectory,
    model::{Entry, EntryKind, FileInfo, VfsError, VfsResult},
    path_normalizer::PathScrubber,
    storage::{apply_search, md5_hex, StorageAdapter},
    upload::UploadPayload,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 本地文件系统适配器
#[derive(Debug, Clone)]
pub struct LocalAdapter {
    directory: VirtualDirectory,
}

impl LocalAdapter {
    pub fn new(base_dir: impl Into<String>) -> Self {
        let directory = VirtualDirectory::new(base_dir);
        info!("初始化本地存储适配器: {}", directory.base_dir());
        Self { directory }
    }

    fn full_path(&self, name: &str) -> PathBuf {
        PathBuf::from(self.directory.path_of(name))
    }

    async fn list_by_kind(&self, kind: EntryKind) -> VfsResult<Vec<Entry>> {
        let current = self.directory.current_dir();
        let mut read_dir = fs::read_dir(current).await.map_err(|e| not_found(e, current))?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            // 跟随符号链接，与 stat 行为一致
            let Some(meta) = metadata_of(&entry.path()).await? else {
                continue;
            };
            match kind {
                EntryKind::Directory if meta.is_dir() => entries.push(Entry::directory(name)),
                EntryKind::File if meta.is_file() => entries.push(Entry::file(name)),
                _ => {}
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// 查询元数据，不存在时返回 None
async fn metadata_of(path: &Path) -> VfsResult<Option<Metadata>> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(VfsError::Io(e)),
    }
}

async fn is_existing_file(path: &Path) -> VfsResult<bool> {
    Ok(metadata_of(path).await?.map_or(false, |m| m.is_file()))
}

fn not_found(e: std::io::Error, path: &str) -> VfsError {
    if e.kind() == std::io::ErrorKind::NotFound {
        VfsError::NotFound(path.to_string())
    } else {
        VfsError::Io(e)
    }
}

fn modified_of(meta: &Metadata) -> Option<DateTime<Utc>> {
    meta.modified().ok().map(DateTime::<Utc>::from)
}

/// 重命名；跨设备失败时退化为复制 + 删除
async fn relocate(from: &Path, to: &Path) -> VfsResult<()> {
    if let Err(e) = fs::rename(from, to).await {
        debug!("rename 失败 ({}), 改用复制: {}", e, from.display());
        fs::copy(from, to).await?;
        fs::remove_file(from).await?;
    }
    Ok(())
}

#[async_trait]
impl StorageAdapter for LocalAdapter {
    fn directory(&self) -> &VirtualDirectory {
        &self.directory
    }

    fn directory_mut(&mut self) -> &mut VirtualDirectory {
        &mut self.directory
    }

    /// 本地目录必须真实存在，否则保持原目录并返回 NotFound。
    /// `None` 无条件回到基准目录
    async fn chdir(&mut self, dir: Option<&str>) -> VfsResult<()> {
        if dir.is_none() {
            self.directory.chdir(None);
            return Ok(());
        }
        let target = self.directory.resolve(dir);
        match metadata_of(Path::new(&target)).await? {
            Some(meta) if meta.is_dir() => {
                self.directory.chdir(dir);
                Ok(())
            }
            _ => {
                warn!("目标目录不存在: {}", target);
                Err(VfsError::NotFound(target))
            }
        }
    }

    async fn mkdir(&self, name: &str) -> VfsResult<()> {
        let path = self.full_path(name);
        fs::create_dir_all(&path).await?;
        info!("成功创建目录: {}", path.display());
        Ok(())
    }

    async fn rmdir(&self, name: &str) -> VfsResult<()> {
        let path = self.full_path(name);
        match metadata_of(&path).await? {
            Some(meta) if meta.is_dir() => {
                fs::remove_dir_all(&path).await?;
                info!("成功删除目录: {}", path.display());
            }
            _ => warn!("目录不存在，跳过删除: {}", path.display()),
        }
        Ok(())
    }

    async fn list_dirs(&self, search: Option<&str>) -> VfsResult<Vec<Entry>> {
        let dirs = self.list_by_kind(EntryKind::Directory).await?;
        Ok(apply_search(dirs, search))
    }

    async fn list_files(&self, search: Option<&str>) -> VfsResult<Vec<Entry>> {
        let files = self.list_by_kind(EntryKind::File).await?;
        Ok(apply_search(files, search))
    }

    async fn put_file(&self, from: &Path, copy: bool) -> VfsResult<bool> {
        if !is_existing_file(from).await? {
            warn!("源文件不存在: {}", from.display());
            return Ok(false);
        }
        let name = PathScrubber::basename(&from.to_string_lossy())
            .ok_or_else(|| VfsError::InvalidArgument(from.display().to_string()))?;
        let dest = self.full_path(&name);
        if copy {
            fs::copy(from, &dest).await?;
        } else {
            relocate(from, &dest).await?;
        }
        debug!("放入文件: {} -> {}", from.display(), dest.display());
        Ok(true)
    }

    async fn put_file_contents(&self, name: &str, contents: &[u8]) -> VfsResult<()> {
        let path = self.full_path(name);
        fs::write(&path, contents).await?;
        debug!("写入 {} 字节到 {}", contents.len(), path.display());
        Ok(())
    }

    async fn upload_file(&self, payload: &UploadPayload) -> VfsResult<()> {
        let tmp = payload.temporary_path();
        if !is_existing_file(tmp).await? {
            return Err(VfsError::NotFound(tmp.display().to_string()));
        }
        let dest = self.full_path(payload.destination_name());
        relocate(tmp, &dest).await?;
        info!("上传文件: {} -> {}", tmp.display(), dest.display());
        Ok(())
    }

    async fn copy_file(&self, source: &str, dest: &str) -> VfsResult<bool> {
        let source = self.full_path(source);
        if !is_existing_file(&source).await? {
            return Ok(false);
        }
        fs::copy(&source, self.full_path(dest)).await?;
        Ok(true)
    }

    async fn copy_file_to_external(&self, source: &str, external: &str) -> VfsResult<bool> {
        let source = self.full_path(source);
        if !is_existing_file(&source).await? {
            return Ok(false);
        }
        fs::copy(&source, external).await?;
        Ok(true)
    }

    async fn copy_file_from_external(&self, external: &str, dest: &str) -> VfsResult<bool> {
        let external = Path::new(external);
        if !is_existing_file(external).await? {
            return Ok(false);
        }
        fs::copy(external, self.full_path(dest)).await?;
        Ok(true)
    }

    async fn delete_external(&self, external: &str) -> VfsResult<bool> {
        let external = Path::new(external);
        if !is_existing_file(external).await? {
            return Ok(false);
        }
        fs::remove_file(external).await?;
        Ok(true)
    }

    async fn replace_file_contents(&self, name: &str, contents: &[u8]) -> VfsResult<bool> {
        let path = self.full_path(name);
        if !is_existing_file(&path).await? {
            return Ok(false);
        }
        fs::write(&path, contents).await?;
        Ok(true)
    }

    async fn delete_file(&self, name: &str) -> VfsResult<bool> {
        let path = self.full_path(name);
        if !is_existing_file(&path).await? {
            return Ok(false);
        }
        fs::remove_file(&path).await?;
        debug!("删除文件: {}", path.display());
        Ok(true)
    }

    async fn fetch_file(&self, name: &str) -> VfsResult<Option<Vec<u8>>> {
        let path = self.full_path(name);
        if !is_existing_file(&path).await? {
            return Ok(None);
        }
        Ok(Some(fs::read(&path).await?))
    }

    async fn fetch_file_info(&self, name: &str) -> VfsResult<Option<FileInfo>> {
        let path = self.full_path(name);
        let Some(meta) = metadata_of(&path).await? else {
            return Ok(None);
        };

        let mut info = FileInfo::new(PathScrubber::scrub(name)).with_size(meta.len());
        if let Some(modified) = modified_of(&meta) {
            info = info.with_modified(modified);
        }
        if meta.is_dir() {
            info = info.with_kind(EntryKind::Directory);
        } else {
            let contents = fs::read(&path).await?;
            info = info
                .with_kind(EntryKind::File)
                .with_checksum(md5_hex(&contents));
        }
        Ok(Some(info))
    }

    async fn file_exists(&self, name: &str) -> VfsResult<bool> {
        Ok(metadata_of(&self.full_path(name)).await?.is_some())
    }

    async fn is_dir(&self, name: &str) -> VfsResult<bool> {
        Ok(metadata_of(&self.full_path(name))
            .await?
            .map_or(false, |m| m.is_dir()))
    }

    async fn is_file(&self, name: &str) -> VfsResult<bool> {
        is_existing_file(&self.full_path(name)).await
    }

    async fn get_file_size(&self, name: &str) -> VfsResult<Option<u64>> {
        Ok(metadata_of(&self.full_path(name)).await?.map(|m| m.len()))
    }

    async fn get_file_type(&self, name: &str) -> VfsResult<Option<String>> {
        Ok(metadata_of(&self.full_path(name)).await?.map(|m| {
            if m.is_dir() {
                EntryKind::Directory.to_string()
            } else {
                EntryKind::File.to_string()
            }
        }))
    }

    async fn get_file_mtime(&self, name: &str) -> VfsResult<Option<DateTime<Utc>>> {
        Ok(metadata_of(&self.full_path(name))
            .await?
            .as_ref()
            .and_then(modified_of))
    }

    async fn md5_file(&self, name: &str) -> VfsResult<Option<String>> {
        Ok(self.fetch_file(name).await?.map(|bytes| md5_hex(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn adapter() -> (TempDir, LocalAdapter) {
        let tmp = TempDir::new().unwrap();
        let adapter = LocalAdapter::new(tmp.path().to_string_lossy().to_string());
        (tmp, adapter)
    }

    #[tokio::test]
    async fn reset_to_base_needs_no_existing_directory() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("gone");
        let mut adapter = LocalAdapter::new(base.to_string_lossy().to_string());
        adapter.chdir(None).await.unwrap();
        assert_eq!(adapter.current_dir(), adapter.base_dir());
    }

    #[tokio::test]
    async fn chdir_into_missing_directory_keeps_current() {
        let (_tmp, mut adapter) = adapter();
        let before = adapter.current_dir().to_string();
        let err = adapter.chdir(Some("nope")).await.unwrap_err();
        assert!(matches!(err, VfsError::NotFound(_)));
        assert_eq!(adapter.current_dir(), before);
    }

    #[tokio::test]
    async fn missing_sources_are_silent_no_ops() {
        let (_tmp, adapter) = adapter();
        assert!(!adapter.copy_file("a.txt", "b.txt").await.unwrap());
        assert!(!adapter.delete_file("a.txt").await.unwrap());
        assert!(!adapter.replace_file_contents("a.txt", b"x").await.unwrap());
        assert!(!adapter.rename_file("a.txt", "b.txt").await.unwrap());
        assert_eq!(adapter.fetch_file("a.txt").await.unwrap(), None);
        assert_eq!(adapter.get_file_size("a.txt").await.unwrap(), None);
        assert_eq!(adapter.md5_file("a.txt").await.unwrap(), None);
        adapter.rmdir("nope").await.unwrap();
    }

    #[tokio::test]
    async fn file_type_reports_file_or_dir() {
        let (_tmp, adapter) = adapter();
        adapter.mkdir("d").await.unwrap();
        adapter.put_file_contents("f.txt", b"1").await.unwrap();
        assert_eq!(
            adapter.get_file_type("d").await.unwrap().as_deref(),
            Some("dir")
        );
        assert_eq!(
            adapter.get_file_type("f.txt").await.unwrap().as_deref(),
            Some("file")
        );
    }
}
