//! Azure Blob 服务适配器。
//!
//! 基准目录是账户名，当前目录形如 `账户/容器/子目录`。请求路径
//! 为去掉账户后的 `/容器/子目录/名字`。每个请求都带上日期、版本、
//! 请求 ID 等头，再用 SharedKey 签名。

pub mod listing;
pub mod signer;
pub mod transport;

pub use listing::{BlobItem, BlobPage};
pub use signer::{AzureSigner, Credential};
pub use transport::{BlobRequest, BlobResponse, HttpTransport, ReqwestTransport};

use crate::vfs::{
    directory::VirtualDirectory,
    model::{Entry, EntryKind, FileInfo, VfsError, VfsResult},
    path_normalizer::PathScrubber,
    storage::{apply_search, md5_hex, read_local, StorageAdapter},
    upload::UploadPayload,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

pub const API_VERSION: &str = "2023-11-03";

const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const FOLDER_META_HEADER: &str = "x-ms-meta-hdi_isfolder";

/// `x-ms-delete-snapshots` 的取值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteSnapshots {
    Include,
    Only,
}

impl DeleteSnapshots {
    fn as_header(self) -> &'static str {
        match self {
            DeleteSnapshots::Include => "include",
            DeleteSnapshots::Only => "only",
        }
    }
}

pub struct BlobAdapter {
    directory: VirtualDirectory,
    credential: Credential,
    transport: Arc<dyn HttpTransport>,
    endpoint: String,
}

impl BlobAdapter {
    pub fn new(credential: Credential, transport: Arc<dyn HttpTransport>) -> Self {
        let endpoint = format!("https://{}.blob.core.windows.net", credential.account_name());
        let directory = VirtualDirectory::new(credential.account_name());
        info!("初始化 Blob 存储适配器: {}", endpoint);
        Self {
            directory,
            credential,
            transport,
            endpoint,
        }
    }

    /// 用账户名和 Base64 密钥建立基于 reqwest 的适配器
    pub fn connect(account_name: &str, account_key: &str) -> VfsResult<Self> {
        let credential = Credential::new(account_name, account_key)?;
        Ok(Self::new(credential, Arc::new(ReqwestTransport::new())))
    }

    /// 替换服务地址，例如本地模拟器 `http://127.0.0.1:10000/devstoreaccount1`
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn account_name(&self) -> &str {
        self.credential.account_name()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 服务地址去掉协议与路径后的主机部分
    fn host(&self) -> &str {
        let rest = self
            .endpoint
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.endpoint);
        rest.split('/').next().unwrap_or(rest)
    }

    /// 当前目录去掉账户后的部分，第一段为容器
    fn container_path(&self) -> VfsResult<&str> {
        let relative = self.directory.relative_current();
        if relative.is_empty() {
            return Err(VfsError::InvalidArgument(
                "尚未进入容器，请先切换到容器目录".to_string(),
            ));
        }
        Ok(relative)
    }

    fn resource_path(&self, name: &str) -> VfsResult<String> {
        Ok(format!(
            "/{}",
            PathScrubber::join(self.container_path()?, PathScrubber::scrub(name))
        ))
    }

    fn dir_resource_path(&self, name: &str) -> VfsResult<String> {
        Ok(format!("{}/", self.resource_path(name)?.trim_end_matches('/')))
    }

    /// 外部路径相对于账户，形如 `/其他容器/路径`
    fn external_path(external: &str) -> VfsResult<String> {
        let scrubbed = PathScrubber::scrub(external);
        match scrubbed.split_once('/') {
            Some((container, blob)) if !container.is_empty() && !blob.is_empty() => {
                Ok(format!("/{}", scrubbed))
            }
            _ => Err(VfsError::InvalidArgument(format!(
                "外部 blob 路径无效: {}",
                external
            ))),
        }
    }

    /// 带默认头的请求
    fn request(&self, method: &str, path: &str) -> BlobRequest {
        BlobRequest::new(method, &self.endpoint, path)
            .with_header("Date", &http_date(Utc::now()))
            .with_header("Host", self.host())
            .with_header("Content-Type", DEFAULT_CONTENT_TYPE)
            .with_header(
                "User-Agent",
                concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            )
            .with_header("x-ms-client-request-id", &Uuid::new_v4().to_string())
            .with_header("x-ms-version", API_VERSION)
    }

    async fn send(&self, mut request: BlobRequest) -> VfsResult<BlobResponse> {
        AzureSigner::sign(&mut request, &self.credential)?;
        let method = request.method.clone();
        let path = request.path.clone();
        let response = self.transport.send(request).await?;
        debug!("{} {} -> {}", method, path, response.status);
        Ok(response)
    }

    async fn put_blob(
        &self,
        path: &str,
        body: Vec<u8>,
        content_type: &str,
        extra_headers: &[(&str, &str)],
    ) -> VfsResult<BlobResponse> {
        let mut request = self
            .request("PUT", path)
            .with_header("Content-Type", content_type)
            .with_header("x-ms-blob-type", "BlockBlob")
            .with_body(body);
        for (name, value) in extra_headers {
            request.set_header(name, value);
        }
        self.send(request).await
    }

    async fn head(&self, path: &str) -> VfsResult<BlobResponse> {
        self.send(self.request("HEAD", path)).await
    }

    /// 服务端复制，一次往返。源不存在时返回 false
    async fn copy_blob(&self, source_path: &str, dest_path: &str) -> VfsResult<bool> {
        let source_url = BlobRequest::new("GET", &self.endpoint, source_path).url()?;
        let request = self
            .request("PUT", dest_path)
            .with_header("x-ms-copy-source", source_url.as_str());
        let response = self.send(request).await?;
        if response.status == 404 {
            warn!("复制源不存在: {}", source_path);
            return Ok(false);
        }
        ensure_success(response, "复制 blob")?;
        Ok(true)
    }

    async fn delete_path(&self, path: &str, snapshots: Option<DeleteSnapshots>) -> VfsResult<bool> {
        let mut request = self.request("DELETE", path);
        if let Some(snapshots) = snapshots {
            request.set_header("x-ms-delete-snapshots", snapshots.as_header());
        }
        let response = self.send(request).await?;
        if response.status == 404 {
            return Ok(false);
        }
        ensure_success(response, "删除 blob")?;
        Ok(true)
    }

    /// 逐页列出容器内以 `prefix` 开头的 blob，直到没有 NextMarker
    async fn list_blobs(&self, container: &str, prefix: &str) -> VfsResult<Vec<BlobItem>> {
        let mut blobs = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let mut request = self
                .request("GET", &format!("/{}", container))
                .with_query("restype", "container")
                .with_query("comp", "list")
                .with_query("include", "metadata");
            if !prefix.is_empty() {
                request = request.with_query("prefix", prefix);
            }
            if let Some(marker) = &marker {
                request = request.with_query("marker", marker);
            }

            let response = self.send(request).await?;
            if response.status == 404 {
                warn!("容器不存在: {}", container);
                return Ok(blobs);
            }
            let response = ensure_success(response, "列出 blob")?;
            let page = listing::parse_blob_page(&String::from_utf8_lossy(&response.body))?;
            blobs.extend(page.blobs);

            match page.next_marker {
                Some(next) => marker = Some(next),
                None => break,
            }
        }
        Ok(blobs)
    }

    /// 当前目录的直接子目录与文件
    async fn children(&self) -> VfsResult<(Vec<Entry>, Vec<Entry>)> {
        let path = self.container_path()?;
        let (container, sub) = path.split_once('/').unwrap_or((path, ""));
        let prefix = if sub.is_empty() {
            String::new()
        } else {
            format!("{}/", sub)
        };

        let mut dirs = BTreeSet::new();
        let mut files = Vec::new();
        for blob in self.list_blobs(container, &prefix).await? {
            let Some(rest) = blob.name.strip_prefix(&prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            match rest.find('/') {
                Some(idx) => {
                    dirs.insert(rest[..idx].to_string());
                }
                None if blob.is_directory() => {
                    dirs.insert(rest.to_string());
                }
                None => files.push(Entry::file(rest)),
            }
        }
        let dirs = dirs.into_iter().map(Entry::directory).collect();
        Ok((dirs, files))
    }

    /// 删除当前目录下的 blob，可选地连同快照
    pub async fn delete_blob(
        &self,
        name: &str,
        snapshots: Option<DeleteSnapshots>,
    ) -> VfsResult<bool> {
        let path = self.resource_path(name)?;
        self.delete_path(&path, snapshots).await
    }
}

fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn ensure_success(response: BlobResponse, context: &str) -> VfsResult<BlobResponse> {
    if response.is_success() {
        return Ok(response);
    }
    let code = response.header("x-ms-error-code").unwrap_or("");
    let body = String::from_utf8_lossy(&response.body);
    Err(VfsError::RemoteFailure(format!(
        "{}失败: {} {} {} {}",
        context,
        response.status,
        response.reason,
        code,
        body.trim()
    )))
}

fn content_type_of(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn is_directory_response(response: &BlobResponse) -> bool {
    response.header("x-ms-resource-type") == Some("directory")
        || response
            .header(FOLDER_META_HEADER)
            .map_or(false, |v| v.eq_ignore_ascii_case("true"))
}

/// Content-MD5 的十六进制形式；没有时退回去掉引号的 ETag
fn checksum_of(response: &BlobResponse) -> Option<String> {
    response
        .header("content-md5")
        .and_then(|md5| BASE64_STANDARD.decode(md5).ok())
        .map(hex::encode)
        .or_else(|| response.header("etag").map(|etag| etag.replace('"', "")))
}

fn file_info_from(name: &str, response: &BlobResponse) -> FileInfo {
    let mut info =
        FileInfo::new(PathScrubber::scrub(name)).with_response(response.to_remote_response());
    if !response.is_success() {
        return info;
    }

    let kind = if is_directory_response(response) {
        EntryKind::Directory
    } else {
        EntryKind::File
    };
    info = info.with_kind(kind);
    if let Some(size) = response.header("content-length").and_then(|v| v.parse().ok()) {
        info = info.with_size(size);
    }
    if let Some(modified) = response
        .header("last-modified")
        .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
    {
        info = info.with_modified(modified.with_timezone(&Utc));
    }
    if let Some(checksum) = checksum_of(response) {
        info = info.with_checksum(checksum);
    }
    if let Some(content_type) = response.header("content-type") {
        info = info.with_content_type(content_type);
    }
    info
}

#[async_trait]
impl StorageAdapter for BlobAdapter {
    fn directory(&self) -> &VirtualDirectory {
        &self.directory
    }

    fn directory_mut(&mut self) -> &mut VirtualDirectory {
        &mut self.directory
    }

    /// 写入带 `hdi_isfolder` 元数据的 `name/` 占位 blob
    async fn mkdir(&self, name: &str) -> VfsResult<()> {
        let path = self.dir_resource_path(name)?;
        let response = self
            .put_blob(
                &path,
                Vec::new(),
                DEFAULT_CONTENT_TYPE,
                &[(FOLDER_META_HEADER, "true")],
            )
            .await?;
        ensure_success(response, "创建目录")?;
        info!("创建目录标记: {}", path);
        Ok(())
    }

    async fn rmdir(&self, name: &str) -> VfsResult<()> {
        let path = self.dir_resource_path(name)?;
        let trimmed = path.trim_start_matches('/');
        let (container, prefix) = trimmed.split_once('/').unwrap_or((trimmed, ""));

        let blobs = self.list_blobs(container, prefix).await?;
        for blob in &blobs {
            self.delete_path(&format!("/{}/{}", container, blob.name), None)
                .await?;
        }
        info!("删除目录 {} ({} 个 blob)", path, blobs.len());
        Ok(())
    }

    async fn list_dirs(&self, search: Option<&str>) -> VfsResult<Vec<Entry>> {
        let (dirs, _) = self.children().await?;
        Ok(apply_search(dirs, search))
    }

    async fn list_files(&self, search: Option<&str>) -> VfsResult<Vec<Entry>> {
        let (_, files) = self.children().await?;
        Ok(apply_search(files, search))
    }

    async fn list_all(&self, search: Option<&str>) -> VfsResult<Vec<Entry>> {
        let (mut entries, files) = self.children().await?;
        entries.extend(files);
        Ok(apply_search(entries, search))
    }

    async fn put_file(&self, from: &Path, copy: bool) -> VfsResult<bool> {
        let Some(body) = read_local(from).await? else {
            warn!("源文件不存在: {}", from.display());
            return Ok(false);
        };
        let name = PathScrubber::basename(&from.to_string_lossy())
            .ok_or_else(|| VfsError::InvalidArgument(from.display().to_string()))?;
        let response = self
            .put_blob(&self.resource_path(&name)?, body, &content_type_of(&name), &[])
            .await?;
        ensure_success(response, "上传 blob")?;
        if !copy {
            fs::remove_file(from).await?;
        }
        Ok(true)
    }

    async fn put_file_contents(&self, name: &str, contents: &[u8]) -> VfsResult<()> {
        let response = self
            .put_blob(
                &self.resource_path(name)?,
                contents.to_vec(),
                &content_type_of(name),
                &[],
            )
            .await?;
        ensure_success(response, "写入 blob")?;
        Ok(())
    }

    async fn upload_file(&self, payload: &UploadPayload) -> VfsResult<()> {
        let tmp = payload.temporary_path();
        let body = read_local(tmp)
            .await?
            .ok_or_else(|| VfsError::NotFound(tmp.display().to_string()))?;
        let name = payload.destination_name();
        let response = self
            .put_blob(&self.resource_path(name)?, body, &content_type_of(name), &[])
            .await?;
        ensure_success(response, "上传 blob")?;
        fs::remove_file(tmp).await?;
        info!("上传文件: {} -> {}", tmp.display(), name);
        Ok(())
    }

    async fn copy_file(&self, source: &str, dest: &str) -> VfsResult<bool> {
        self.copy_blob(&self.resource_path(source)?, &self.resource_path(dest)?)
            .await
    }

    async fn copy_file_to_external(&self, source: &str, external: &str) -> VfsResult<bool> {
        self.copy_blob(&self.resource_path(source)?, &Self::external_path(external)?)
            .await
    }

    async fn copy_file_from_external(&self, external: &str, dest: &str) -> VfsResult<bool> {
        self.copy_blob(&Self::external_path(external)?, &self.resource_path(dest)?)
            .await
    }

    async fn delete_external(&self, external: &str) -> VfsResult<bool> {
        self.delete_path(&Self::external_path(external)?, None).await
    }

    /// 带 `If-Match: *` 的覆盖写；blob 不存在时服务端返回 404 或 412
    async fn replace_file_contents(&self, name: &str, contents: &[u8]) -> VfsResult<bool> {
        let response = self
            .put_blob(
                &self.resource_path(name)?,
                contents.to_vec(),
                &content_type_of(name),
                &[("If-Match", "*")],
            )
            .await?;
        if matches!(response.status, 404 | 412) {
            return Ok(false);
        }
        ensure_success(response, "覆盖 blob")?;
        Ok(true)
    }

    async fn delete_file(&self, name: &str) -> VfsResult<bool> {
        self.delete_blob(name, None).await
    }

    async fn fetch_file(&self, name: &str) -> VfsResult<Option<Vec<u8>>> {
        let response = self.send(self.request("GET", &self.resource_path(name)?)).await?;
        if response.status == 404 {
            return Ok(None);
        }
        Ok(Some(ensure_success(response, "读取 blob")?.body))
    }

    /// 总是返回元数据，远程响应（含错误状态）保存在 `response` 中
    async fn fetch_file_info(&self, name: &str) -> VfsResult<Option<FileInfo>> {
        let response = self.head(&self.resource_path(name)?).await?;
        Ok(Some(file_info_from(name, &response)))
    }

    async fn is_dir(&self, name: &str) -> VfsResult<bool> {
        let response = self.head(&self.resource_path(name)?).await?;
        if response.is_success() {
            return Ok(is_directory_response(&response));
        }
        let marker = self.head(&self.dir_resource_path(name)?).await?;
        if marker.is_success() {
            return Ok(true);
        }

        // 没有占位 blob 的隐式目录
        let path = self.dir_resource_path(name)?;
        let trimmed = path.trim_start_matches('/');
        let (container, prefix) = trimmed.split_once('/').unwrap_or((trimmed, ""));
        let request = self
            .request("GET", &format!("/{}", container))
            .with_query("restype", "container")
            .with_query("comp", "list")
            .with_query("prefix", prefix)
            .with_query("maxresults", "1");
        let response = self.send(request).await?;
        if !response.is_success() {
            return Ok(false);
        }
        let page = listing::parse_blob_page(&String::from_utf8_lossy(&response.body))?;
        Ok(!page.blobs.is_empty())
    }

    async fn is_file(&self, name: &str) -> VfsResult<bool> {
        let response = self.head(&self.resource_path(name)?).await?;
        Ok(response.is_success() && !is_directory_response(&response))
    }

    async fn md5_file(&self, name: &str) -> VfsResult<Option<String>> {
        let response = self.head(&self.resource_path(name)?).await?;
        if !response.is_success() {
            return Ok(None);
        }
        if let Some(checksum) = checksum_of(&response) {
            return Ok(Some(checksum));
        }
        Ok(self.fetch_file(name).await?.map(|body| md5_hex(&body)))
    }
}
