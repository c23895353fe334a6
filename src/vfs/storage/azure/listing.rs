use crate::vfs::model::{VfsError, VfsResult};
use chrono::{DateTime, Utc};
use regex::Regex;

/// List Blobs 响应中的一个 `<Blob>` 元素
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobItem {
    pub name: String,
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
    pub content_type: Option<String>,
    pub resource_type: Option<String>,
    pub is_folder_marker: bool,
}

impl BlobItem {
    /// 分层命名空间的目录、`hdi_isfolder` 标记或以 `/` 结尾的占位 blob
    pub fn is_directory(&self) -> bool {
        self.is_folder_marker
            || self.name.ends_with('/')
            || self.resource_type.as_deref() == Some("directory")
    }
}

/// 一页列表结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobPage {
    pub blobs: Vec<BlobItem>,
    pub prefixes: Vec<String>,
    pub next_marker: Option<String>,
}

pub fn parse_blob_page(xml: &str) -> VfsResult<BlobPage> {
    let blob_pattern = compile(r"(?s)<Blob>(.*?)</Blob>")?;
    let prefix_pattern = compile(r"(?s)<BlobPrefix>\s*<Name>([^<]*)</Name>")?;

    let mut page = BlobPage::default();
    for cap in blob_pattern.captures_iter(xml) {
        let Some(body) = cap.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let Some(name) = extract_tag(body, "Name")? else {
            continue;
        };
        page.blobs.push(BlobItem {
            name,
            size: extract_tag(body, "Content-Length")?.and_then(|s| s.parse().ok()),
            last_modified: extract_tag(body, "Last-Modified")?
                .and_then(|s| DateTime::parse_from_rfc2822(&s).ok())
                .map(|t| t.with_timezone(&Utc)),
            etag: extract_tag(body, "Etag")?,
            content_type: extract_tag(body, "Content-Type")?,
            resource_type: extract_tag(body, "ResourceType")?,
            is_folder_marker: extract_tag(body, "hdi_isfolder")?
                .map_or(false, |v| v.eq_ignore_ascii_case("true")),
        });
    }

    for cap in prefix_pattern.captures_iter(xml) {
        if let Some(name) = cap.get(1) {
            page.prefixes.push(unescape(name.as_str().trim()));
        }
    }

    page.next_marker = extract_tag(xml, "NextMarker")?;
    Ok(page)
}

fn compile(pattern: &str) -> VfsResult<Regex> {
    Regex::new(pattern).map_err(|e| VfsError::RemoteFailure(format!("列表解析失败: {}", e)))
}

/// 取第一个同名元素的文本，空文本视为缺失
fn extract_tag(xml: &str, tag: &str) -> VfsResult<Option<String>> {
    let pattern = compile(&format!(r"<{}>([^<]*)</{}>", regex::escape(tag), regex::escape(tag)))?;
    Ok(pattern
        .captures(xml)
        .and_then(|cap| cap.get(1))
        .map(|m| unescape(m.as_str().trim()))
        .filter(|text| !text.is_empty()))
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
