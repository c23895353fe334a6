use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// 列表项类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "dir"),
        }
    }
}

/// 一条列表结果。目录名始终带末尾的 `/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
}

impl Entry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        let mut name = name.into();
        if !name.ends_with('/') {
            name.push('/');
        }
        Self {
            name,
            kind: EntryKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// 去掉目录末尾 `/` 的名字，用于通配符匹配
    pub fn bare_name(&self) -> &str {
        self.name.trim_end_matches('/')
    }
}

/// 远程服务返回的原始响应摘要 (code, message, headers, is_error)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResponse {
    pub code: u16,
    pub message: String,
    pub headers: BTreeMap<String, String>,
    pub is_error: bool,
}

impl RemoteResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }
}

/// 文件元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub kind: Option<EntryKind>,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
    pub checksum: Option<String>,
    pub content_type: Option<String>,
    pub response: Option<RemoteResponse>,
}

impl FileInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            size: None,
            modified: None,
            checksum: None,
            content_type: None,
            response: None,
        }
    }

    pub fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_modified(mut self, time: DateTime<Utc>) -> Self {
        self.modified = Some(time);
        self
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_response(mut self, response: RemoteResponse) -> Self {
        self.response = Some(response);
        self
    }

    /// 远程响应为错误状态时视为不存在
    pub fn exists(&self) -> bool {
        self.response.as_ref().map_or(true, |r| !r.is_error)
    }
}

#[derive(Debug, Error)]
pub enum VfsError {
    #[error("节点不存在: {0}")]
    NotFound(String),

    #[error("无效参数: {0}")]
    InvalidArgument(String),

    #[error("远程存储错误: {0}")]
    RemoteFailure(String),

    #[error("配置错误: {0}")]
    ConfigurationError(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

pub type VfsResult<T> = Result<T, VfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_entries_carry_trailing_slash() {
        let entry = Entry::directory("foo");
        assert_eq!(entry.name, "foo/");
        assert_eq!(entry.bare_name(), "foo");
        assert!(entry.is_dir());

        let already = Entry::directory("bar/");
        assert_eq!(already.name, "bar/");
    }

    #[test]
    fn file_info_without_response_exists() {
        let info = FileInfo::new("a.txt").with_size(3);
        assert!(info.exists());

        let missing = FileInfo::new("b.txt").with_response(RemoteResponse {
            code: 404,
            message: "Not Found".to_string(),
            headers: BTreeMap::new(),
            is_error: true,
        });
        assert!(!missing.exists());
    }

    #[test]
    fn remote_response_header_lookup_is_case_insensitive() {
        let mut headers = BTreeMap::new();
        headers.insert("content-length".to_string(), "12".to_string());
        let response = RemoteResponse {
            code: 200,
            message: "OK".to_string(),
            headers,
            is_error: false,
        };
        assert_eq!(response.header("Content-Length"), Some("12"));
    }

    #[test]
    fn error_display() {
        let err = VfsError::NotFound("a.txt".to_string());
        assert_eq!(err.to_string(), "节点不存在: a.txt");
    }
}
