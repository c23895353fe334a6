use crate::vfs::model::{RemoteResponse, VfsError, VfsResult};
use async_trait::async_trait;
use log::debug;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Url;
use std::collections::BTreeMap;

/// 查询参数：只保留非保留字符
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// blob 路径：在查询参数的基础上保留 `/`
const BLOB_PATH_ENCODE_SET: &AsciiSet = &QUERY_ENCODE_SET.remove(b'/');

/// 发往 Blob 服务的一个请求。`path` 与查询参数都是未编码的最终值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRequest {
    pub method: String,
    pub endpoint: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl BlobRequest {
    pub fn new(method: &str, endpoint: &str, path: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            path: path.to_string(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    /// 设置请求体；非空时同时设置 Content-Length
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        if !body.is_empty() {
            self.set_header("Content-Length", &body.len().to_string());
        }
        self.body = body;
        self
    }

    /// 大小写不敏感地替换同名头
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 完整 URL，路径与查询参数在这里做百分号编码。
    /// 签名使用的正是这里的路径，两者必须一致
    pub fn url(&self) -> VfsResult<Url> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| {
            VfsError::InvalidArgument(format!("无效的服务地址 {}: {}", self.endpoint, e))
        })?;
        let base_path = url.path().trim_end_matches('/').to_string();
        let path = utf8_percent_encode(&self.path, BLOB_PATH_ENCODE_SET);
        url.set_path(&format!("{}{}", base_path, path));
        if !self.query.is_empty() {
            let query = self
                .query
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}={}",
                        utf8_percent_encode(k, QUERY_ENCODE_SET),
                        utf8_percent_encode(v, QUERY_ENCODE_SET)
                    )
                })
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query));
        }
        Ok(url)
    }
}

/// Blob 服务的响应，头名统一为小写
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobResponse {
    pub status: u16,
    pub reason: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl BlobResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    pub fn to_remote_response(&self) -> RemoteResponse {
        RemoteResponse {
            code: self.status,
            message: self.reason.clone(),
            headers: self.headers.clone(),
            is_error: !self.is_success(),
        }
    }
}

/// HTTP 传输层。超时、重试与取消都由实现方负责
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: BlobRequest) -> VfsResult<BlobResponse>;
}

/// 基于 reqwest 的传输实现
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: BlobRequest) -> VfsResult<BlobResponse> {
        let url = request.url()?;
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| VfsError::InvalidArgument(format!("无效的 HTTP 方法: {}", e)))?;
        debug!("{} {}", method, url);

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            // 由 reqwest 根据 URL 与请求体自行填写
            if name.eq_ignore_ascii_case("host") || name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .body(request.body)
            .send()
            .await
            .map_err(|e| VfsError::RemoteFailure(format!("请求发送失败: {}", e)))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| VfsError::RemoteFailure(format!("读取响应失败: {}", e)))?
            .to_vec();

        Ok(BlobResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
        })
    }
}
