//! Blob 服务的 SharedKey 签名。
//!
//! 待签名字符串由三部分按换行拼接：
//! 1. 大写的 HTTP 方法
//! 2. 十一个固定请求头的值（缺失为空行）
//! 3. 排序后的 `x-ms-*` 头，以及 `/账户/路径` 加排序后的查询参数
//!
//! 签名为账户密钥对该字符串做 HMAC-SHA256 后的 Base64。

use super::transport::BlobRequest;
use crate::vfs::model::{VfsError, VfsResult};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// 参与签名的固定请求头，顺序不可变
pub const SIGNED_HEADERS: [&str; 11] = [
    "content-encoding",
    "content-language",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "if-modified-since",
    "if-match",
    "if-none-match",
    "if-unmodified-since",
    "range",
];

/// 账户名与解码后的密钥。密钥只在构造时解码一次
#[derive(Clone)]
pub struct Credential {
    account_name: String,
    key: Vec<u8>,
}

impl Credential {
    pub fn new(account_name: &str, account_key: &str) -> VfsResult<Self> {
        let account_name = account_name.trim();
        if account_name.is_empty() {
            return Err(VfsError::ConfigurationError("账户名为空".to_string()));
        }
        let key = BASE64_STANDARD
            .decode(account_key.trim())
            .map_err(|e| VfsError::ConfigurationError(format!("账户密钥不是有效的 Base64: {}", e)))?;
        if key.is_empty() {
            return Err(VfsError::ConfigurationError("账户密钥为空".to_string()));
        }
        Ok(Self {
            account_name: account_name.to_string(),
            key,
        })
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("account_name", &self.account_name)
            .field("key", &"***")
            .finish()
    }
}

pub struct AzureSigner;

impl AzureSigner {
    /// 生成待签名字符串
    pub fn string_to_sign(request: &BlobRequest, account: &str) -> VfsResult<String> {
        let mut lines = Vec::with_capacity(SIGNED_HEADERS.len() + 2);
        lines.push(request.method.to_ascii_uppercase());

        for name in SIGNED_HEADERS {
            let value = request.header(name).unwrap_or("");
            reject_line_breaks(name, value)?;
            lines.push(value.to_string());
        }

        let mut result = lines.join("\n");
        result.push('\n');
        for (name, value) in Self::canonicalized_headers(request)? {
            result.push_str(&format!("{}:{}\n", name, value));
        }
        result.push_str(&Self::canonicalized_resource(request, account)?);
        Ok(result)
    }

    /// 返回 `SharedKey 账户:签名`
    pub fn authorization(request: &BlobRequest, credential: &Credential) -> VfsResult<String> {
        let string_to_sign = Self::string_to_sign(request, credential.account_name())?;
        let mut mac = HmacSha256::new_from_slice(&credential.key)
            .map_err(|e| VfsError::ConfigurationError(format!("HMAC 初始化失败: {}", e)))?;
        mac.update(string_to_sign.as_bytes());
        let signature = BASE64_STANDARD.encode(mac.finalize().into_bytes());
        Ok(format!("SharedKey {}:{}", credential.account_name(), signature))
    }

    /// 计算签名并写入 Authorization 头
    pub fn sign(request: &mut BlobRequest, credential: &Credential) -> VfsResult<()> {
        let authorization = Self::authorization(request, credential)?;
        request.set_header("Authorization", &authorization);
        Ok(())
    }

    /// 小写、折叠换行、去空白后按名字排序的 `x-ms-*` 头
    fn canonicalized_headers(request: &BlobRequest) -> VfsResult<BTreeMap<String, String>> {
        let mut headers = BTreeMap::new();
        for (name, value) in &request.headers {
            let name = name.trim().to_ascii_lowercase();
            if !name.starts_with("x-ms-") {
                continue;
            }
            let value = value.replace("\r\n", " ").trim().to_string();
            reject_line_breaks(&name, &value)?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    /// `/账户` 加实际发送的已编码 URL 路径（含服务地址自带的路径），
    /// 随后每个查询参数一行 `key:v1,v2`，值为解码后的原值
    fn canonicalized_resource(request: &BlobRequest, account: &str) -> VfsResult<String> {
        let url = request.url()?;
        let mut resource = format!("/{}{}", account, url.path());

        let mut params: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for (key, value) in &request.query {
            params
                .entry(key.to_ascii_lowercase())
                .or_default()
                .push(value.as_str());
        }
        for (key, mut values) in params {
            values.sort_unstable();
            resource.push_str(&format!("\n{}:{}", key, values.join(",")));
        }
        Ok(resource)
    }
}

fn reject_line_breaks(name: &str, value: &str) -> VfsResult<()> {
    if value.contains('\r') || value.contains('\n') {
        return Err(VfsError::InvalidArgument(format!("请求头 {} 含有换行", name)));
    }
    Ok(())
}
