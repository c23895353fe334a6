use crate::vfs::storage::azure::Credential;
use crate::vfs::{VfsError, VfsResult};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// 存储后端及其参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Local {
        base_dir: String,
    },
    /// 进程内对象存储，`base_dir` 形如 `s3://bucket`
    Memory {
        base_dir: String,
    },
    Azure {
        account_name: String,
        account_key: String,
        container: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: StorageBackend,
    pub host: String,
    pub port: u16,
    pub log_file: Option<PathBuf>,
    pub session_ttl: Duration,
}

impl Config {
    /// 读取 `.env` 与进程环境变量
    pub fn from_env() -> VfsResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> VfsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let kind = get("STORAGE_BACKEND").unwrap_or_else(|| "local".to_string());
        let backend = match kind.to_ascii_lowercase().as_str() {
            "local" => StorageBackend::Local {
                base_dir: get("STORAGE_BASE_DIR").ok_or_else(|| missing("STORAGE_BASE_DIR"))?,
            },
            "memory" => StorageBackend::Memory {
                base_dir: get("STORAGE_BASE_DIR").unwrap_or_else(|| "s3://default".to_string()),
            },
            "azure" => {
                let account_name =
                    get("AZURE_ACCOUNT_NAME").ok_or_else(|| missing("AZURE_ACCOUNT_NAME"))?;
                let account_key =
                    get("AZURE_ACCOUNT_KEY").ok_or_else(|| missing("AZURE_ACCOUNT_KEY"))?;
                // 启动时就校验密钥
                Credential::new(&account_name, &account_key)?;
                StorageBackend::Azure {
                    account_name,
                    account_key,
                    container: get("AZURE_CONTAINER"),
                }
            }
            other => {
                return Err(VfsError::ConfigurationError(format!(
                    "未知的存储后端: {}",
                    other
                )))
            }
        };

        let port = match get("CONSOLE_PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| VfsError::ConfigurationError(format!("无效的端口: {}", port)))?,
            None => DEFAULT_PORT,
        };
        let session_ttl = match get("SESSION_TTL_SECS") {
            Some(secs) => secs.parse().map_err(|_| {
                VfsError::ConfigurationError(format!("无效的会话有效期: {}", secs))
            })?,
            None => DEFAULT_SESSION_TTL_SECS,
        };

        Ok(Self {
            backend,
            host: get("CONSOLE_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            log_file: get("LOG_FILE").map(PathBuf::from),
            session_ttl: Duration::from_secs(session_ttl),
        })
    }
}

fn missing(key: &str) -> VfsError {
    VfsError::ConfigurationError(format!("缺少环境变量 {}", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> VfsResult<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn local_backend_with_defaults() {
        let config = config(&[("STORAGE_BASE_DIR", "/tmp/store")]).unwrap();
        assert_eq!(
            config.backend,
            StorageBackend::Local {
                base_dir: "/tmp/store".to_string()
            }
        );
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
        assert!(config.log_file.is_none());
    }

    #[test]
    fn local_backend_requires_base_dir() {
        assert!(matches!(
            config(&[]),
            Err(VfsError::ConfigurationError(_))
        ));
    }

    #[test]
    fn azure_key_is_checked_up_front() {
        let err = config(&[
            ("STORAGE_BACKEND", "azure"),
            ("AZURE_ACCOUNT_NAME", "acct"),
            ("AZURE_ACCOUNT_KEY", "not base64!"),
        ])
        .unwrap_err();
        assert!(matches!(err, VfsError::ConfigurationError(_)));

        let config = config(&[
            ("STORAGE_BACKEND", "Azure"),
            ("AZURE_ACCOUNT_NAME", "acct"),
            ("AZURE_ACCOUNT_KEY", "a2V5"),
            ("AZURE_CONTAINER", "c"),
            ("CONSOLE_PORT", "9000"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert!(matches!(
            config.backend,
            StorageBackend::Azure { ref container, .. } if container.as_deref() == Some("c")
        ));
    }

    #[test]
    fn unknown_backend_and_bad_numbers_are_rejected() {
        assert!(config(&[("STORAGE_BACKEND", "ftp")]).is_err());
        assert!(config(&[("STORAGE_BASE_DIR", "/x"), ("CONSOLE_PORT", "http")]).is_err());
        assert!(config(&[("STORAGE_BASE_DIR", "/x"), ("SESSION_TTL_SECS", "-1")]).is_err());
    }
}
