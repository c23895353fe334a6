use crate::config::StorageBackend;
use crate::vfs::{StorageFacade, VfsResult};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

pub type SharedStorage = Arc<AsyncMutex<StorageFacade>>;

struct Session {
    storage: SharedStorage,
    last_used: Instant,
}

/// 控制台会话。每个会话持有自己的存储门面，当前目录互不影响
pub struct SessionManager {
    backend: StorageBackend,
    ttl: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionManager {
    pub fn new(backend: StorageBackend, ttl: Duration) -> Self {
        info!("初始化会话管理器，会话有效期 {} 秒", ttl.as_secs());
        Self {
            backend,
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 新建会话并返回会话 ID
    pub async fn open(&self) -> VfsResult<String> {
        let storage = StorageFacade::from_config(&self.backend).await?;
        let session_id = Uuid::new_v4().to_string();
        self.sessions().insert(
            session_id.clone(),
            Session {
                storage: Arc::new(AsyncMutex::new(storage)),
                last_used: Instant::now(),
            },
        );
        debug!("新会话: {}", session_id);
        Ok(session_id)
    }

    /// 取出会话的存储并刷新最后使用时间；过期的会话会被移除
    pub fn get(&self, session_id: &str) -> Option<SharedStorage> {
        let mut sessions = self.sessions();
        let expired = sessions
            .get(session_id)
            .map(|session| session.last_used.elapsed() > self.ttl)?;
        if expired {
            warn!("会话已过期: {}", session_id);
            sessions.remove(session_id);
            return None;
        }
        let session = sessions.get_mut(session_id)?;
        session.last_used = Instant::now();
        Some(session.storage.clone())
    }

    pub fn close(&self, session_id: &str) -> bool {
        self.sessions().remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清理过期会话，返回清理数量
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions();
        let before = sessions.len();
        sessions.retain(|_, session| session.last_used.elapsed() <= self.ttl);
        let removed = before - sessions.len();
        if removed > 0 {
            info!("清理了 {} 个过期的会话", removed);
        }
        removed
    }
}
