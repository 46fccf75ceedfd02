use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    EventBroadcaster, EventStream, FileSession, Result, SessionError, SessionEvent, SessionId,
    SessionSummary, session::Session,
};

/// 文件会话生命周期管理器。
pub struct SessionManager {
    root: PathBuf,
    sessions: Arc<RwLock<HashMap<SessionId, Arc<FileSession>>>>,
    event_broadcaster: Arc<EventBroadcaster>,
}

impl SessionManager {
    /// 创建会话管理器，所有会话共享同一个文件根目录。
    pub fn new(root: impl Into<PathBuf>, event_broadcaster: Arc<EventBroadcaster>) -> Self {
        Self {
            root: root.into(),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            event_broadcaster,
        }
    }

    /// 为新连接创建会话。
    #[tracing::instrument(skip(self))]
    pub async fn open_session(&self, principal: &str) -> Arc<FileSession> {
        let session = Session {
            id: SessionId::new(),
            principal: principal.to_string(),
            opened_at: Utc::now(),
        };
        let session_id = session.id.clone();

        info!(session_id = %session_id, principal = %principal, "opening file session");

        let file_session = Arc::new(FileSession::new(session, &self.root));
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.clone(), file_session.clone());
        drop(sessions);

        self.event_broadcaster.emit(SessionEvent::SessionOpened {
            session_id,
            principal: principal.to_string(),
        });

        file_session
    }

    /// 关闭会话，释放目录索引与打开文件状态。
    #[tracing::instrument(skip(self))]
    pub async fn close_session(&self, session_id: &SessionId) -> Result<()> {
        info!(session_id = %session_id, "closing file session");

        let file_session = {
            let mut sessions = self.sessions.write().await;
            sessions
                .remove(session_id)
                .ok_or_else(|| SessionError::SessionNotFound(session_id.to_string()))?
        };

        file_session.mark_closed();
        let frames_handled = file_session.frames_handled();
        let released = file_session.clone();
        if let Err(err) = tokio::task::spawn_blocking(move || released.dispatcher().reset()).await
        {
            warn!(session_id = %session_id, error = %err, "failed to reset session state");
        }

        self.event_broadcaster.emit(SessionEvent::SessionClosed {
            session_id: session_id.clone(),
            frames_handled,
        });

        Ok(())
    }

    /// 列出当前所有会话概要。
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        let sessions: Vec<Arc<FileSession>> = self.sessions.read().await.values().cloned().collect();

        // 读取打开文件路径需要获取存储锁，放到阻塞线程池执行。
        let summaries = tokio::task::spawn_blocking(move || {
            let mut summaries: Vec<SessionSummary> =
                sessions.iter().map(|session| session.summary()).collect();
            summaries.sort_by(|a, b| a.opened_at.cmp(&b.opened_at));
            summaries
        })
        .await;

        summaries.unwrap_or_else(|err| {
            warn!(error = %err, "failed to collect session summaries");
            Vec::new()
        })
    }

    /// 查询指定会话。
    pub async fn get_session(&self, session_id: &SessionId) -> Option<Arc<FileSession>> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// 订阅会话事件。
    pub fn subscribe_events(&self) -> EventStream {
        self.event_broadcaster.subscribe()
    }
}
