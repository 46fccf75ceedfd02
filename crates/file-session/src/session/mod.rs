//! 会话模型与会话管理模块。

use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dispatcher::Dispatcher;

/// 会话管理器实现。
pub mod manager;
/// 导出会话管理器类型。
pub use manager::SessionManager;

/// 会话唯一标识。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// 生成新的随机会话 ID。
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for SessionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 会话运行状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// 连接存活，可处理请求。
    Active,
    /// 会话已关闭，状态已释放。
    Closed,
}

/// 会话元数据。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// 会话 ID。
    pub id: SessionId,
    /// 已认证的用户名。
    pub principal: String,
    /// 连接建立时间（UTC）。
    pub opened_at: DateTime<Utc>,
}

/// 会话概要（HTTP 查询用）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub principal: String,
    pub status: SessionStatus,
    pub opened_at: DateTime<Utc>,
    pub frames_handled: u64,
    pub open_file: Option<String>,
}

/// 一个连接对应的文件会话。
///
/// 目录索引与打开文件存储随会话创建，随会话关闭释放，不与其他连接共享。
#[derive(Debug)]
pub struct FileSession {
    session: Session,
    dispatcher: Dispatcher,
    status: RwLock<SessionStatus>,
    frames_handled: AtomicU64,
}

impl FileSession {
    pub fn new(session: Session, root: &Path) -> Self {
        Self {
            session,
            dispatcher: Dispatcher::new(root),
            status: RwLock::new(SessionStatus::Active),
            frames_handled: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.session.id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn mark_closed(&self) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = SessionStatus::Closed;
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// 处理一帧入站文本并返回响应文本。
    pub fn handle_frame(&self, text: &str) -> String {
        self.frames_handled.fetch_add(1, Ordering::Relaxed);
        self.dispatcher.handle(text)
    }

    pub fn frames_handled(&self) -> u64 {
        self.frames_handled.load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session.id.to_string(),
            principal: self.session.principal.clone(),
            status: self.status(),
            opened_at: self.session.opened_at,
            frames_handled: self.frames_handled(),
            open_file: self
                .dispatcher
                .store()
                .current_path()
                .map(|path| path.display().to_string()),
        }
    }
}
