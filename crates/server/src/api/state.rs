//! 统一的应用状态。

use std::path::PathBuf;
use std::sync::Arc;

use file_session::{EventBroadcaster, ServerConfig, SessionManager};

/// 统一的应用状态，包含所有路由共享的数据。
#[derive(Clone)]
pub struct AppState {
    /// 服务配置。
    pub config: Arc<ServerConfig>,
    /// 文件会话管理器，每个连接各自持有独立的会话状态。
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    /// 创建新的应用状态，`root` 为已校验的文件根目录。
    pub fn new(config: ServerConfig, root: PathBuf) -> Self {
        let event_broadcaster = Arc::new(EventBroadcaster::new(config.event_buffer_size));
        Self {
            sessions: Arc::new(SessionManager::new(root, event_broadcaster)),
            config: Arc::new(config),
        }
    }
}
