//! 会话查询 API 路由。

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use file_session::SessionSummary;

use super::state::AppState;

/// 创建会话查询路由。
pub fn create_sessions_router() -> Router<Arc<AppState>> {
    Router::new().route("/api/sessions", get(list_sessions))
}

/// 列出当前活跃的文件会话。
async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<SessionSummary>> {
    Json(state.sessions.list_sessions().await)
}
