//! 文件会话 WebSocket 处理器。
//!
//! 将统一的应用状态适配到 file_session 的通道适配器。

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use file_session::ws_api::{principal_from_headers, serve_socket};
use tracing::info;

use super::state::AppState;

/// Axum WebSocket 升级 handler，认证用户名由上游请求头提供。
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let principal = principal_from_headers(&headers, &state.config.principal_header);
    info!(principal = %principal, "new file session connection request");

    let sessions = state.sessions.clone();
    let buffer_size = state.config.outbound_buffer_size;
    ws.on_upgrade(move |socket| serve_socket(socket, sessions, principal, buffer_size))
}
