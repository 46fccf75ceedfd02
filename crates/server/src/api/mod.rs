//! API 路由模块。
//!
//! 提供文件会话与回显两个 WebSocket 端点，以及会话查询接口。

pub mod echo;
pub mod sessions;
pub mod state;
pub mod ws;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;

pub use echo::echo_handler;
pub use sessions::create_sessions_router;
pub use state::AppState;
pub use ws::websocket_handler;

/// 组装全部路由。
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(&state.config.files_connect_path, get(websocket_handler))
        .route(&state.config.echo_connect_path, get(echo_handler))
        .merge(create_sessions_router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
