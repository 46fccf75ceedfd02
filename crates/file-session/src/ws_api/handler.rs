use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::http::HeaderMap;
use futures_util::{SinkExt, StreamExt};
use sharework_api_types::encode_error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dispatcher::INTERNAL_ERROR;
use crate::session::{FileSession, SessionManager};

/// 上游未提供认证用户时使用的名称。
pub const ANONYMOUS_PRINCIPAL: &str = "anonymous";

/// 从上游认证组件写入的请求头中读取用户名。
pub fn principal_from_headers(headers: &HeaderMap, header: &str) -> String {
    headers
        .get(header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| ANONYMOUS_PRINCIPAL.to_string())
}

/// 驱动一个已升级的 WebSocket 连接。
///
/// 连接建立时创建会话，逐帧顺序处理，连接断开时关闭会话。
pub async fn serve_socket(
    socket: WebSocket,
    manager: Arc<SessionManager>,
    principal: String,
    buffer_size: usize,
) {
    let session = manager.open_session(&principal).await;
    let session_id = session.id().clone();
    let (mut sender, mut receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<String>(buffer_size);
    info!(session_id = %session_id, "file session connection established");

    let writer_task = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                debug!(session_id = %session_id, payload = %text, "received frame");
                let response = dispatch_frame(session.clone(), text.as_str().to_owned()).await;
                if out_tx.send(response).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(session_id = %session_id, error = %err, "WebSocket receive error");
                break;
            }
        }
    }

    drop(out_tx);
    if let Err(err) = writer_task.await {
        warn!(error = %err, "WebSocket writer task exited with join error");
    }

    if let Err(err) = manager.close_session(&session_id).await {
        warn!(session_id = %session_id, error = %err, "failed to close file session");
    }

    info!(session_id = %session_id, "file session connection closed");
}

// 文件系统 I/O 在阻塞线程池中执行，同一连接的帧仍按到达顺序逐个处理。
async fn dispatch_frame(session: Arc<FileSession>, text: String) -> String {
    match tokio::task::spawn_blocking(move || session.handle_frame(&text)).await {
        Ok(response) => response,
        Err(err) => {
            error!(error = %err, "frame handler task failed");
            encode_error(INTERNAL_ERROR, "Failed to process message")
        }
    }
}
