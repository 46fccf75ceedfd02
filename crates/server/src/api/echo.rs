//! 回显 WebSocket 处理器，用于客户端连通性调试。

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use file_session::INVALID_MESSAGE;
use futures_util::{SinkExt, StreamExt};
use sharework_api_types::Envelope;
use tracing::{debug, info, warn};

const RESPONSE_PREFIX: &str = "RESPONSE : ";

pub async fn echo_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
    info!("new echo connection request");
    ws.on_upgrade(handle_socket)
}

async fn handle_socket(socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    info!("echo connection established");

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                debug!(payload = %text, "received echo message");
                let reply = echo_reply(text.as_str());
                if sender.send(Message::Text(reply.into())).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "echo receive error");
                break;
            }
        }
    }

    info!("echo connection closed");
}

fn echo_reply(text: &str) -> String {
    match Envelope::decode(text) {
        Ok(envelope) => {
            Envelope::success(format!("{RESPONSE_PREFIX}{}", envelope.message), None).encode()
        }
        Err(err) => Envelope::error(INVALID_MESSAGE, err.to_string()).encode(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_reply_prefixes_message() {
        let reply = echo_reply(r#"{"type":"echo","key":"","message":"hello","value":{}}"#);
        let envelope = Envelope::decode(&reply).expect("reply decodes");

        assert!(envelope.is_success());
        assert_eq!(envelope.message, "RESPONSE : hello");
        assert!(envelope.value.is_none());
    }

    #[test]
    fn test_echo_reply_rejects_malformed_frame() {
        let envelope = Envelope::decode(&echo_reply("hello")).expect("reply decodes");
        assert!(envelope.is_error());
        assert_eq!(envelope.message, INVALID_MESSAGE);
    }
}
