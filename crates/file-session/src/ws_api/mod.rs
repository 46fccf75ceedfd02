//! WebSocket 通道适配模块，仅在 `ws-api` feature 启用时可用。

mod handler;

pub use handler::{ANONYMOUS_PRINCIPAL, principal_from_headers, serve_socket};
