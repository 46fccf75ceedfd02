use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("会话未找到: {0}")]
    SessionNotFound(String),

    #[error("根目录不可用: {path}: {source}")]
    RootUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("根目录不是目录: {0}")]
    RootNotADirectory(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
