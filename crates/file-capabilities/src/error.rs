use std::path::Path;

use thiserror::Error;

/// 文件能力错误类型。
#[derive(Debug, Error)]
pub enum FileSystemError {
    #[error("Invalid path provided")]
    InvalidPath,

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("File or directory already exists: {0}")]
    AlreadyExists(String),

    #[error("File or directory does not exist: {0}")]
    NotFound(String),

    #[error("Backup file already exists: {0}")]
    BackupExists(String),

    #[error("Line not found: {0}")]
    LineNotFound(String),

    #[error("No file is open")]
    NoFileOpen,

    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("State lock poisoned")]
    LockPoisoned,
}

impl FileSystemError {
    /// 生成把 `std::io::Error` 包装为 [`FileSystemError::Io`] 的映射函数。
    pub(crate) fn io(
        action: &'static str,
        path: &Path,
    ) -> impl FnOnce(std::io::Error) -> Self + use<> {
        let path = path.display().to_string();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, FileSystemError>;
