//! File Capabilities - 文件会话能力模块。
//!
//! 提供目录索引（[`PathCatalog`]）与按行编辑的打开文件存储（[`OpenFileStore`]），
//! 每个连接会话各持有一份实例。

pub mod catalog;
pub mod error;
pub mod line_store;

pub use catalog::{BACKUP_SUFFIX, CatalogIndex, PathCatalog};
pub use error::{FileSystemError, Result};
pub use line_store::{LineKey, LineMap, OpenFileStore};
