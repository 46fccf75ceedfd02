//! 命令分发器：解码入站帧，路由到目录索引或打开文件存储，再编码响应。

use std::path::Path;

use file_capabilities::{OpenFileStore, PathCatalog};
use sharework_api_types::{Command, Envelope};
use tracing::{debug, warn};

/// 无法解码的帧使用的操作标签。
pub const INVALID_MESSAGE: &str = "invalid_message";

/// 处理过程意外中断时使用的操作标签。
pub const INTERNAL_ERROR: &str = "internal_error";

/// 单个会话的命令分发器，持有该会话独占的目录索引与打开文件存储。
#[derive(Debug)]
pub struct Dispatcher {
    catalog: PathCatalog,
    store: OpenFileStore,
}

impl Dispatcher {
    /// 创建以 `root` 为根目录的分发器。
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            catalog: PathCatalog::new(root),
            store: OpenFileStore::new(root),
        }
    }

    pub fn catalog(&self) -> &PathCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &OpenFileStore {
        &self.store
    }

    /// 处理一帧线上文本，总是返回一帧响应文本。
    pub fn handle(&self, text: &str) -> String {
        let response = self.respond(text);
        debug!(message = %response.message, success = response.is_success(), "prepared response");
        response.encode()
    }

    /// 处理一帧线上文本，返回响应信封。
    pub fn respond(&self, text: &str) -> Envelope {
        let envelope = match Envelope::decode(text) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(error = %err, "failed to decode frame");
                return Envelope::error(INVALID_MESSAGE, err.to_string());
            }
        };

        match Command::from_envelope(&envelope) {
            Ok(command) => self.execute(command),
            Err(err) => {
                warn!(operation = %err.operation(), error = %err, "rejected command");
                Envelope::error(err.operation(), err.to_string())
            }
        }
    }

    /// 执行一条已解析的命令。
    pub fn execute(&self, command: Command) -> Envelope {
        let operation = command.operation();
        debug!(operation, "executing command");

        let result = match command {
            Command::PathEach => self.catalog.list_all().map(Some),
            Command::PathSearch { cond } => self.catalog.search(&cond).map(Some),
            Command::PathCreate { path } => self.catalog.create(&path).map(Some),
            Command::PathDelete { path } => self.catalog.delete(&path).map(Some),
            Command::PathEnd => {
                self.catalog.reset();
                Ok(None)
            }
            Command::FileOpen { path } => self.store.open(&path).map(Some),
            Command::FileSave => self.store.save().map(|()| None),
            Command::FileEnd => {
                self.store.close();
                Ok(None)
            }
            Command::FileReadLine { line } => self.store.read_line(&line).map(Some),
            Command::FileWriteLine { line, text } => {
                self.store.write_line(&line, &text).map(|()| None)
            }
        };

        match result {
            Ok(value) => Envelope::success(operation, value),
            Err(err) => {
                warn!(operation, error = %err, "command failed");
                Envelope::error(operation, err.to_string())
            }
        }
    }

    /// 释放目录索引与打开文件状态。
    pub fn reset(&self) {
        self.catalog.reset();
        self.store.close();
    }
}
