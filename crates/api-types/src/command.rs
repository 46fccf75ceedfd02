//! 文件协议命令集合。
//!
//! 入站信封在边界处一次性解码为 [`Command`]，之后只做穷尽匹配。

use thiserror::Error;

use crate::envelope::Envelope;

/// 操作码常量。
pub mod operation {
    pub const PATH_EACH: &str = "path_each";
    pub const PATH_SEARCH: &str = "path_search";
    pub const PATH_CREATE: &str = "path_create";
    pub const PATH_DELETE: &str = "path_delete";
    pub const PATH_END: &str = "path_end";
    pub const FILE_OPEN: &str = "file_open";
    pub const FILE_SAVE: &str = "file_save";
    pub const FILE_END: &str = "file_end";
    pub const FILE_READ_LINE: &str = "file_read_line";
    pub const FILE_WRITE_LINE: &str = "file_write_line";
}

/// `value` 中约定的字段名。
pub mod field {
    pub const PATH: &str = "path";
    pub const COND: &str = "cond";
    pub const VALUE: &str = "value";
    pub const LINE_NUM: &str = "lineNum";
}

/// 命令解析错误。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown message type")]
    UnknownOperation(String),

    #[error("Missing required field: {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
}

impl CommandError {
    /// 错误响应使用的操作标签。
    pub fn operation(&self) -> &str {
        match self {
            Self::UnknownOperation(operation) => operation,
            Self::MissingField { operation, .. } => operation,
        }
    }
}

/// 客户端可发起的命令。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 列出根目录下的全部文件。
    PathEach,
    /// 按正则匹配完整路径。
    PathSearch { cond: String },
    /// 创建文件或目录。
    PathCreate { path: String },
    /// 软删除（重命名为 `.bk`）。
    PathDelete { path: String },
    /// 清空目录索引。
    PathEnd,
    /// 打开文件并载入行表。
    FileOpen { path: String },
    /// 保存行表到文件。
    FileSave,
    /// 关闭当前文件。
    FileEnd,
    /// 读取一行。
    FileReadLine { line: String },
    /// 写入一行。
    FileWriteLine { line: String, text: String },
}

impl Command {
    /// 从入站信封解析命令。
    ///
    /// `path` 缺省时按空字符串处理，由具体能力拒绝为非法路径。
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, CommandError> {
        let path = || envelope.field(field::PATH).unwrap_or_default().to_string();
        let required = |operation: &'static str, name: &'static str| {
            envelope
                .field(name)
                .map(str::to_string)
                .ok_or(CommandError::MissingField {
                    operation,
                    field: name,
                })
        };

        let command = match envelope.message.as_str() {
            operation::PATH_EACH => Self::PathEach,
            operation::PATH_SEARCH => Self::PathSearch {
                cond: required(operation::PATH_SEARCH, field::COND)?,
            },
            operation::PATH_CREATE => Self::PathCreate { path: path() },
            operation::PATH_DELETE => Self::PathDelete { path: path() },
            operation::PATH_END => Self::PathEnd,
            operation::FILE_OPEN => Self::FileOpen { path: path() },
            operation::FILE_SAVE => Self::FileSave,
            operation::FILE_END => Self::FileEnd,
            operation::FILE_READ_LINE => Self::FileReadLine {
                line: required(operation::FILE_READ_LINE, field::LINE_NUM)?,
            },
            operation::FILE_WRITE_LINE => Self::FileWriteLine {
                line: required(operation::FILE_WRITE_LINE, field::LINE_NUM)?,
                text: required(operation::FILE_WRITE_LINE, field::VALUE)?,
            },
            other => return Err(CommandError::UnknownOperation(other.to_string())),
        };

        Ok(command)
    }

    /// 命令对应的操作码。
    pub fn operation(&self) -> &'static str {
        match self {
            Self::PathEach => operation::PATH_EACH,
            Self::PathSearch { .. } => operation::PATH_SEARCH,
            Self::PathCreate { .. } => operation::PATH_CREATE,
            Self::PathDelete { .. } => operation::PATH_DELETE,
            Self::PathEnd => operation::PATH_END,
            Self::FileOpen { .. } => operation::FILE_OPEN,
            Self::FileSave => operation::FILE_SAVE,
            Self::FileEnd => operation::FILE_END,
            Self::FileReadLine { .. } => operation::FILE_READ_LINE,
            Self::FileWriteLine { .. } => operation::FILE_WRITE_LINE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Payload;

    fn request(message: &str, fields: &[(&str, &str)]) -> Envelope {
        let value: Payload = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Envelope::request(message, value)
    }

    #[test]
    fn parses_fieldless_commands() {
        for (message, expected) in [
            ("path_each", Command::PathEach),
            ("path_end", Command::PathEnd),
            ("file_save", Command::FileSave),
            ("file_end", Command::FileEnd),
        ] {
            let command = Command::from_envelope(&request(message, &[])).expect("known command");
            assert_eq!(command, expected);
            assert_eq!(command.operation(), message);
        }
    }

    #[test]
    fn parses_commands_with_fields() {
        let command = Command::from_envelope(&request("file_write_line", &[
            ("lineNum", "2"),
            ("value", "B"),
        ]))
        .expect("write line parses");
        assert_eq!(command, Command::FileWriteLine {
            line: "2".to_string(),
            text: "B".to_string(),
        });

        let command = Command::from_envelope(&request("path_search", &[("cond", ".*\\.txt")]))
            .expect("search parses");
        assert_eq!(command, Command::PathSearch {
            cond: ".*\\.txt".to_string(),
        });
    }

    #[test]
    fn missing_path_becomes_empty() {
        let command = Command::from_envelope(&request("file_open", &[])).expect("open parses");
        assert_eq!(command, Command::FileOpen {
            path: String::new(),
        });
    }

    #[test]
    fn missing_required_field_is_reported() {
        let err = Command::from_envelope(&request("file_write_line", &[("lineNum", "1")]))
            .expect_err("value is required");
        assert_eq!(err, CommandError::MissingField {
            operation: "file_write_line",
            field: "value",
        });
        assert_eq!(err.operation(), "file_write_line");
    }

    #[test]
    fn unknown_operation_keeps_received_tag() {
        let err = Command::from_envelope(&request("file_rename", &[])).expect_err("unknown");
        assert_eq!(err.operation(), "file_rename");
        assert_eq!(err.to_string(), "Unknown message type");
    }
}
