//! 打开文件存储模块。
//!
//! 把单个文件载入为 "行号 -> 行文本" 的有序表，支持按行读写与保存。

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::error::{FileSystemError, Result};

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// 对外返回的行表：行号字符串 -> 行文本。
pub type LineMap = BTreeMap<String, String>;

/// 行号键。
///
/// 可解析为数字的键按数值排序（数值相同再按字面），其余键排在之后并按字面排序。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey(String);

impl LineKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn number(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl From<usize> for LineKey {
    fn from(number: usize) -> Self {
        Self(number.to_string())
    }
}

impl From<&str> for LineKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl Display for LineKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for LineKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.number(), other.number()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for LineKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
struct OpenFile {
    path: Option<PathBuf>,
    lines: BTreeMap<LineKey, String>,
}

impl OpenFile {
    fn clear(&mut self) {
        self.path = None;
        self.lines.clear();
    }

    fn snapshot(&self) -> LineMap {
        self.lines
            .iter()
            .map(|(key, text)| (key.to_string(), text.clone()))
            .collect()
    }
}

/// 单个会话的打开文件存储。
///
/// 同一时刻最多打开一个文件；未打开文件时行表为空。
#[derive(Debug)]
pub struct OpenFileStore {
    root: PathBuf,
    state: Mutex<OpenFile>,
}

impl OpenFileStore {
    /// 创建存储，相对路径基于 `root` 解析。
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            state: Mutex::new(OpenFile::default()),
        }
    }

    /// 打开文件并载入全部行。
    ///
    /// 之前打开的文件直接丢弃，不会隐式保存。读取失败时存储回到未打开状态。
    pub fn open(&self, path: &str) -> Result<LineMap> {
        if path.is_empty() {
            return Err(FileSystemError::InvalidPath);
        }

        let mut state = self.lock()?;
        state.clear();

        let target = self.root.join(path);
        info!(path = %target.display(), "Opening file");

        let bytes = fs::read(&target).map_err(FileSystemError::io("read", &target))?;
        state.lines = String::from_utf8_lossy(&bytes)
            .lines()
            .enumerate()
            .map(|(index, line)| (LineKey::from(index + 1), line.to_string()))
            .collect();
        state.path = Some(target);

        debug!(lines = state.lines.len(), "File loaded");
        Ok(state.snapshot())
    }

    /// 按行号顺序把全部行写回文件，每行以平台换行符结尾。
    pub fn save(&self) -> Result<()> {
        let state = self.lock()?;
        let path = state.path.as_deref().ok_or(FileSystemError::NoFileOpen)?;
        info!(path = %path.display(), lines = state.lines.len(), "Saving file");

        write_lines(path, state.lines.values()).map_err(FileSystemError::io("write", path))
    }

    /// 读取一行。
    pub fn read_line(&self, key: &str) -> Result<LineMap> {
        let state = self.lock()?;
        debug!(line = %key, "Reading line");

        state
            .lines
            .get(&LineKey::from(key))
            .map(|text| LineMap::from([(key.to_string(), text.clone())]))
            .ok_or_else(|| FileSystemError::LineNotFound(key.to_string()))
    }

    /// 写入一行，键不存在时新增，不做连续性检查。
    ///
    /// 未打开文件时同样写入行表，下一次打开或关闭时丢弃。
    pub fn write_line(&self, key: &str, text: &str) -> Result<()> {
        let mut state = self.lock()?;
        debug!(line = %key, "Writing line");

        state.lines.insert(LineKey::from(key), text.to_string());
        Ok(())
    }

    /// 关闭当前文件并清空行表。
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(path) = state.path.as_deref() {
            info!(path = %path.display(), "Closing file");
        }
        state.clear();
    }

    /// 当前打开的文件路径。
    pub fn current_path(&self) -> Option<PathBuf> {
        self.lock().ok().and_then(|state| state.path.clone())
    }

    pub fn line_count(&self) -> usize {
        self.lock().map(|state| state.lines.len()).unwrap_or_default()
    }

    /// 当前行表快照。
    pub fn lines(&self) -> Result<LineMap> {
        Ok(self.lock()?.snapshot())
    }

    fn lock(&self) -> Result<MutexGuard<'_, OpenFile>> {
        self.state.lock().map_err(|_| FileSystemError::LockPoisoned)
    }
}

fn write_lines<'a>(path: &Path, lines: impl Iterator<Item = &'a String>) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for line in lines {
        writer.write_all(line.as_bytes())?;
        writer.write_all(LINE_ENDING.as_bytes())?;
    }
    writer.flush()
}
