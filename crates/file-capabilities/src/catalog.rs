//! 目录索引模块。
//!
//! 遍历配置的根目录，维护 "文件名 -> 路径" 索引，并提供创建与软删除能力。

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use regex::Regex;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{FileSystemError, Result};

/// 软删除时追加的后缀。
pub const BACKUP_SUFFIX: &str = ".bk";

/// 文件名到完整路径的索引。
pub type CatalogIndex = BTreeMap<String, String>;

/// 单个会话的目录索引。
///
/// 所有操作在同一把锁内完成，文件系统 I/O 也包含在临界区中。
#[derive(Debug)]
pub struct PathCatalog {
    /// 索引根目录。
    root: PathBuf,
    /// 当前索引，仅在遍历成功后整体替换。
    index: Mutex<CatalogIndex>,
}

impl PathCatalog {
    /// 创建以 `root` 为根的目录索引。
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index: Mutex::new(CatalogIndex::new()),
        }
    }

    /// 当前索引快照。
    pub fn index(&self) -> Result<CatalogIndex> {
        Ok(self.lock()?.clone())
    }

    /// 列出根目录下的全部普通文件并重建索引。
    pub fn list_all(&self) -> Result<CatalogIndex> {
        let mut index = self.lock()?;
        info!(root = %self.root.display(), "Listing catalog");

        let mut collected = CatalogIndex::new();
        for entry in self.walk() {
            let entry = entry?;
            if entry.path().is_file() {
                insert_entry(&mut collected, entry.path());
            }
        }

        debug!(entries = collected.len(), "Catalog listed");
        *index = collected;
        Ok(index.clone())
    }

    /// 按正则表达式匹配完整路径并重建索引。
    ///
    /// 模式需匹配整个路径字符串，而不是其中的子串。
    pub fn search(&self, pattern: &str) -> Result<CatalogIndex> {
        let mut index = self.lock()?;
        Regex::new(pattern)?;
        let matcher = Regex::new(&format!("^(?:{pattern})$"))?;
        info!(root = %self.root.display(), pattern = %pattern, "Searching catalog");

        let mut collected = CatalogIndex::new();
        for entry in self.walk() {
            let entry = entry?;
            if matcher.is_match(&entry.path().to_string_lossy()) {
                insert_entry(&mut collected, entry.path());
            }
        }

        debug!(matches = collected.len(), "Catalog searched");
        *index = collected;
        Ok(index.clone())
    }

    /// 创建文件或目录。
    ///
    /// 末段名称包含 `.` 时视为文件（父目录必须存在），否则递归创建目录。
    pub fn create(&self, path: &str) -> Result<CatalogIndex> {
        let mut index = self.lock()?;
        let target = self.resolve(path)?;
        let name = base_name(&target)?;
        info!(path = %target.display(), "Creating path");

        if target.exists() {
            return Err(FileSystemError::AlreadyExists(target.display().to_string()));
        }

        if name.contains('.') {
            fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
                .map_err(FileSystemError::io("create file", &target))?;
        } else {
            fs::create_dir_all(&target).map_err(FileSystemError::io("create directory", &target))?;
        }

        index.insert(name, target.display().to_string());
        Ok(index.clone())
    }

    /// 软删除：把 `path` 重命名为 `path.bk`，不会覆盖已有备份。
    pub fn delete(&self, path: &str) -> Result<CatalogIndex> {
        let mut index = self.lock()?;
        let target = self.resolve(path)?;
        let name = base_name(&target)?;
        let backup = target.with_file_name(format!("{name}{BACKUP_SUFFIX}"));
        info!(path = %target.display(), backup = %backup.display(), "Deleting path");

        if !target.exists() {
            return Err(FileSystemError::NotFound(target.display().to_string()));
        }
        if backup.exists() {
            return Err(FileSystemError::BackupExists(backup.display().to_string()));
        }

        fs::rename(&target, &backup).map_err(FileSystemError::io("rename", &target))?;
        index.remove(&name);
        Ok(index.clone())
    }

    /// 清空索引，会话结束时调用。
    pub fn reset(&self) {
        self.index
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        info!(root = %self.root.display(), "Catalog reset");
    }

    fn lock(&self) -> Result<MutexGuard<'_, CatalogIndex>> {
        self.index.lock().map_err(|_| FileSystemError::LockPoisoned)
    }

    // 按文件名字典序遍历，同名文件以最后遍历到的为准。
    fn walk(&self) -> walkdir::IntoIter {
        WalkDir::new(&self.root).sort_by_file_name().into_iter()
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        if path.is_empty() {
            return Err(FileSystemError::InvalidPath);
        }
        Ok(self.root.join(path))
    }
}

fn base_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or(FileSystemError::InvalidPath)
}

fn insert_entry(index: &mut CatalogIndex, path: &Path) {
    let name = base_name(path).unwrap_or_else(|_| path.display().to_string());
    index.insert(name, path.display().to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, PathCatalog) {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        fs::create_dir_all(dir.path().join("docs/nested")).expect("nested dirs");
        fs::write(dir.path().join("readme.md"), "hello\n").expect("readme");
        fs::write(dir.path().join("docs/notes.txt"), "a\nb\n").expect("notes");
        fs::write(dir.path().join("docs/nested/deep.txt"), "deep\n").expect("deep");
        let catalog = PathCatalog::new(dir.path());
        (dir, catalog)
    }

    #[test]
    fn test_list_all_indexes_regular_files_only() {
        let (dir, catalog) = fixture();
        let index = catalog.list_all().expect("listing should succeed");

        assert_eq!(index.len(), 3);
        assert_eq!(
            index.get("notes.txt"),
            Some(&dir.path().join("docs/notes.txt").display().to_string())
        );
        assert!(!index.contains_key("docs"));
        assert!(!index.contains_key("nested"));
    }

    #[test]
    fn test_list_all_is_idempotent() {
        let (_dir, catalog) = fixture();
        let first = catalog.list_all().expect("first listing");
        let second = catalog.list_all().expect("second listing");
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_base_names_resolve_deterministically() {
        let (dir, catalog) = fixture();
        fs::create_dir_all(dir.path().join("alpha")).expect("alpha dir");
        fs::write(dir.path().join("alpha/notes.txt"), "other\n").expect("dup notes");

        let index = catalog.list_all().expect("listing should succeed");
        // "alpha" 先于 "docs" 遍历，后者覆盖前者。
        assert_eq!(
            index.get("notes.txt"),
            Some(&dir.path().join("docs/notes.txt").display().to_string())
        );
    }

    #[test]
    fn test_list_all_failure_keeps_previous_index() {
        let (dir, catalog) = fixture();
        catalog.list_all().expect("listing should succeed");

        fs::remove_dir_all(dir.path()).expect("root removed");
        assert!(matches!(catalog.list_all(), Err(FileSystemError::Walk(_))));
        assert_eq!(catalog.index().expect("index snapshot").len(), 3);
    }

    #[test]
    fn test_search_matches_full_path() {
        let (_dir, catalog) = fixture();

        let index = catalog.search(r".*\.txt").expect("search should succeed");
        assert_eq!(index.len(), 2);
        assert!(index.contains_key("notes.txt"));
        assert!(index.contains_key("deep.txt"));

        // 子串不算匹配。
        let index = catalog.search("notes").expect("search should succeed");
        assert!(index.is_empty());
        assert!(catalog.index().expect("index snapshot").is_empty());
    }

    #[test]
    fn test_search_rejects_invalid_pattern() {
        let (_dir, catalog) = fixture();
        catalog.list_all().expect("listing should succeed");

        let err = catalog.search("(unclosed").expect_err("pattern is invalid");
        assert!(matches!(err, FileSystemError::InvalidPattern(_)));
        assert_eq!(catalog.index().expect("index snapshot").len(), 3);
    }

    #[test]
    fn test_search_pattern_cannot_escape_anchors() {
        let (dir, catalog) = fixture();
        catalog.list_all().expect("listing should succeed");

        let root = regex::escape(&dir.path().display().to_string());
        let err = catalog
            .search(&format!("{root})|(?:nomatch"))
            .expect_err("unbalanced pattern is invalid");
        assert!(matches!(err, FileSystemError::InvalidPattern(_)));
        assert_eq!(catalog.index().expect("index snapshot").len(), 3);
    }

    #[test]
    fn test_create_directory_with_ancestors() {
        let (dir, catalog) = fixture();
        let target = dir.path().join("a/b/c");

        let index = catalog
            .create(&target.to_string_lossy())
            .expect("directory should be created");

        assert!(target.is_dir());
        assert_eq!(index.get("c"), Some(&target.display().to_string()));
    }

    #[test]
    fn test_create_file_relative_to_root() {
        let (dir, catalog) = fixture();
        catalog.create("docs/todo.txt").expect("file should be created");
        assert!(dir.path().join("docs/todo.txt").is_file());
    }

    #[test]
    fn test_create_file_requires_parent() {
        let (dir, catalog) = fixture();
        let err = catalog
            .create("missing/todo.txt")
            .expect_err("parent does not exist");

        assert!(matches!(err, FileSystemError::Io { action: "create file", .. }));
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn test_create_existing_path_fails_without_changes() {
        let (dir, catalog) = fixture();
        let before = catalog.list_all().expect("listing should succeed");

        let err = catalog.create("readme.md").expect_err("path already exists");
        assert!(matches!(err, FileSystemError::AlreadyExists(_)));
        assert_eq!(catalog.index().expect("index snapshot"), before);
        assert_eq!(
            fs::read_to_string(dir.path().join("readme.md")).expect("readme"),
            "hello\n"
        );
    }

    #[test]
    fn test_create_rejects_empty_path() {
        let (_dir, catalog) = fixture();
        assert!(matches!(catalog.create(""), Err(FileSystemError::InvalidPath)));
    }

    #[test]
    fn test_delete_renames_to_backup() {
        let (dir, catalog) = fixture();
        catalog.list_all().expect("listing should succeed");

        let index = catalog.delete("docs/notes.txt").expect("delete should succeed");

        assert!(!dir.path().join("docs/notes.txt").exists());
        assert!(dir.path().join("docs/notes.txt.bk").is_file());
        assert!(!index.contains_key("notes.txt"));
        assert!(index.contains_key("readme.md"));
    }

    #[test]
    fn test_delete_never_overwrites_backup() {
        let (dir, catalog) = fixture();
        fs::write(dir.path().join("readme.md.bk"), "old\n").expect("old backup");

        let err = catalog.delete("readme.md").expect_err("backup exists");
        assert!(matches!(err, FileSystemError::BackupExists(_)));
        assert!(dir.path().join("readme.md").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("readme.md.bk")).expect("backup"),
            "old\n"
        );
    }

    #[test]
    fn test_delete_missing_path() {
        let (_dir, catalog) = fixture();
        let err = catalog.delete("ghost.txt").expect_err("path is missing");
        assert!(matches!(err, FileSystemError::NotFound(_)));
    }

    #[test]
    fn test_reset_clears_index() {
        let (_dir, catalog) = fixture();
        catalog.list_all().expect("listing should succeed");
        catalog.reset();
        assert!(catalog.index().expect("index snapshot").is_empty());
    }
}
