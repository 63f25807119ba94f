//! 持久化键值存储
//!
//! 整个文件是一个 JSON 对象，每个键对应一份数据。
//! 每次写入都同步落盘（先写临时文件再改名），调用返回时数据已经保存

use crate::error::{AppError, AppResult, StorageError};
use serde_json::{Map, Value as JsonValue};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取某个键；文件不存在或键不存在时返回 None
    pub fn get(&self, key: &str) -> AppResult<Option<JsonValue>> {
        let mut all = self.read_all()?;
        Ok(all.remove(key))
    }

    /// 写入某个键，其他键保持不变
    pub fn set(&self, key: &str, value: JsonValue) -> AppResult<()> {
        let mut all = self.read_all()?;
        all.insert(key.to_string(), value);
        self.write_all(&all)
    }

    fn read_all(&self) -> AppResult<Map<String, JsonValue>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(AppError::file_read_failed(self.display(), e)),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&content).map_err(|source| {
            AppError::Storage(StorageError::Corrupted {
                path: self.display(),
                source,
            })
        })
    }

    fn write_all(&self, all: &Map<String, JsonValue>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
            }
        }

        let content = serde_json::to_string_pretty(all).map_err(|source| {
            AppError::Storage(StorageError::Corrupted {
                path: self.display(),
                source,
            })
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|e| AppError::file_write_failed(self.display(), e))?;
        fs::rename(&tmp, &self.path).map_err(|e| AppError::file_write_failed(self.display(), e))?;

        debug!("已写入存储: {}", self.display());
        Ok(())
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope.json"));
        assert_eq!(store.get("savedStocks2").unwrap(), None);
    }

    #[test]
    fn test_set_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));

        store.set("a", json!(1)).unwrap();
        store.set("b", json!({"x": [1, 2]})).unwrap();

        assert_eq!(store.get("a").unwrap(), Some(json!(1)));
        assert_eq!(store.get("b").unwrap(), Some(json!({"x": [1, 2]})));
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.get("a"),
            Err(AppError::Storage(StorageError::Corrupted { .. }))
        ));
    }
}
