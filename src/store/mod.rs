//! Flat-file persistence primitives.
//!
//! Two layouts cover every memory store: `JsonlStore` for append-only
//! line-delimited logs (dialogue, emotions, journal) and `JsonFile` for
//! whole-file documents (short-term snapshot, long-term archive, interest
//! profile, RAG cache). Reads are tolerant: a missing file is an empty
//! store, and a malformed line is skipped without aborting the scan.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Append-only line-delimited JSON log.
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single JSON line, creating the file and its
    /// parent directory on first write.
    pub fn append<T: Serialize>(&self, record: &T) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", parent.display()))?;
        }
        let line = serde_json::to_string(record)
            .map_err(|e| anyhow::anyhow!("failed to serialize record: {e}"))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| anyhow::anyhow!("failed to open {}: {e}", self.path.display()))?;
        writeln!(file, "{line}")
            .map_err(|e| anyhow::anyhow!("failed to append to {}: {e}", self.path.display()))?;
        Ok(())
    }

    /// Read every parseable record in log order. A missing file yields an
    /// empty list; unreadable files are logged and yield an empty list;
    /// malformed lines are skipped individually.
    pub fn read_all<T: DeserializeOwned>(&self) -> Vec<T> {
        if !self.path.exists() {
            return Vec::new();
        }
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("failed to read {}: {e}", self.path.display());
                return Vec::new();
            }
        };
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<T>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!("skipping malformed record in {}: {e}", self.path.display());
                    None
                }
            })
            .collect()
    }
}

/// Whole-file JSON document, loaded with a fallback and rewritten in place.
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the document, or None when the file is missing or unparseable.
    pub fn load<T: DeserializeOwned>(&self) -> Option<T> {
        if !self.path.exists() {
            return None;
        }
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("failed to read {}: {e}", self.path.display());
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("failed to parse {}: {e}", self.path.display());
                None
            }
        }
    }

    /// Load the document, substituting `fallback` when missing or invalid.
    pub fn load_or<T: DeserializeOwned>(&self, fallback: T) -> T {
        self.load().unwrap_or(fallback)
    }

    /// Overwrite the document, creating the parent directory if needed.
    pub fn save<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(value)
            .map_err(|e| anyhow::anyhow!("failed to serialize {}: {e}", self.path.display()))?;
        std::fs::write(&self.path, content)
            .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        value: u32,
    }

    fn tmp_dir() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock before epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("reverie-store-test-{nanos}"));
        std::fs::create_dir_all(&path).expect("create temp dir");
        path
    }

    #[test]
    fn jsonl_append_and_read_roundtrip() {
        let dir = tmp_dir();
        let store = JsonlStore::new(dir.join("log.jsonl"));
        store.append(&Record { name: "a".into(), value: 1 }).unwrap();
        store.append(&Record { name: "b".into(), value: 2 }).unwrap();

        let records: Vec<Record> = store.read_all();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "a");
        assert_eq!(records[1].value, 2);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn jsonl_missing_file_reads_empty() {
        let dir = tmp_dir();
        let store = JsonlStore::new(dir.join("absent.jsonl"));
        let records: Vec<Record> = store.read_all();
        assert!(records.is_empty());
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn jsonl_malformed_line_is_skipped() {
        let dir = tmp_dir();
        let path = dir.join("log.jsonl");
        std::fs::write(
            &path,
            "{\"name\":\"ok\",\"value\":1}\nnot json at all\n{\"name\":\"also ok\",\"value\":2}\n",
        )
        .unwrap();

        let store = JsonlStore::new(&path);
        let records: Vec<Record> = store.read_all();
        assert_eq!(records.len(), 2);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn json_file_load_or_falls_back() {
        let dir = tmp_dir();
        let file = JsonFile::new(dir.join("doc.json"));
        let loaded: Vec<Record> = file.load_or(Vec::new());
        assert!(loaded.is_empty());

        file.save(&vec![Record { name: "x".into(), value: 9 }]).unwrap();
        let loaded: Vec<Record> = file.load_or(Vec::new());
        assert_eq!(loaded.len(), 1);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn json_file_overwrites_wholesale() {
        let dir = tmp_dir();
        let file = JsonFile::new(dir.join("doc.json"));
        file.save(&vec![1u32, 2, 3]).unwrap();
        file.save(&vec![4u32]).unwrap();
        let loaded: Vec<u32> = file.load_or(Vec::new());
        assert_eq!(loaded, vec![4]);
        std::fs::remove_dir_all(dir).ok();
    }
}
