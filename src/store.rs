//! Table stores - narrow read interface over the raw bytes of uploaded
//! tabular files. The indexer and the execution engine both consume this;
//! neither owns upload handling or file lifecycle.

use crate::error::{ChatError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

/// Read access to a set of tabular files keyed by file name.
pub trait TableStore: Send + Sync {
    /// File names in a deterministic order.
    fn list(&self) -> Result<Vec<String>>;

    /// Raw byte content for one file.
    fn read(&self, source_file: &str) -> Result<Vec<u8>>;
}

/// In-memory store keyed by file name.
#[derive(Default)]
pub struct MemoryTableStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, source_file: impl Into<String>, bytes: Vec<u8>) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(source_file.into(), bytes);
    }
}

impl TableStore for MemoryTableStore {
    fn list(&self) -> Result<Vec<String>> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = files.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn read(&self, source_file: &str) -> Result<Vec<u8>> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files
            .get(source_file)
            .cloned()
            .ok_or_else(|| ChatError::MissingTable(source_file.to_string()))
    }
}

/// Store backed by a data directory; only tabular extensions are listed.
pub struct DirTableStore {
    root: PathBuf,
}

impl DirTableStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TableStore for DirTableStore {
    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let lower = name.to_lowercase();
            if lower.ends_with(".csv") || lower.ends_with(".xlsx") || lower.ends_with(".xls") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, source_file: &str) -> Result<Vec<u8>> {
        let path = self.root.join(source_file);
        if !path.is_file() {
            return Err(ChatError::MissingTable(source_file.to_string()));
        }
        Ok(std::fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryTableStore::new();
        store.insert("b.csv", b"x\n1\n".to_vec());
        store.insert("a.csv", b"y\n2\n".to_vec());

        assert_eq!(store.list().unwrap(), vec!["a.csv", "b.csv"]);
        assert_eq!(store.read("b.csv").unwrap(), b"x\n1\n".to_vec());
        assert!(matches!(
            store.read("missing.csv"),
            Err(ChatError::MissingTable(_))
        ));
    }

    #[test]
    fn dir_store_lists_only_tabular_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["sales.csv", "notes.txt", "report.xlsx"] {
            let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
            f.write_all(b"data").unwrap();
        }

        let store = DirTableStore::new(dir.path());
        assert_eq!(store.list().unwrap(), vec!["report.xlsx", "sales.csv"]);
        assert_eq!(store.read("sales.csv").unwrap(), b"data".to_vec());
    }
}
