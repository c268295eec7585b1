//! File-backed key-value store: one file per key under a directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

use super::traits::KeyValueStore;

/// Durable store rooted at a directory.
///
/// Keys are percent-encoded into file names so any tour id is safe.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_path`, creating the directory.
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", encode_key(key)))
    }
}

/// Keep `[A-Za-z0-9_.-]`, escape everything else as `%XX`.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // Readers only ever see a complete record.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Write {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_unsafe_characters() {
        assert_eq!(encode_key("onboarding_tour_abc"), "onboarding_tour_abc");
        assert_eq!(encode_key("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn crud_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("state")).unwrap();

        assert!(store.get("onboarding_tour_x").unwrap().is_none());
        store.set("onboarding_tour_x", "{\"a\":1}").unwrap();
        assert_eq!(
            store.get("onboarding_tour_x").unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        // A second handle on the same directory sees the data.
        let reopened = FileStore::open(store.base_path()).unwrap();
        assert!(reopened.get("onboarding_tour_x").unwrap().is_some());

        assert!(store.remove("onboarding_tour_x").unwrap());
        assert!(!store.remove("onboarding_tour_x").unwrap());
    }

    #[test]
    fn keys_with_slashes_stay_inside_base() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set("../escape", "x").unwrap();
        assert_eq!(store.get("../escape").unwrap().as_deref(), Some("x"));
        assert!(!dir.path().parent().unwrap().join("escape.json").exists());
    }
}
