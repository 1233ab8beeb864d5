//! File-backed session storage.
//!
//! Persists session keys as a small JSON object under the user's config
//! directory, implementing the storage capability the session store expects.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use jot_core::{Error, SessionStorage};

#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new())
            }
            Err(error) => return Err(Error::Storage(error.to_string())),
        };
        serde_json::from_str(&raw)
            .map_err(|error| Error::Storage(format!("corrupt session file: {error}")))
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| Error::Storage(error.to_string()))?;
        }
        let serialized = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, serialized).map_err(|error| Error::Storage(error.to_string()))
    }
}

impl SessionStorage for FileSessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.read_entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}
