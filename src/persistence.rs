//! Device-local key-value persistence.
//!
//! Values are JSON documents addressed by fixed string keys. Writes are
//! synchronous: once `put` returns, the next `get` of that key sees the value.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::model::{Client, Document, Tour};

pub const CLIENTS_KEY: &str = "haircrm_clients";
pub const TOURS_KEY: &str = "haircrm_tours";
pub const BACKGROUND_IMAGE_KEY: &str = "haircrm_bg_image";
pub const HOME_IMAGE_KEY: &str = "haircrm_home_img";
pub const SETTINGS_KEY: &str = "haircrm_settings";

pub trait LocalStore {
    /// Returns `None` if the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn put(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

pub fn get_json<S: LocalStore + ?Sized, T: DeserializeOwned>(store: &S, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => {
            let value = serde_json::from_str(&raw)
                .with_context(|| format!("[STORE] corrupt value under {}", key))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub fn put_json<S: LocalStore + ?Sized, T: Serialize>(store: &mut S, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.put(key, &raw)
}

/// Reads roster and tour list. Missing keys load as empty collections.
pub fn load_document<S: LocalStore + ?Sized>(store: &S) -> Result<Document> {
    let clients: Vec<Client> = get_json(store, CLIENTS_KEY)?.unwrap_or_default();
    let tours: Vec<Tour> = get_json(store, TOURS_KEY)?.unwrap_or_default();
    log::debug!(
        "[STORE] loaded {} clients, {} tours",
        clients.len(),
        tours.len()
    );
    Ok(Document { clients, tours })
}

pub fn save_document<S: LocalStore + ?Sized>(store: &mut S, doc: &Document) -> Result<()> {
    put_json(store, CLIENTS_KEY, &doc.clients)?;
    put_json(store, TOURS_KEY, &doc.tours)?;
    log::trace!(
        "[STORE] saved {} clients, {} tours",
        doc.clients.len(),
        doc.tours.len()
    );
    Ok(())
}

/// Removes every key this crate writes.
pub fn wipe<S: LocalStore + ?Sized>(store: &mut S) -> Result<()> {
    for key in [
        CLIENTS_KEY,
        TOURS_KEY,
        BACKGROUND_IMAGE_KEY,
        HOME_IMAGE_KEY,
        SETTINGS_KEY,
    ] {
        store.remove(key)?;
    }
    log::info!("[STORE] local data wiped");
    Ok(())
}

// =====================================================================
// File store
// =====================================================================

/// One `<key>.json` file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens or creates the data directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("[STORE] cannot create {}", dir.display()))?;
        log::info!("[STORE] data directory {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("[STORE] read {}", path.display())),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        // Write-then-rename so a crash never leaves a half-written value.
        let mut file = fs::File::create(&tmp)
            .with_context(|| format!("[STORE] create {}", tmp.display()))?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("[STORE] replace {}", path.display()))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("[STORE] remove {}", path.display())),
        }
    }
}

// =====================================================================
// Memory store
// =====================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    /// Key of every `put`, in arrival order.
    pub writes: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.writes.push(key.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

impl<S: LocalStore + ?Sized> LocalStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClientDraft, Coordinate, OpeningBalance};

    fn sample_document() -> Document {
        let mut doc = Document::default();
        doc.add_client(
            ClientDraft {
                company_name: "Salone Aurora".to_string(),
                coords: Coordinate::new(45.070312, 7.686856),
                ..ClientDraft::default()
            },
            Some(OpeningBalance::debit(250.5)),
        )
        .unwrap();
        doc.add_client(
            ClientDraft {
                company_name: "Barberia Duomo".to_string(),
                coords: Coordinate::new(45.464211, 9.191383),
                ..ClientDraft::default()
            },
            None,
        )
        .unwrap();
        doc
    }

    #[test]
    fn missing_keys_load_empty() {
        let store = MemoryStore::new();
        let doc = load_document(&store).unwrap();
        assert!(doc.is_empty());
        assert_eq!(store.get(HOME_IMAGE_KEY).unwrap(), None);
    }

    #[test]
    fn file_store_reload_reproduces_roster() {
        let dir = tempfile::tempdir().unwrap();
        let doc = sample_document();

        {
            let mut store = FileStore::open(dir.path()).unwrap();
            save_document(&mut store, &doc).unwrap();
        }

        let store = FileStore::open(dir.path()).unwrap();
        let reloaded = load_document(&store).unwrap();
        assert_eq!(reloaded, doc);
    }

    #[test]
    fn file_store_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();

        store.put(HOME_IMAGE_KEY, "\"https://example.com/a.png\"").unwrap();
        store.remove(HOME_IMAGE_KEY).unwrap();
        store.remove(HOME_IMAGE_KEY).unwrap();
        assert_eq!(store.get(HOME_IMAGE_KEY).unwrap(), None);
    }

    #[test]
    fn corrupt_value_is_an_error() {
        let mut store = MemoryStore::new();
        store.put(CLIENTS_KEY, "{not json").unwrap();
        assert!(load_document(&store).is_err());
    }

    #[test]
    fn wipe_clears_everything() {
        let mut store = MemoryStore::new();
        save_document(&mut store, &sample_document()).unwrap();
        wipe(&mut store).unwrap();
        assert!(load_document(&store).unwrap().is_empty());
    }
}
