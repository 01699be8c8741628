//! Named index registry with bulk save/load
//!
//! `BatchIndexManager` maps unique names to index handles and moves the
//! whole registry to and from a directory in one call: `save_all` writes
//! one file per entry, `load_all` replaces the entire mapping with what
//! the directory contains. Load is a full replace, never a merge.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use quay_core::{Error, IoFlags, Result};
use quay_engine::IndexHandle;
use tracing::{debug, info};

use crate::io::{self, INDEX_EXT};

/// Registry of named index handles
#[derive(Debug, Default)]
pub struct BatchIndexManager {
    indexes: BTreeMap<String, IndexHandle>,
}

impl BatchIndexManager {
    /// Create an empty registry
    pub fn new() -> Self {
        BatchIndexManager::default()
    }

    /// Register a handle under a unique name.
    ///
    /// Rejects a name that is already in use.
    pub fn register(&mut self, name: impl Into<String>, handle: IndexHandle) -> Result<()> {
        let name = name.into();
        if self.indexes.contains_key(&name) {
            return Err(Error::DuplicateIndex(name));
        }
        debug!(target: "quay::manager", name = %name, "index registered");
        self.indexes.insert(name, handle);
        Ok(())
    }

    /// Borrow the handle registered under `name`
    pub fn get(&self, name: &str) -> Option<&IndexHandle> {
        self.indexes.get(name)
    }

    /// Mutably borrow the handle registered under `name`
    pub fn get_mut(&mut self, name: &str) -> Option<&mut IndexHandle> {
        self.indexes.get_mut(name)
    }

    /// Remove and return the handle registered under `name`
    pub fn remove(&mut self, name: &str) -> Option<IndexHandle> {
        self.indexes.remove(name)
    }

    /// Registered names, ascending
    pub fn names(&self) -> Vec<&str> {
        self.indexes.keys().map(String::as_str).collect()
    }

    /// Number of registered indexes
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Drop every registered handle
    pub fn clear(&mut self) {
        self.indexes.clear();
    }

    /// Write every registry entry to `<base>/<name>.idx`.
    ///
    /// Returns the number of files written. The base directory is created
    /// as needed.
    pub fn save_all(&self, base: impl AsRef<Path>) -> Result<usize> {
        let base = base.as_ref();
        fs::create_dir_all(base)?;

        for (name, handle) in &self.indexes {
            let path = base.join(format!("{}.{}", name, INDEX_EXT));
            io::write_index(handle, &path)?;
        }

        info!(
            target: "quay::manager",
            base = %base.display(),
            count = self.indexes.len(),
            "registry saved"
        );
        Ok(self.indexes.len())
    }

    /// Replace the registry with every index file found under `base`.
    ///
    /// The registry is cleared first; entries are keyed by file stem.
    /// Returns the number of indexes loaded.
    pub fn load_all(&mut self, base: impl AsRef<Path>, flags: IoFlags) -> Result<usize> {
        let base = base.as_ref();
        self.indexes.clear();

        for entry in fs::read_dir(base)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(INDEX_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let handle = io::read_index(&path, flags)?;
            self.indexes.insert(stem.to_string(), handle);
        }

        info!(
            target: "quay::manager",
            base = %base.display(),
            count = self.indexes.len(),
            "registry loaded"
        );
        Ok(self.indexes.len())
    }
}
