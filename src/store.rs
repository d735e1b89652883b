//! Keyed snapshot store.
//!
//! A `BTreeMap<String, T>` behind a mutex, optionally mirrored to one JSON file. Every
//! write rewrites the whole snapshot through a temp file and a rename, so a crash leaves
//! either the old or the new file, never a torn one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

pub struct JsonStore<T> {
    inner: Mutex<BTreeMap<String, T>>,
    path: Option<PathBuf>,
}

impl<T> std::fmt::Debug for JsonStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStore").field("path", &self.path).finish()
    }
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Process-local store with no backing file.
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
            path: None,
        }
    }

    /// Load the snapshot at `path`, or start empty if it doesn't exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let map = match std::fs::read_to_string(&path) {
            Ok(s) if s.trim().is_empty() => BTreeMap::new(),
            Ok(s) => serde_json::from_str(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(io_err(&path, e)),
        };
        tracing::debug!(target: "store", path = %path.display(), entries = map.len(), "store opened");
        Ok(Self {
            inner: Mutex::new(map),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.lock().get(id).cloned()
    }

    /// All values in key order.
    pub fn values(&self) -> Vec<T> {
        self.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn insert(&self, id: impl Into<String>, value: T) -> Result<(), StoreError> {
        let id = id.into();
        self.write(move |map| {
            map.insert(id, value);
        })
    }

    /// Run `f` on the map under the lock, then flush. Checks and updates inside `f` are
    /// atomic with respect to every other reader and writer of this store.
    ///
    /// File-backed stores apply `f` to a copy and swap it in only once the snapshot is on
    /// disk. A failed flush leaves the store exactly as it was.
    pub fn write<R>(&self, f: impl FnOnce(&mut BTreeMap<String, T>) -> R) -> Result<R, StoreError> {
        let mut map = self.lock();
        if self.path.is_none() {
            return Ok(f(&mut map));
        }
        let mut next = map.clone();
        let out = f(&mut next);
        self.flush(&next)?;
        *map = next;
        Ok(out)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, T>> {
        self.inner.lock().expect("store mutex poisoned")
    }

    fn flush(&self, map: &BTreeMap<String, T>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }
        let bytes = serde_json::to_vec_pretty(map)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
        tracing::debug!(target: "store", path = %path.display(), entries = map.len(), "store flushed");
        Ok(())
    }
}

fn io_err(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}
