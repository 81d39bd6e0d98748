//! In-process store backed by a `HashMap`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::EnvError;
use crate::pattern::glob_match;
use crate::pipeline::{Keyspace, PipelinedStore};
use crate::types::{KeySet, StoredValue};

/// Volatile keyspace held in memory.
#[derive(Default)]
pub struct MemoryKeyspace {
    entries: Mutex<HashMap<String, StoredValue>>,
}

impl MemoryKeyspace {
    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, StoredValue>>, EnvError> {
        self.entries
            .lock()
            .map_err(|_| EnvError::storage("memory keyspace poisoned"))
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> Result<usize, EnvError> {
        Ok(self.entries()?.len())
    }

    /// Returns true if no keys are stored.
    pub fn is_empty(&self) -> Result<bool, EnvError> {
        Ok(self.entries()?.is_empty())
    }
}

impl Keyspace for MemoryKeyspace {
    fn read(&self, key: &str) -> Result<Option<StoredValue>, EnvError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: StoredValue) -> Result<(), EnvError> {
        self.entries()?.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), EnvError> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn keys_matching(&self, pattern: &str) -> Result<KeySet, EnvError> {
        Ok(self
            .entries()?
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect())
    }
}

/// Pipelined store over a [`MemoryKeyspace`].
pub type MemoryStore = PipelinedStore<MemoryKeyspace>;

impl MemoryStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::with_keyspace(MemoryKeyspace::default())
    }

    /// Creates an Arc-wrapped store for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
