//! Persistent store backed by an embedded sled database.

use std::path::Path;
use std::sync::Arc;

use crate::error::EnvError;
use crate::pattern::{glob_match, literal_prefix};
use crate::pipeline::{Keyspace, PipelinedStore};
use crate::types::{KeySet, StoredValue};

/// Keyspace persisted in a sled tree.
///
/// Values are stored as JSON-encoded [`StoredValue`]s keyed by the UTF-8
/// key string, so ordered prefix scans map onto sled's `scan_prefix`.
pub struct SledKeyspace {
    db: sled::Db,
}

impl SledKeyspace {
    /// Opens (or creates) a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EnvError> {
        let db = sled::open(path)
            .map_err(|e| EnvError::storage(format!("Failed to open sled DB: {}", e)))?;
        Ok(Self { db })
    }

    /// Opens a temporary database removed on drop.
    pub fn temporary() -> Result<Self, EnvError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| EnvError::storage(format!("Failed to open temp DB: {}", e)))?;
        Ok(Self { db })
    }
}

impl Keyspace for SledKeyspace {
    fn read(&self, key: &str) -> Result<Option<StoredValue>, EnvError> {
        let Some(bytes) = self
            .db
            .get(key.as_bytes())
            .map_err(|e| EnvError::storage(format!("Get failed: {}", e)))?
        else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn write(&self, key: &str, value: StoredValue) -> Result<(), EnvError> {
        let bytes = serde_json::to_vec(&value)?;
        self.db
            .insert(key.as_bytes(), bytes)
            .map_err(|e| EnvError::storage(format!("Insert failed: {}", e)))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), EnvError> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| EnvError::storage(format!("Remove failed: {}", e)))?;
        Ok(())
    }

    fn keys_matching(&self, pattern: &str) -> Result<KeySet, EnvError> {
        let prefix = literal_prefix(pattern);
        let mut keys = KeySet::new();
        for result in self.db.scan_prefix(prefix.as_bytes()) {
            let (key, _) = result.map_err(|e| EnvError::storage(format!("Iteration failed: {}", e)))?;
            // Keys are always written from &str
            let Ok(key) = std::str::from_utf8(&key) else {
                continue;
            };
            if glob_match(pattern, key) {
                keys.insert(key.to_string());
            }
        }
        Ok(keys)
    }

    fn flush(&self) -> Result<(), EnvError> {
        self.db
            .flush()
            .map_err(|e| EnvError::storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}

/// Pipelined store over a [`SledKeyspace`].
pub type SledStore = PipelinedStore<SledKeyspace>;

impl SledStore {
    /// Opens a persistent store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EnvError> {
        Ok(Self::with_keyspace(SledKeyspace::open(path)?))
    }

    /// Opens a temporary store (for testing).
    pub fn open_temp() -> Result<Self, EnvError> {
        Ok(Self::with_keyspace(SledKeyspace::temporary()?))
    }

    /// Opens a persistent store wrapped in an Arc.
    pub fn shared<P: AsRef<Path>>(path: P) -> Result<Arc<Self>, EnvError> {
        Self::open(path).map(Arc::new)
    }
}
