//! Key-value store abstraction consumed by the registry.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::EnvError;
use crate::types::{KeySet, Reply};

/// Abstraction over the shared key-value store.
///
/// # Implementations
///
/// - **Memory**: `MemoryStore` - in-process keyspace, used by tests and
///   single-process setups
/// - **Persistent**: `SledStore` - embedded sled database
/// - **Remote**: a networked client wrapped to this interface by the host
///
/// # Pipelining
///
/// ```text
/// caller                      queue                       keyspace
///   |-- set/del/sadd/srem ------>|                            |
///   |-- get/scan -> Reply ------>|                            |
///   |-- commit() --------------->|-- execute in order ------->|
///   |<----------------- replies resolved ---------------------|
/// ```
///
/// Every command is queued and only becomes visible to other readers once
/// `commit()` completes. Replies resolve during that commit.
#[async_trait]
pub trait SceneStore: Send + Sync + 'static {
    /// Queues a write of a JSON document under `key`, replacing any value.
    ///
    /// # Returns
    /// * `Ok(())` - Command queued
    /// * `Err(EnvError::Connection)` - The client can no longer accept commands
    fn set(&self, key: &str, value: Value) -> Result<(), EnvError>;

    /// Queues a read of the document under `key`.
    ///
    /// The reply yields `None` when the key is absent.
    fn get(&self, key: &str) -> Reply<Option<Value>>;

    /// Queues deletion of `keys`. Missing keys are ignored.
    fn del(&self, keys: &[String]) -> Result<(), EnvError>;

    /// Queues adding `members` to the set under `key`.
    fn sadd(&self, key: &str, members: &[String]) -> Result<(), EnvError>;

    /// Queues removing `members` from the set under `key`.
    fn srem(&self, key: &str, members: &[String]) -> Result<(), EnvError>;

    /// Queues a read of all members of the set under `key`.
    fn smembers(&self, key: &str) -> Reply<KeySet>;

    /// Queues a scan for every key matching a glob `pattern`.
    ///
    /// The result is a snapshot taken when the commit executes this scan;
    /// keys written by later commands in the same batch are not included.
    fn scan(&self, pattern: &str) -> Reply<KeySet>;

    /// Executes all queued commands in order.
    ///
    /// # Returns
    /// * `Ok(())` - All commands executed; per-command failures are reported
    ///   through their replies
    /// * `Err(_)` - A write failed or the backend could not be flushed
    async fn commit(&self) -> Result<(), EnvError>;
}
