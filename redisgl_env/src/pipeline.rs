//! Command queue shared by the in-process store implementations.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::EnvError;
use crate::store::SceneStore;
use crate::types::{KeySet, Reply, ReplySender, StoredValue};

/// Synchronous keyspace a [`PipelinedStore`] executes commands against.
pub trait Keyspace: Send + Sync + 'static {
    /// Reads the value under `key`.
    fn read(&self, key: &str) -> Result<Option<StoredValue>, EnvError>;

    /// Replaces the value under `key`.
    fn write(&self, key: &str, value: StoredValue) -> Result<(), EnvError>;

    /// Removes `key`. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), EnvError>;

    /// Returns every key matching the glob `pattern`.
    fn keys_matching(&self, pattern: &str) -> Result<KeySet, EnvError>;

    /// Makes executed commands durable. No-op for volatile keyspaces.
    fn flush(&self) -> Result<(), EnvError> {
        Ok(())
    }
}

/// A queued store command.
enum Command {
    Set { key: String, value: Value },
    Get { key: String, reply: ReplySender<Option<Value>> },
    Del { keys: Vec<String> },
    SAdd { key: String, members: Vec<String> },
    SRem { key: String, members: Vec<String> },
    SMembers { key: String, reply: ReplySender<KeySet> },
    Scan { pattern: String, reply: ReplySender<KeySet> },
}

/// A [`SceneStore`] that queues commands and runs them against a
/// [`Keyspace`] on `commit()`.
pub struct PipelinedStore<K: Keyspace> {
    keyspace: K,

    /// Commands waiting for the next commit, in issue order
    queue: Mutex<Vec<Command>>,

    /// Held for a whole batch so concurrent commits never interleave
    execution: Mutex<()>,

    /// Set once the client is shut down; every later command fails
    closed: AtomicBool,
}

impl<K: Keyspace> PipelinedStore<K> {
    /// Wraps a keyspace in a command queue.
    pub fn with_keyspace(keyspace: K) -> Self {
        Self {
            keyspace,
            queue: Mutex::new(Vec::new()),
            execution: Mutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the underlying keyspace.
    pub fn keyspace(&self) -> &K {
        &self.keyspace
    }

    /// Number of commands waiting for a commit.
    pub fn pending(&self) -> Result<usize, EnvError> {
        self.queue
            .lock()
            .map(|queue| queue.len())
            .map_err(|_| EnvError::Connection("command queue poisoned".to_string()))
    }

    /// Shuts the client down.
    ///
    /// Queued commands are discarded (their replies resolve with
    /// `ReplyDropped`) and every subsequent command fails with
    /// `EnvError::Connection`.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Ok(mut queue) = self.queue.lock() {
            queue.clear();
        }
    }

    fn queue(&self) -> Result<MutexGuard<'_, Vec<Command>>, EnvError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EnvError::Connection("client shut down".to_string()));
        }
        self.queue
            .lock()
            .map_err(|_| EnvError::Connection("command queue poisoned".to_string()))
    }

    fn push(&self, command: Command) -> Result<(), EnvError> {
        self.queue()?.push(command);
        Ok(())
    }

    fn push_read<T>(&self, make: impl FnOnce(ReplySender<T>) -> Command) -> Reply<T> {
        let (tx, reply) = Reply::channel();
        match self.queue() {
            Ok(mut queue) => {
                queue.push(make(tx));
                reply
            }
            Err(e) => Reply::ready(Err(e)),
        }
    }

    fn read_set(&self, key: &str) -> Result<Option<KeySet>, EnvError> {
        match self.keyspace.read(key)? {
            None => Ok(None),
            Some(StoredValue::Set(members)) => Ok(Some(members)),
            Some(StoredValue::Document(_)) => Err(EnvError::wrong_type(key, "set")),
        }
    }

    /// Takes the queued batch and executes it as one unit.
    ///
    /// The execution lock is taken before the queue is drained and held
    /// until the keyspace is flushed, so batches run one at a time in the
    /// order their commits drained the queue. Each command, including the
    /// read-modify-write of `sadd`/`srem`, is atomic with respect to other
    /// commits on the same store.
    fn run_batch(&self) -> Result<(), EnvError> {
        let _execution = self
            .execution
            .lock()
            .map_err(|_| EnvError::Connection("command execution poisoned".to_string()))?;
        let commands = std::mem::take(&mut *self.queue()?);
        let num_commands = commands.len();

        let mut first_error = None;
        for command in commands {
            if let Err(e) = self.execute(command) {
                warn!("Store command failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        self.keyspace.flush()?;
        debug!("Committed {} commands", num_commands);

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Runs one command. Errors from read commands travel through their
    /// replies; errors from writes are returned.
    fn execute(&self, command: Command) -> Result<(), EnvError> {
        match command {
            Command::Set { key, value } => self.keyspace.write(&key, StoredValue::Document(value)),
            Command::Get { key, reply } => {
                let result = match self.keyspace.read(&key) {
                    Ok(None) => Ok(None),
                    Ok(Some(StoredValue::Document(value))) => Ok(Some(value)),
                    Ok(Some(StoredValue::Set(_))) => Err(EnvError::wrong_type(&key, "document")),
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
                Ok(())
            }
            Command::Del { keys } => keys.iter().try_for_each(|key| self.keyspace.remove(key)),
            Command::SAdd { key, members } => {
                let mut set = self.read_set(&key)?.unwrap_or_default();
                set.extend(members);
                self.keyspace.write(&key, StoredValue::Set(set))
            }
            Command::SRem { key, members } => {
                let Some(mut set) = self.read_set(&key)? else {
                    return Ok(());
                };
                for member in &members {
                    set.remove(member);
                }
                if set.is_empty() {
                    self.keyspace.remove(&key)
                } else {
                    self.keyspace.write(&key, StoredValue::Set(set))
                }
            }
            Command::SMembers { key, reply } => {
                let result = self.read_set(&key).map(Option::unwrap_or_default);
                let _ = reply.send(result);
                Ok(())
            }
            Command::Scan { pattern, reply } => {
                let _ = reply.send(self.keyspace.keys_matching(&pattern));
                Ok(())
            }
        }
    }
}

#[async_trait]
impl<K: Keyspace> SceneStore for PipelinedStore<K> {
    fn set(&self, key: &str, value: Value) -> Result<(), EnvError> {
        self.push(Command::Set {
            key: key.to_string(),
            value,
        })
    }

    fn get(&self, key: &str) -> Reply<Option<Value>> {
        self.push_read(|reply| Command::Get {
            key: key.to_string(),
            reply,
        })
    }

    fn del(&self, keys: &[String]) -> Result<(), EnvError> {
        self.push(Command::Del {
            keys: keys.to_vec(),
        })
    }

    fn sadd(&self, key: &str, members: &[String]) -> Result<(), EnvError> {
        self.push(Command::SAdd {
            key: key.to_string(),
            members: members.to_vec(),
        })
    }

    fn srem(&self, key: &str, members: &[String]) -> Result<(), EnvError> {
        self.push(Command::SRem {
            key: key.to_string(),
            members: members.to_vec(),
        })
    }

    fn smembers(&self, key: &str) -> Reply<KeySet> {
        self.push_read(|reply| Command::SMembers {
            key: key.to_string(),
            reply,
        })
    }

    fn scan(&self, pattern: &str) -> Reply<KeySet> {
        self.push_read(|reply| Command::Scan {
            pattern: pattern.to_string(),
            reply,
        })
    }

    async fn commit(&self) -> Result<(), EnvError> {
        self.run_batch()
    }
}
