//! redisgl Store Abstraction Layer
//!
//! This crate provides the key-value store interface the redisgl registry
//! is written against, so the same registry code runs on a remote store
//! client, an embedded sled database, or a plain in-memory map.
//!
//! # Core Concept: Pipelined Commands
//!
//! Commands are queued and executed in order by an explicit `commit()`:
//! - Writes (`set`, `del`, `sadd`, `srem`) become visible after commit
//! - Reads (`get`, `smembers`, `scan`) return a [`Reply`] that resolves
//!   during the commit that executes them
//!
//! # Example
//!
//! ```ignore
//! use redisgl_env::{MemoryStore, SceneStore};
//!
//! let store = MemoryStore::new();
//! store.set("lab::model::trajectory::path", json!({ "key_pos": "ee::pos" }))?;
//! let robots = store.scan("lab::model::robot::*");
//! store.commit().await?;
//! let robots = robots.await?;
//! ```

mod error;
mod memory;
mod pattern;
mod pipeline;
mod sled_store;
mod store;
mod types;

pub use error::EnvError;
pub use memory::{MemoryKeyspace, MemoryStore};
pub use pattern::{escape_glob, glob_match, literal_prefix};
pub use pipeline::{Keyspace, PipelinedStore};
pub use sled_store::{SledKeyspace, SledStore};
pub use store::SceneStore;
pub use types::{KeySet, Reply, StoredValue};
