//! Common types for the store abstraction.

use crate::error::EnvError;
use serde_json::Value;
use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// A set of keys or set members returned by the store.
pub type KeySet = BTreeSet<String>;

pub(crate) type ReplySender<T> = oneshot::Sender<Result<T, EnvError>>;

/// Pending result of a queued read command.
///
/// The reply resolves once a `commit()` executes the command that produced
/// it. Awaiting a reply before committing therefore waits forever in a
/// pipelined store, so callers commit first and await afterwards.
///
/// Dropping a `Reply` discards the result; the queued command still runs.
#[derive(Debug)]
#[must_use = "a reply does nothing unless awaited after commit"]
pub struct Reply<T> {
    rx: oneshot::Receiver<Result<T, EnvError>>,
}

impl<T> Reply<T> {
    /// Creates a linked sender/reply pair.
    pub(crate) fn channel() -> (ReplySender<T>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Creates a reply that is already resolved.
    pub fn ready(result: Result<T, EnvError>) -> Self {
        let (tx, reply) = Self::channel();
        let _ = tx.send(result);
        reply
    }
}

impl<T> Future for Reply<T> {
    type Output = Result<T, EnvError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(EnvError::ReplyDropped)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// A value held under one key of the store.
///
/// Plain keys hold JSON documents; set keys hold string members. Both share
/// one keyspace, so a pattern scan returns keys of either kind.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StoredValue {
    Document(Value),
    Set(KeySet),
}
