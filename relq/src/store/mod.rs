//! The list store the queue lives in. The queue only needs a handful of list primitives, they are
//! collected in the [`ListStore`] trait. [`RedisStore`] talks to a Redis compatible server,
//! [`MemoryStore`] keeps the lists in the process.
pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use anyhow::Result;
use bytes::Bytes;
use std::future::Future;
use std::time::Duration;

/// List primitives of a Redis-like store. Handles are cheap to clone, clones share the underlying
/// connection or lists.
///
/// A handle serves one request at a time. A blocking move keeps the handle busy until it returns,
/// so a producer working in parallel with a blocking consumer needs its own handle.
pub trait ListStore: Clone + Send + Sync + 'static {
    /// Push `value` to the head of the list, returns the length of the list after the push.
    fn lpush(&self, key: &str, value: Bytes) -> impl Future<Output = Result<u64>> + Send;

    /// Push `value` to the tail of the list, returns the length of the list after the push.
    fn rpush(&self, key: &str, value: Bytes) -> impl Future<Output = Result<u64>> + Send;

    /// Remove and return the head of the list.
    fn lpop(&self, key: &str) -> impl Future<Output = Result<Option<Bytes>>> + Send;

    /// Atomically move the tail of `source` to the head of `destination`.
    fn rpoplpush(&self, source: &str, destination: &str) -> impl Future<Output = Result<Option<Bytes>>> + Send;

    /// Like `rpoplpush` but waits for an element up to `timeout`. Zero timeout waits forever. An
    /// elapsed timeout is not an error, it gives `None`.
    fn brpoplpush(
        &self,
        source: &str,
        destination: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<Bytes>>> + Send;

    /// Remove `count` occurrences of `value`: from the head if `count` is positive, from the tail
    /// if it is negative, all of them if it is zero. Returns the number of removed elements.
    fn lrem(&self, key: &str, count: i64, value: &[u8]) -> impl Future<Output = Result<u64>> + Send;

    fn llen(&self, key: &str) -> impl Future<Output = Result<u64>> + Send;

    /// Elements between `start` and `stop` inclusive, negative indices count from the tail.
    fn lrange(&self, key: &str, start: i64, stop: i64) -> impl Future<Output = Result<Vec<Bytes>>> + Send;

    /// Delete the list, returns the number of deleted keys.
    fn del(&self, key: &str) -> impl Future<Output = Result<u64>> + Send;
}
