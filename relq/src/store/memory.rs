use super::ListStore;
use anyhow::Result;
use bytes::Bytes;
use log::trace;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

/// In-process list store with the semantics of the Redis list commands. Clones share the same
/// lists, so a producer and a consumer holding different clones see each other's pushes.
///
/// Empty lists are removed like Redis removes empty keys.
#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    lists: Mutex<HashMap<String, VecDeque<Bytes>>>,
    /// Woken on every push, blocking moves are waiting on this.
    pushed: Notify,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn move_tail_to_head(&self, source: &str, destination: &str) -> Option<Bytes> {
        let mut lists = self.shared.lists.lock().await;

        let value = lists.get_mut(source)?.pop_back()?;

        remove_if_empty(&mut lists, source);
        lists
            .entry(destination.to_string())
            .or_default()
            .push_front(value.clone());

        Some(value)
    }
}

fn remove_if_empty(lists: &mut HashMap<String, VecDeque<Bytes>>, key: &str) {
    if lists.get(key).map_or(false, |l| l.is_empty()) {
        lists.remove(key);
    }
}

/// Convert Redis style inclusive, possibly negative, indices into a range of the list.
fn normalize_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if start > stop || start >= len {
        return None;
    }

    Some((start as usize, stop as usize))
}

impl ListStore for MemoryStore {
    async fn lpush(&self, key: &str, value: Bytes) -> Result<u64> {
        let len = {
            let mut lists = self.shared.lists.lock().await;
            let list = lists.entry(key.to_string()).or_default();

            list.push_front(value);
            list.len() as u64
        };

        self.shared.pushed.notify_waiters();

        Ok(len)
    }

    async fn rpush(&self, key: &str, value: Bytes) -> Result<u64> {
        let len = {
            let mut lists = self.shared.lists.lock().await;
            let list = lists.entry(key.to_string()).or_default();

            list.push_back(value);
            list.len() as u64
        };

        self.shared.pushed.notify_waiters();

        Ok(len)
    }

    async fn lpop(&self, key: &str) -> Result<Option<Bytes>> {
        let mut lists = self.shared.lists.lock().await;

        let value = lists.get_mut(key).and_then(|l| l.pop_front());
        remove_if_empty(&mut lists, key);

        Ok(value)
    }

    async fn rpoplpush(&self, source: &str, destination: &str) -> Result<Option<Bytes>> {
        let value = self.move_tail_to_head(source, destination).await;

        if value.is_some() {
            self.shared.pushed.notify_waiters();
        }

        Ok(value)
    }

    async fn brpoplpush(&self, source: &str, destination: &str, timeout: Duration) -> Result<Option<Bytes>> {
        // a deadline beyond what an instant can hold is the same as no deadline
        let deadline = if timeout.is_zero() {
            None
        } else {
            Instant::now().checked_add(timeout)
        };

        loop {
            // A notified future receives `notify_waiters` calls from the moment it is created, so
            // a push between the check and the wait is not lost.
            let pushed = self.shared.pushed.notified();

            if let Some(value) = self.rpoplpush(source, destination).await? {
                return Ok(Some(value));
            }

            trace!("Waiting for elements on {}", source);

            match deadline {
                None => pushed.await,
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, pushed).await.is_err() {
                        return Ok(None);
                    }
                }
            }
        }
    }

    async fn lrem(&self, key: &str, count: i64, value: &[u8]) -> Result<u64> {
        let mut lists = self.shared.lists.lock().await;

        let list = match lists.get_mut(key) {
            Some(list) => list,
            None => return Ok(0),
        };

        let limit = if count == 0 { usize::MAX } else { count.unsigned_abs() as usize };
        let mut removed = 0usize;

        if count >= 0 {
            let mut i = 0;

            while i < list.len() && removed < limit {
                if list[i] == value {
                    list.remove(i);
                    removed += 1;
                } else {
                    i += 1;
                }
            }
        } else {
            let mut i = list.len();

            while i > 0 && removed < limit {
                i -= 1;

                if list[i] == value {
                    list.remove(i);
                    removed += 1;
                }
            }
        }

        remove_if_empty(&mut lists, key);

        Ok(removed as u64)
    }

    async fn llen(&self, key: &str) -> Result<u64> {
        let lists = self.shared.lists.lock().await;

        Ok(lists.get(key).map_or(0, |l| l.len() as u64))
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>> {
        let lists = self.shared.lists.lock().await;

        let list = match lists.get(key) {
            Some(list) => list,
            None => return Ok(vec![]),
        };

        Ok(match normalize_range(list.len(), start, stop) {
            Some((from, to)) => list.range(from..=to).cloned().collect(),
            None => vec![],
        })
    }

    async fn del(&self, key: &str) -> Result<u64> {
        let mut lists = self.shared.lists.lock().await;

        Ok(lists.remove(key).map_or(0, |_| 1))
    }
}
