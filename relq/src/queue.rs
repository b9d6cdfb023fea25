use crate::config::QueueConfig;
use crate::error::serialization_error;
use crate::store::{ListStore, RedisStore};
use anyhow::Result;
use bytes::Bytes;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::sync::OnceLock;
use std::time::Duration;

/// Appended to the name of the waiting list to get the name of the processing list.
pub const PROCESSING_SUFFIX: &str = "_processing";

/// Queue which doesn't lose items popped by a consumer that crashed.
///
/// Items wait in the waiting list. A pop atomically moves an item into the processing list, and
/// it stays there until the consumer commits it. Items left in the processing list by dead
/// consumers can be put back to the waiting list with [`ReliableQueue::refill`].
///
/// Items are stored as JSON. Two queues with the same name work on the same lists, the only
/// local state is the payload of the last pop which `commit` removes.
pub struct ReliableQueue<T, S = RedisStore> {
    store: S,
    waiting: OnceLock<String>,
    timeout: Duration,
    /// Raw payload of the last pop, exactly as the store gave it.
    last_payload: Option<Bytes>,
    _item: PhantomData<fn() -> T>,
}

impl<T, S> fmt::Debug for ReliableQueue<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReliableQueue")
            .field("waiting", &self.waiting.get())
            .field("timeout", &self.timeout)
            .field("in_hand", &self.last_payload.is_some())
            .finish()
    }
}

impl<T> ReliableQueue<T, RedisStore>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a queue on a fresh connection to the default local Redis.
    pub async fn connect(config: QueueConfig) -> Result<Self> {
        let store = RedisStore::connect_default().await?;

        Ok(Self::new(store, config))
    }
}

impl<T, S> ReliableQueue<T, S>
where
    T: Serialize + DeserializeOwned,
    S: ListStore,
{
    pub fn new(store: S, config: QueueConfig) -> Self {
        let waiting = OnceLock::new();

        if let Some(name) = config.queue_name {
            let _ = waiting.set(name);
        }

        ReliableQueue {
            store,
            waiting,
            timeout: config.timeout,
            last_payload: None,
            _item: PhantomData,
        }
    }

    /// Name of the waiting list. An unnamed queue gets a random uuid at the first call, and keeps
    /// it for its lifetime.
    pub fn waiting(&self) -> &str {
        self.waiting.get_or_init(|| uuid::Uuid::new_v4().as_hyphenated().to_string())
    }

    /// Name of the processing list, always derived from the waiting one.
    pub fn processing(&self) -> String {
        format!("{}{}", self.waiting(), PROCESSING_SUFFIX)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Change the timeout of the blocking pops, it is kept for all the later calls.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Number of items in the waiting list, the ones in processing are not counted.
    pub async fn length(&self) -> Result<u64> {
        self.store.llen(self.waiting()).await
    }

    pub async fn size(&self) -> Result<u64> {
        self.length().await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.length().await? == 0)
    }

    /// Number of items popped but not yet committed.
    pub async fn processing_length(&self) -> Result<u64> {
        self.store.llen(&self.processing()).await
    }

    /// Serialized items of the waiting list from head to tail. The tail is popped first.
    pub async fn waiting_items(&self) -> Result<Vec<Bytes>> {
        self.store.lrange(self.waiting(), 0, -1).await
    }

    /// Serialized items of the processing list, the most recently popped first.
    pub async fn processing_items(&self) -> Result<Vec<Bytes>> {
        self.store.lrange(&self.processing(), 0, -1).await
    }

    /// Delete the waiting list, and the processing list too if `clear_processing` is set. Items in
    /// processing are lost in that case.
    pub async fn clear(&self, clear_processing: bool) -> Result<()> {
        self.store.del(self.waiting()).await?;

        if clear_processing {
            self.store.del(&self.processing()).await?;
        }

        debug!("Cleared {} (processing too: {})", self.waiting(), clear_processing);

        Ok(())
    }

    /// Serialize and add an item to the queue.
    pub async fn push(&self, item: &T) -> Result<()> {
        let payload = encode(item)?;

        self.store.lpush(self.waiting(), payload).await?;

        Ok(())
    }

    /// Take the next item and move it to the processing list.
    ///
    /// Non-blocking pop returns `None` immediately if the queue is empty. Blocking pop waits for
    /// an item up to the timeout of the queue (forever if that is zero), and gives `None` if the
    /// timeout elapsed.
    ///
    /// The payload is remembered for the next [`commit`](Self::commit), replacing the previous one
    /// even if nothing was popped.
    pub async fn pop(&mut self, block: bool) -> Result<Option<T>> {
        let processing = self.processing();

        let payload = if block {
            self.store
                .brpoplpush(self.waiting(), &processing, self.timeout)
                .await?
        } else {
            self.store.rpoplpush(self.waiting(), &processing).await?
        };

        self.last_payload = payload;

        match &self.last_payload {
            Some(payload) => {
                debug!("Popped {} bytes from {}", payload.len(), self.waiting());

                decode(payload).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Acknowledge the last popped item by removing its first occurrence from the processing list.
    /// Without a popped item it does nothing. Returns the number of removed entries.
    pub async fn commit(&mut self) -> Result<u64> {
        match &self.last_payload {
            Some(payload) => {
                let removed = self.store.lrem(&self.processing(), 1, payload).await?;

                debug!("Committed {} entries in {}", removed, self.processing());

                Ok(removed)
            }
            None => Ok(0),
        }
    }

    /// Move all the items of the processing list back to the waiting list, keeping their order.
    /// Returns the number of moved items.
    pub async fn refill(&self) -> Result<u64> {
        let processing = self.processing();
        let mut moved = 0u64;

        while let Some(payload) = self.store.lpop(&processing).await? {
            self.store.rpush(self.waiting(), payload).await?;
            moved += 1;
        }

        debug!("Refilled {} items from {}", moved, processing);

        Ok(moved)
    }
}

pub(crate) fn encode<T: Serialize>(item: &T) -> Result<Bytes> {
    serde_json::to_vec(item)
        .map(Bytes::from)
        .map_err(|e| serialization_error(format!("Cannot encode item: {e}")))
}

pub(crate) fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    serde_json::from_slice(payload).map_err(|e| {
        let head = String::from_utf8_lossy(&payload[..std::cmp::min(64usize, payload.len())]);

        serialization_error(format!("Cannot decode payload {head:?}: {e}"))
    })
}
