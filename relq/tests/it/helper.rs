use anyhow::Result;
use relq::{QueueConfig, RedisStore, ReliableQueue};

pub async fn connect() -> Result<RedisStore> {
    let url = std::env::var("RELQ_TEST_URL").unwrap_or_else(|_| relq::store::redis::DEFAULT_URL.to_string());

    RedisStore::connect(&url).await
}

/// Queue with a fresh, unique name so parallel tests don't see each other's items.
pub async fn fresh_queue(config: QueueConfig) -> Result<ReliableQueue<String, RedisStore>> {
    let queue = ReliableQueue::new(connect().await?, config);

    queue.clear(true).await?;

    Ok(queue)
}
