use anyhow::Result;
use rand::Rng;
use relq::{QueueConfig, RedisStore, ReliableQueue};
use std::time::Duration;

/// The consumer waits up to 10 seconds for new items. A delayed producer fills the queue again
/// while the consumer is blocked, and the consumer exits 10 seconds after the last item.
#[tokio::main]
async fn main() -> Result<()> {
    relq::setup_logger();

    let config = QueueConfig::default()
        .queue_name("relq-blocking-demo")
        .timeout(Duration::from_secs(10));
    let mut queue: ReliableQueue<String> = ReliableQueue::connect(config).await?;
    queue.clear(true).await?;

    for _ in 0..100 {
        let n: u32 = rand::thread_rng().gen_range(0..100);

        queue.push(&n.to_string()).await?;
    }

    let name = queue.waiting().to_string();

    let producer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;

        // The consumer connection is busy with the blocking pop, the producer needs its own.
        let store = RedisStore::connect_default().await?;
        let delayed: ReliableQueue<String> = ReliableQueue::new(store, QueueConfig::default().queue_name(&name));

        for _ in 0..100 {
            let n: u32 = rand::thread_rng().gen_range(0..100);

            delayed.push(&format!("e_{n}")).await?;
        }

        anyhow::Ok(())
    });

    queue
        .process(true, None, None, |item| {
            if let Some(message) = item {
                println!("'{message}'");
            }

            Ok(true)
        })
        .await?;

    producer.await??;

    queue.clear(true).await?;

    Ok(())
}
