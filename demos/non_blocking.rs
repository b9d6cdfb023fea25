use anyhow::Result;
use rand::Rng;
use relq::{QueueConfig, ReliableQueue};

/// Fill a queue with random numbers and drain it without waiting for more.
#[tokio::main]
async fn main() -> Result<()> {
    relq::setup_logger();

    let mut queue: ReliableQueue<u32> = ReliableQueue::connect(QueueConfig::default()).await?;
    queue.clear(true).await?;

    let mut rng = rand::thread_rng();

    for _ in 0..100 {
        queue.push(&rng.gen_range(0..100)).await?;
    }

    let summary = queue
        .process(false, None, None, |item| {
            if let Some(n) = item {
                println!("{n}");
            }

            Ok(true)
        })
        .await?;

    log::info!("Processed {} items", summary.handled);

    queue.clear(true).await?;

    Ok(())
}
