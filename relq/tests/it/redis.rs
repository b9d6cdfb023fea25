use crate::helper;
use anyhow::Result;
use relq::{ListStore, QueueConfig, ReliableQueue};
use std::time::Duration;

#[tokio::test]
async fn ping() -> Result<()> {
    let store = helper::connect().await?;

    store.ping().await?;

    Ok(())
}

#[tokio::test]
async fn fifo_commit_and_refill() -> Result<()> {
    let mut queue = helper::fresh_queue(QueueConfig::default()).await?;

    for item in ["a", "b", "c"] {
        queue.push(&item.to_string()).await?;
    }

    assert_eq!(3, queue.length().await?);

    assert_eq!(Some("a".to_string()), queue.pop(false).await?);
    assert_eq!(1, queue.commit().await?);

    assert_eq!(Some("b".to_string()), queue.pop(false).await?);
    assert_eq!(Some("c".to_string()), queue.pop(false).await?);
    assert_eq!(None, queue.pop(false).await?);
    assert_eq!(2, queue.processing_length().await?);

    assert_eq!(2, queue.refill().await?);
    assert_eq!(0, queue.processing_length().await?);
    assert_eq!(Some("b".to_string()), queue.pop(false).await?);

    queue.clear(true).await?;

    Ok(())
}

#[tokio::test]
async fn blocking_pop_honours_the_timeout() -> Result<()> {
    let mut queue = helper::fresh_queue(QueueConfig::default().timeout(Duration::from_secs(1))).await?;

    let res = tokio::time::timeout(Duration::from_secs(3), queue.pop(true)).await;

    assert!(matches!(res, Ok(Ok(None))));

    Ok(())
}

#[tokio::test]
async fn blocking_pop_gets_item_from_other_connection() -> Result<()> {
    let mut consumer = helper::fresh_queue(QueueConfig::default()).await?;
    let name = consumer.waiting().to_string();

    let producer: ReliableQueue<String, _> =
        ReliableQueue::new(helper::connect().await?, QueueConfig::default().queue_name(&name));

    let waiter = tokio::spawn(async move {
        let item = consumer.pop(true).await;

        (item, consumer)
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    producer.push(&"late".to_string()).await?;

    let (item, mut consumer) = waiter.await?;

    assert_eq!(Some("late".to_string()), item?);
    consumer.commit().await?;
    assert_eq!(0, producer.store().llen(&producer.processing()).await?);

    producer.clear(true).await?;

    Ok(())
}
