use relq::{ErrorKind, MemoryStore, ProcessSummary, QueueConfig, QueueError, ReliableQueue};
use std::time::Duration;

fn queue(store: &MemoryStore, name: &str) -> ReliableQueue<String, MemoryStore> {
    ReliableQueue::new(store.clone(), QueueConfig::default().queue_name(name))
}

async fn push_all(queue: &ReliableQueue<String, MemoryStore>, items: &[&str]) {
    for item in items {
        queue.push(&item.to_string()).await.unwrap();
    }
}

fn s(v: &str) -> Option<String> {
    Some(v.to_string())
}

#[tokio::test]
async fn process_commits_accepted_items() {
    let store = MemoryStore::new();
    let mut q = queue(&store, "accept");

    push_all(&q, &["a"]).await;

    let mut seen = vec![];
    let summary = q
        .process(false, None, None, |item| {
            seen.push(item);
            Ok(true)
        })
        .await
        .unwrap();

    assert_eq!(vec![s("a")], seen);
    assert_eq!(ProcessSummary { handled: 1, committed: 1 }, summary);
    assert_eq!(0, q.processing_length().await.unwrap());
}

#[tokio::test]
async fn rejected_items_stay_in_processing() {
    let store = MemoryStore::new();
    let mut q = queue(&store, "reject");

    push_all(&q, &["a", "a"]).await;

    let summary = q
        .process(false, None, None, |item| {
            assert_eq!(s("a"), item);
            Ok(false)
        })
        .await
        .unwrap();

    assert_eq!(2, summary.handled);
    assert_eq!(0, summary.committed);
    assert_eq!(
        vec![bytes::Bytes::from_static(b"\"a\""), bytes::Bytes::from_static(b"\"a\"")],
        q.processing_items().await.unwrap()
    );

    q.refill().await.unwrap();

    assert_eq!(2, q.length().await.unwrap());
    assert_eq!(0, q.processing_length().await.unwrap());
}

#[tokio::test]
async fn count_limits_the_items() {
    let store = MemoryStore::new();
    let mut q = queue(&store, "count");

    push_all(&q, &["a", "b"]).await;

    for expected in [s("a"), s("b"), None] {
        let mut seen = vec![];

        q.process(false, None, Some(1), |item| {
            seen.push(item);
            Ok(true)
        })
        .await
        .unwrap();

        assert_eq!(vec![expected], seen);
    }
}

#[tokio::test]
async fn negative_count_calls_handler_once_without_pop() {
    let store = MemoryStore::new();
    let mut q = queue(&store, "negative");

    push_all(&q, &["a", "b"]).await;

    let mut seen = vec![];
    let summary = q
        .process(false, None, Some(-1), |item| {
            seen.push(item);
            Ok(true)
        })
        .await
        .unwrap();

    assert_eq!(vec![None], seen);
    assert_eq!(ProcessSummary { handled: 1, committed: 0 }, summary);
    assert_eq!(2, q.length().await.unwrap());
    assert_eq!(0, q.processing_length().await.unwrap());

    // a larger count stops when the queue runs dry
    let mut seen = vec![];

    q.process(false, None, Some(4), |item| {
        seen.push(item);
        Ok(true)
    })
    .await
    .unwrap();

    assert_eq!(vec![s("a"), s("b")], seen);
}

#[tokio::test]
async fn zero_count_does_nothing() {
    let store = MemoryStore::new();
    let mut q = queue(&store, "zero");

    push_all(&q, &["a"]).await;

    let summary = q
        .process(false, None, Some(0), |_| panic!("handler must not run"))
        .await
        .unwrap();

    assert_eq!(ProcessSummary::default(), summary);
    assert_eq!(1, q.length().await.unwrap());
}

#[tokio::test]
async fn empty_queue_gives_none_to_handler() {
    let store = MemoryStore::new();
    let mut q = queue(&store, "nothing");

    let mut seen = vec![];

    q.process(false, None, None, |item| {
        seen.push(item);
        Ok(true)
    })
    .await
    .unwrap();

    assert_eq!(vec![None], seen);
}

#[tokio::test(start_paused = true)]
async fn blocking_process_stops_on_timeout() {
    let store = MemoryStore::new();
    let mut q = queue(&store, "blocking");

    push_all(&q, &["1", "2"]).await;

    let mut seen = vec![];

    q.process(true, Some(Duration::from_secs(2)), None, |item| {
        seen.push(item);
        Ok(true)
    })
    .await
    .unwrap();

    assert_eq!(vec![s("1"), s("2"), None], seen);
}

#[tokio::test(start_paused = true)]
async fn timeout_override_persists() {
    let store = MemoryStore::new();
    let mut q = queue(&store, "override");

    q.process(true, Some(Duration::from_secs(1)), Some(1), |_| Ok(true))
        .await
        .unwrap();

    assert_eq!(Duration::from_secs(1), q.timeout());

    // no override keeps the previous one
    q.process(true, None, Some(1), |_| Ok(true)).await.unwrap();

    assert_eq!(Duration::from_secs(1), q.timeout());
}

#[tokio::test]
async fn handler_error_aborts_the_loop() {
    let store = MemoryStore::new();
    let mut q = queue(&store, "failing");

    push_all(&q, &["ok", "bad", "never"]).await;

    let mut seen = vec![];
    let err = q
        .process(false, None, None, |item| {
            seen.push(item.clone());

            match item.as_deref() {
                Some("bad") => Err(anyhow::anyhow!("cannot handle")),
                _ => Ok(true),
            }
        })
        .await
        .unwrap_err();

    assert_eq!(Some(ErrorKind::Handler), QueueError::kind_of(&err));
    assert_eq!(vec![s("ok"), s("bad")], seen);
    // the failed item is still in processing, the next is still waiting
    assert_eq!(vec![bytes::Bytes::from_static(b"\"bad\"")], q.processing_items().await.unwrap());
    assert_eq!(1, q.length().await.unwrap());
}
