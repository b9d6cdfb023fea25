use crate::error::{ErrorKind, QueueError};
use crate::queue::ReliableQueue;
use crate::store::ListStore;
use anyhow::Result;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// What happened during a `process` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    /// Number of handler invocations, including the ones with `None`.
    pub handled: usize,
    /// Number of items the handler accepted and which got committed.
    pub committed: usize,
}

impl<T, S> ReliableQueue<T, S>
where
    T: Serialize + DeserializeOwned,
    S: ListStore,
{
    /// Pop items and pass them to `handler` one by one. If the handler returns `true` the item is
    /// committed, otherwise it stays in the processing list.
    ///
    /// The loop stops when
    /// * `count` items have been handled,
    /// * a pop gives `None` (the handler is still called with that `None`),
    /// * in non-blocking mode, the waiting list became empty.
    ///
    /// A negative `count` calls the handler once with `None` and doesn't pop at all.
    ///
    /// `timeout` replaces the timeout of the queue, **and it stays replaced after the call**.
    ///
    /// The handler runs inline, an error from it aborts the loop and is returned as a
    /// [`ErrorKind::Handler`] error. Items committed before are not touched.
    pub async fn process<F>(
        &mut self,
        block: bool,
        timeout: Option<Duration>,
        count: Option<i64>,
        mut handler: F,
    ) -> Result<ProcessSummary>
    where
        F: FnMut(Option<T>) -> Result<bool>,
    {
        if let Some(timeout) = timeout {
            self.set_timeout(timeout);
        }

        let mut summary = ProcessSummary::default();
        let mut count = count;

        if matches!(count, Some(c) if c < 0) {
            call_handler(&mut handler, None::<T>)?;
            summary.handled += 1;

            return Ok(summary);
        }

        loop {
            if matches!(count, Some(c) if c <= 0) {
                break;
            }

            let item = self.pop(block).await?;
            let popped = item.is_some();

            let accepted = call_handler(&mut handler, item)?;
            summary.handled += 1;

            if accepted {
                self.commit().await?;
                summary.committed += 1;
            }

            if let Some(c) = count.as_mut() {
                *c -= 1;
            }

            if !popped || (!block && self.is_empty().await?) {
                break;
            }
        }

        debug!(
            "Processed {} items of {}, committed {}",
            summary.handled,
            self.waiting(),
            summary.committed
        );

        Ok(summary)
    }
}

fn call_handler<T, F>(handler: &mut F, item: Option<T>) -> Result<bool>
where
    F: FnMut(Option<T>) -> Result<bool>,
{
    handler(item).map_err(|e| e.context(QueueError::new(ErrorKind::Handler, "Handler failed")))
}
