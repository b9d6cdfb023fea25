use std::time::Duration;

/// Options of a queue.
///
/// ```
/// use relq::QueueConfig;
/// use std::time::Duration;
///
/// let config = QueueConfig::default().queue_name("jobs").timeout(Duration::from_secs(10));
///
/// assert_eq!(Some("jobs"), config.queue_name.as_deref());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueueConfig {
    /// Name of the waiting list. `None` generates a unique name on first use.
    pub queue_name: Option<String>,
    /// How long a blocking pop waits for an item. Zero means it waits forever.
    pub timeout: Duration,
}

impl QueueConfig {
    pub fn queue_name(mut self, name: &str) -> Self {
        self.queue_name = Some(name.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
