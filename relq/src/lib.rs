//! Reliable queue on top of Redis lists.
//!
//! Producers push items into a waiting list. A consumer pop atomically moves the item into a
//! processing list, and the consumer removes it from there with `commit` once the item is
//! handled. If the consumer dies in between, the item stays in the processing list and
//! `refill` puts it back to the waiting list. Delivery is at-least-once.
//!
//! ```no_run
//! use relq::{QueueConfig, ReliableQueue};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = QueueConfig::default().queue_name("jobs").timeout(Duration::from_secs(5));
//!     let mut queue: ReliableQueue<String> = ReliableQueue::connect(config).await?;
//!
//!     queue.push(&"hello".to_string()).await?;
//!
//!     queue
//!         .process(true, None, Some(1), |item| {
//!             println!("{item:?}");
//!             Ok(true)
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
mod config;
#[cfg(feature = "logger")]
mod dev;
mod error;
mod process;
mod queue;
pub mod store;

pub use config::QueueConfig;
#[cfg(feature = "logger")]
pub use dev::setup_logger;
pub use error::{ErrorKind, QueueError};
pub use process::ProcessSummary;
pub use queue::{ReliableQueue, PROCESSING_SUFFIX};
pub use store::{ListStore, MemoryStore, RedisStore};

/// Version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> String {
    format!("relq version {VERSION}")
}
