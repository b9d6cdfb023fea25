use std::fmt;

/// Classification of the failures the queue can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection or operation failure talking to the list store.
    StoreUnavailable,
    /// An item cannot be encoded, or a stored payload cannot be decoded.
    Serialization,
    /// The handler passed to `process` failed, the loop has been aborted.
    Handler,
}

/// Error reported by the queue and the stores. Results are `anyhow::Result`s, the kind of the
/// failure can be checked by downcasting to `QueueError` or by calling [`QueueError::kind_of`].
#[derive(Clone, Debug)]
pub struct QueueError {
    pub kind: ErrorKind,
    pub message: String,
}

impl QueueError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        QueueError {
            kind,
            message: message.into(),
        }
    }

    /// Returns the kind of the error if it is (or is the context of) a `QueueError`.
    pub fn kind_of(err: &anyhow::Error) -> Option<ErrorKind> {
        err.downcast_ref::<QueueError>().map(|qe| qe.kind)
    }
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for QueueError {}

/// Shorthand for creating errors in async functions.
#[macro_export]
macro_rules! queue_error {
    ($kind:expr, $message:expr) => {
        ::std::result::Result::Err(anyhow::Error::new($crate::QueueError::new($kind, $message)))
    };
}

pub(crate) fn store_error(message: impl Into<String>) -> anyhow::Error {
    anyhow::Error::new(QueueError::new(ErrorKind::StoreUnavailable, message))
}

pub(crate) fn serialization_error(message: impl Into<String>) -> anyhow::Error {
    anyhow::Error::new(QueueError::new(ErrorKind::Serialization, message))
}
