use thiserror::Error;

/// Errors surfaced to transaction producers.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum OrderingError {
    /// The intake queue is at capacity; the transaction is dropped.
    #[error("transaction queue is full")]
    QueueFull,

    /// The service is tearing down and no longer accepts transactions.
    #[error("ordering service is shutting down")]
    ShuttingDown,
}
