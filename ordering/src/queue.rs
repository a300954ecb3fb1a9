//! Bounded multi-producer intake queue for signed transactions.

use crossbeam::queue::ArrayQueue;
use tokio::sync::Notify;

use mst::model::Transaction;

use crate::error::OrderingError;

/// Thread-safe FIFO buffer between transaction ingress and the ordering
/// loop.
///
/// Producers (transport handler threads) push concurrently and never block;
/// the single ordering loop drains in batches. Reaching the proposal
/// threshold wakes the loop early, so proposals are bounded in size as well
/// as in time.
pub struct TransactionQueue {
    inner: ArrayQueue<Transaction>,
    proposal_threshold: usize,
    full_notify: Notify,
}

impl TransactionQueue {
    pub fn new(capacity: usize, proposal_threshold: usize) -> Self {
        assert!(
            capacity >= proposal_threshold,
            "queue capacity {capacity} below proposal threshold {proposal_threshold}"
        );
        Self {
            inner: ArrayQueue::new(capacity),
            proposal_threshold,
            full_notify: Notify::new(),
        }
    }

    /// Non-blocking enqueue. Fails when the buffer is at capacity; the
    /// transaction is dropped in that case and the caller reports the loss.
    pub fn push(&self, tx: Transaction) -> Result<(), OrderingError> {
        self.inner.push(tx).map_err(|_| OrderingError::QueueFull)?;
        if self.inner.len() >= self.proposal_threshold {
            self.full_notify.notify_one();
        }
        Ok(())
    }

    /// Pops up to `max` transactions in FIFO order. Called only by the
    /// ordering loop.
    pub fn drain(&self, max: usize) -> Vec<Transaction> {
        let mut out = Vec::with_capacity(max.min(self.inner.len()));
        while out.len() < max {
            match self.inner.pop() {
                Some(tx) => out.push(tx),
                None => break,
            }
        }
        out
    }

    /// Resolves once a producer has observed the buffer at the proposal
    /// threshold. A pending notification is consumed immediately.
    pub async fn wait_full(&self) {
        self.full_notify.notified().await;
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}
