//! Completion and expiry oracle for multi-signature batches.

use std::sync::Arc;

use crate::model::TransactionBatch;

/// Decides when a batch has collected enough signatures and when its
/// collection window has elapsed.
///
/// Injected into [`crate::state::MstState`]; the state container itself
/// performs no reasoning about quorum thresholds or time units.
pub trait Completer: Send + Sync {
    /// True iff every transaction in the batch reached its signature quorum.
    fn is_complete(&self, batch: &TransactionBatch) -> bool;

    /// True iff the batch's collection window has elapsed at `now_ms`.
    fn is_expired(&self, batch: &TransactionBatch, now_ms: u64) -> bool;
}

/// Shared-immutable handle under which completers circulate.
pub type SharedCompleter = Arc<dyn Completer>;

/// Production completer: per-transaction quorum counting with a TTL measured
/// from the batch creation time. The TTL comes from node configuration.
#[derive(Debug, Clone)]
pub struct DefaultCompleter {
    ttl_ms: u64,
}

impl DefaultCompleter {
    pub fn new(ttl_ms: u64) -> Self {
        Self { ttl_ms }
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }
}

impl Completer for DefaultCompleter {
    fn is_complete(&self, batch: &TransactionBatch) -> bool {
        batch
            .transactions()
            .iter()
            .all(|tx| tx.signature_count() as u32 >= tx.quorum())
    }

    fn is_expired(&self, batch: &TransactionBatch, now_ms: u64) -> bool {
        now_ms.saturating_sub(batch.created_at()) >= self.ttl_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PublicKey, Transaction, TransactionBatch};

    fn pk(seed: u8) -> PublicKey {
        PublicKey([seed; 32])
    }

    fn batch_with_signatures(quorum: u32, signers: &[u8]) -> TransactionBatch {
        let mut tx = Transaction::new(pk(1), 1_000, quorum, b"cmd".to_vec());
        for signer in signers {
            tx.add_signature(vec![*signer], pk(*signer));
        }
        TransactionBatch::new(vec![tx])
    }

    #[test]
    fn complete_when_every_transaction_reaches_quorum() {
        let completer = DefaultCompleter::new(10_000);

        assert!(!completer.is_complete(&batch_with_signatures(2, &[7])));
        assert!(completer.is_complete(&batch_with_signatures(2, &[7, 8])));
        // Over-collection is still complete.
        assert!(completer.is_complete(&batch_with_signatures(2, &[7, 8, 9])));
    }

    #[test]
    fn one_unsigned_transaction_keeps_the_batch_incomplete() {
        let mut signed = Transaction::new(pk(1), 1_000, 1, b"a".to_vec());
        signed.add_signature(b"sig".to_vec(), pk(7));
        let unsigned = Transaction::new(pk(2), 1_000, 1, b"b".to_vec());
        let batch = TransactionBatch::new(vec![signed, unsigned]);

        assert!(!DefaultCompleter::new(10_000).is_complete(&batch));
    }

    #[test]
    fn expiry_is_measured_from_batch_creation() {
        let completer = DefaultCompleter::new(10_000);
        let batch = batch_with_signatures(2, &[]);

        assert!(!completer.is_expired(&batch, 1_000));
        assert!(!completer.is_expired(&batch, 10_999));
        assert!(completer.is_expired(&batch, 11_000));
        // A clock running behind the creating peer never underflows.
        assert!(!completer.is_expired(&batch, 0));
    }
}
