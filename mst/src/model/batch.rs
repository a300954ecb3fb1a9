use std::fmt;
use std::hash::{Hash, Hasher};

use crate::model::transaction::Transaction;

/// Identity of a batch: a content hash over the batch structure excluding
/// signatures (the *reduced hash*). Stable over the batch's whole lifetime.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchHash(pub [u8; blake3::OUT_LEN]);

impl BatchHash {
    pub fn as_bytes(&self) -> &[u8; blake3::OUT_LEN] {
        &self.0
    }
}

impl fmt::Display for BatchHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for BatchHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BatchHash({})", hex::encode(&self.0[..8]))
    }
}

/// An ordered bundle of transactions sharing one multi-signature collection
/// process.
///
/// The reduced hash is computed once at construction and never changes;
/// only the per-transaction signature sets are mutable, and they only grow.
/// Two batches are *equal* iff their reduced hashes are equal; use
/// [`TransactionBatch::structurally_eq`] when signature contents matter.
#[derive(Debug, Clone)]
pub struct TransactionBatch {
    transactions: Vec<Transaction>,
    reduced_hash: BatchHash,
}

impl TransactionBatch {
    /// Bundles transactions into a batch. Batches carry at least one
    /// transaction.
    pub fn new(transactions: Vec<Transaction>) -> Self {
        assert!(
            !transactions.is_empty(),
            "a transaction batch cannot be empty"
        );
        let reduced_hash = Self::compute_reduced_hash(&transactions);
        Self {
            transactions,
            reduced_hash,
        }
    }

    /// Hash over each member transaction's position and payload hash.
    /// Signatures are excluded, so signature growth keeps the identity.
    fn compute_reduced_hash(transactions: &[Transaction]) -> BatchHash {
        let mut hasher = blake3::Hasher::new();
        for (i, tx) in transactions.iter().enumerate() {
            hasher.update(&i.to_le_bytes());
            hasher.update(tx.payload_hash());
        }
        BatchHash(hasher.finalize().into())
    }

    pub fn reduced_hash(&self) -> &BatchHash {
        &self.reduced_hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Creation time of the batch: the earliest member transaction's
    /// creation time. Used as the expiry key, fixed for the batch lifetime.
    pub fn created_at(&self) -> u64 {
        self.transactions
            .iter()
            .map(Transaction::created_at)
            .min()
            .unwrap_or(0)
    }

    /// Copies the donor's signatures into this batch, transaction by
    /// transaction in positional order.
    ///
    /// Returns `true` iff at least one new signature landed anywhere.
    ///
    /// # Panics
    ///
    /// Both batches must share a reduced hash, which implies equal
    /// transaction counts. A mismatch means a misbehaving peer or a bug and
    /// aborts with a diagnostic.
    pub fn merge_signatures(&mut self, donor: &TransactionBatch) -> bool {
        assert_eq!(
            self.transactions.len(),
            donor.transactions.len(),
            "batches with reduced hash {} disagree on transaction count",
            self.reduced_hash,
        );
        let mut inserted_new = false;
        for (target, source) in self.transactions.iter_mut().zip(donor.transactions.iter()) {
            for signature in source.signatures() {
                inserted_new |= target.add_signature(signature.signed_data, signature.public_key);
            }
        }
        inserted_new
    }

    /// Full comparison: same identity *and* same signature sets per
    /// transaction.
    pub fn structurally_eq(&self, other: &TransactionBatch) -> bool {
        self.reduced_hash == other.reduced_hash && self.transactions == other.transactions
    }
}

impl PartialEq for TransactionBatch {
    fn eq(&self, other: &Self) -> bool {
        self.reduced_hash == other.reduced_hash
    }
}

impl Eq for TransactionBatch {}

impl Hash for TransactionBatch {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.reduced_hash.hash(state);
    }
}
