//! Set-like container of in-flight multi-signature transaction batches.
//!
//! ## Structure
//!
//! - `members`: batches keyed by reduced hash, at most one copy per identity
//! - `expiry_index`: min-heap over `(creation time, hash)` driving time-based
//!   eviction
//! - `completer`: shared oracle deciding completion and expiry
//!
//! Both index structures are mutated only through `raw_insert` / `raw_erase`,
//! which keeps them coherent. Heap entries whose batch already left through
//! completion are discarded lazily at pop time via a membership check, so the
//! heap never needs out-of-order removal.
//!
//! ## Invariants
//!
//! 1. Every member has a live entry in `expiry_index`.
//! 2. No member satisfies `completer.is_complete`; completed batches are
//!    evicted at insertion time and handed back to the caller.
//! 3. Immediately after `erase_by_time(now)`, no member is expired at `now`.
//! 4. Member signature sets only grow between observable states.
//!
//! ## Thread safety
//!
//! `MstState` is **not** thread-safe. It is owned by a single processing
//! thread (or guarded externally); all operations are synchronous and total.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::completer::SharedCompleter;
use crate::model::{BatchHash, TransactionBatch};

/// Entry in the expiry index. Ordered by batch creation time with the hash
/// as tie-breaker for a total order. The key is fixed at insertion, so
/// in-place signature growth never reorders the heap.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ExpiryEntry {
    created_at: u64,
    hash: BatchHash,
}

/// Result of [`MstState::insert`].
///
/// `diff` holds the batches that changed observably (newly stored, or newly
/// signed) and is what gets gossiped onward. A batch that just reached
/// completion is removed from the state *and* from the diff, and carried in
/// `completed` instead, so gossip never re-advertises a finished batch.
#[derive(Debug, Clone)]
pub struct InsertOutcome {
    pub diff: MstState,
    pub completed: Option<TransactionBatch>,
}

/// Result of [`MstState::merge`]: the union of per-insert diffs plus every
/// batch that reached completion during the fold.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub diff: MstState,
    pub completed: Vec<TransactionBatch>,
}

#[derive(Clone)]
pub struct MstState {
    completer: SharedCompleter,
    members: HashMap<BatchHash, TransactionBatch>,
    expiry_index: BinaryHeap<Reverse<ExpiryEntry>>,
}

impl MstState {
    /// Constructs an empty state sharing the given completer.
    pub fn empty(completer: SharedCompleter) -> Self {
        Self {
            completer,
            members: HashMap::new(),
            expiry_index: BinaryHeap::new(),
        }
    }

    /// Folds one batch into the state.
    ///
    /// - Unknown reduced hash: the batch is stored (unless it is already
    ///   complete, in which case it is handed straight back) and appears in
    ///   the diff.
    /// - Known hash: the incoming signatures merge into the stored batch.
    ///   Completion evicts the merged batch into `completed`; otherwise the
    ///   merged batch appears in the diff iff at least one new signature
    ///   landed.
    pub fn insert(&mut self, batch: TransactionBatch) -> InsertOutcome {
        let completer = Arc::clone(&self.completer);
        let mut diff = MstState::empty(Arc::clone(&self.completer));
        let hash = *batch.reduced_hash();

        match self.members.get_mut(&hash) {
            Some(member) => {
                let inserted_new = member.merge_signatures(&batch);
                let completed_now = completer.is_complete(member);
                if inserted_new && !completed_now {
                    diff.raw_insert(member.clone());
                }
                let completed = if completed_now {
                    self.raw_erase(&hash)
                } else {
                    None
                };
                InsertOutcome { diff, completed }
            }
            None => {
                if completer.is_complete(&batch) {
                    // Arrived with every quorum already satisfied; evicted on
                    // insertion rather than stored.
                    return InsertOutcome {
                        diff,
                        completed: Some(batch),
                    };
                }
                diff.raw_insert(batch.clone());
                self.raw_insert(batch);
                InsertOutcome {
                    diff,
                    completed: None,
                }
            }
        }
    }

    /// Folds every batch of `other` into `self`.
    ///
    /// The fold order is unspecified; the final state does not depend on it.
    pub fn merge(&mut self, other: &MstState) -> MergeOutcome {
        let mut diff = MstState::empty(Arc::clone(&self.completer));
        let mut completed = Vec::new();
        for batch in other.members.values() {
            let outcome = self.insert(batch.clone());
            for changed in outcome.diff.members.into_values() {
                diff.raw_insert(changed);
            }
            completed.extend(outcome.completed);
        }
        MergeOutcome { diff, completed }
    }

    /// A new state containing exactly the members of `self` whose reduced
    /// hash is not present in `other`. Signatures are not compared.
    pub fn difference(&self, other: &MstState) -> MstState {
        let mut out = MstState::empty(Arc::clone(&self.completer));
        for (hash, batch) in &self.members {
            if !other.members.contains_key(hash) {
                out.raw_insert(batch.clone());
            }
        }
        out
    }

    /// All members, ascending by hex rendering of the reduced hash (which is
    /// byte-lexicographic order). The stable order makes state comparison
    /// and diagnostics deterministic.
    pub fn get_batches(&self) -> Vec<&TransactionBatch> {
        let mut batches: Vec<_> = self.members.values().collect();
        batches.sort_by_key(|batch| *batch.reduced_hash());
        batches
    }

    /// Evicts every batch whose collection window has elapsed at `now_ms`
    /// and returns them as a state, so callers can notify the originators.
    pub fn erase_by_time(&mut self, now_ms: u64) -> MstState {
        let mut expired = MstState::empty(Arc::clone(&self.completer));
        loop {
            let hash = match self.expiry_index.peek() {
                Some(Reverse(entry)) => entry.hash,
                None => break,
            };
            let Some(member) = self.members.get(&hash) else {
                // The batch behind this entry already left through
                // completion; drop the stale entry.
                self.expiry_index.pop();
                continue;
            };
            if !self.completer.is_expired(member, now_ms) {
                break;
            }
            self.expiry_index.pop();
            if let Some(batch) = self.members.remove(&hash) {
                expired.raw_insert(batch);
            }
        }
        expired
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, hash: &BatchHash) -> bool {
        self.members.contains_key(hash)
    }

    pub fn get(&self, hash: &BatchHash) -> Option<&TransactionBatch> {
        self.members.get(hash)
    }

    /// Stores a batch in both index structures. Callers guarantee the hash
    /// is not already a member (or intend replacement, as diff states do).
    fn raw_insert(&mut self, batch: TransactionBatch) {
        self.expiry_index.push(Reverse(ExpiryEntry {
            created_at: batch.created_at(),
            hash: *batch.reduced_hash(),
        }));
        self.members.insert(*batch.reduced_hash(), batch);
    }

    /// Removes a batch from `members`; its heap entry is left behind and
    /// lazily discarded by `erase_by_time`.
    fn raw_erase(&mut self, hash: &BatchHash) -> Option<TransactionBatch> {
        self.members.remove(hash)
    }

    #[cfg(test)]
    fn live_index_hashes(&self) -> std::collections::HashSet<BatchHash> {
        self.expiry_index
            .iter()
            .map(|Reverse(entry)| entry.hash)
            .filter(|hash| self.members.contains_key(hash))
            .collect()
    }
}

/// Two states are equal iff they contain the same set of batches under full
/// structural equality (same reduced hashes *and* same signature sets).
impl PartialEq for MstState {
    fn eq(&self, other: &Self) -> bool {
        if self.members.len() != other.members.len() {
            return false;
        }
        self.get_batches()
            .iter()
            .zip(other.get_batches())
            .all(|(lhs, rhs)| lhs.structurally_eq(rhs))
    }
}

impl Eq for MstState {}

impl fmt::Debug for MstState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MstState")
            .field(
                "batches",
                &self
                    .get_batches()
                    .iter()
                    .map(|batch| batch.reduced_hash().to_string())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
