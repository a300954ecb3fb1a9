use std::time::{SystemTime, UNIX_EPOCH};

pub mod batch;
pub mod signature;
pub mod transaction;

pub use batch::{BatchHash, TransactionBatch};
pub use signature::{PublicKey, Signature};
pub use transaction::Transaction;

/// Current unix time in milliseconds. Batch TTLs are configured in
/// milliseconds, so the whole crate speaks that unit.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}
