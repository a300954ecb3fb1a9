//! Multi-signature transaction (MST) state engine.
//!
//! A multi-signature transaction needs signatures from several parties before
//! it may enter consensus. Peers gossip partially-signed *batches* to each
//! other; every node folds what it hears into an [`state::MstState`], which
//! accumulates signatures per batch until an injected [`completer::Completer`]
//! declares the batch complete, or its collection window elapses.
//!
//! The crate is deliberately transport- and crypto-agnostic: signatures are
//! opaque `(public key, signed data)` pairs that the transport layer verified
//! before they got here, and batches arrive as model types converted at the
//! wire boundary.

pub mod completer;
pub mod model;
pub mod state;

pub use completer::{Completer, DefaultCompleter, SharedCompleter};
pub use model::{BatchHash, PublicKey, Signature, Transaction, TransactionBatch};
pub use state::{InsertOutcome, MergeOutcome, MstState};
