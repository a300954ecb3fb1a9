//! Ordering service: buffers fully-signed transactions and emits
//! height-stamped proposals to consensus peers at a bounded cadence.
//!
//! ## Architecture
//!
//!
//! gRPC handlers ──[push]──► TransactionQueue ──[drain]──► Ordering loop
//!                                 │                            │
//!                         (threshold notify)            (timer tick)
//!                                 └──────────► wake ◄──────────┘
//!                                                              │
//!                                                         Proposal
//!                                                              │
//!                                              fire-and-forget RPCs to peers
//!
//!
//! Producers push concurrently from transport threads; a single cooperative
//! loop drains the queue whenever the timer fires or the buffer reaches the
//! proposal size, stamps the next height, and dispatches to every configured
//! peer. Per-peer send failures are logged and counted, never retried; the
//! next proposal supersedes.

pub mod error;
pub mod proposal;
pub mod queue;
pub mod service;
pub mod sink;

pub use error::OrderingError;
pub use proposal::Proposal;
pub use queue::TransactionQueue;
pub use service::{
    OrderingConfig, OrderingHandle, OrderingService, OrderingStats, StatsSnapshot,
};
pub use sink::{PeerTable, ProposalSink};
