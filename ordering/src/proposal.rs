use mst::model::Transaction;

/// An ordered bundle of fully-signed transactions dispatched to consensus
/// peers.
///
/// Heights are assigned by the producing node and strictly increase; a lost
/// proposal is never retransmitted, the next height supersedes it.
#[derive(Debug, Clone)]
pub struct Proposal {
    /// Sequence number assigned by the producing node
    pub height: u64,
    /// Formation time in unix milliseconds, as measured by the producing
    /// node
    pub created_at: u64,
    /// Transactions in intake (FIFO) order; never empty and never more than
    /// the configured proposal size
    pub transactions: Vec<Transaction>,
}
