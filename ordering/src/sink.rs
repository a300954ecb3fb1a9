use std::sync::Arc;

use async_trait::async_trait;

use crate::proposal::Proposal;

/// Outbound side of proposal publication.
///
/// Implementations wrap a transport stub for one consensus peer. Dispatch is
/// fire-and-forget: the service logs and counts failures but never retries.
#[async_trait]
pub trait ProposalSink: Send + Sync {
    async fn on_proposal(&self, proposal: &Proposal) -> anyhow::Result<()>;
}

/// Peer dispatch table, keyed by peer address. Populated at service
/// construction and immutable afterwards.
pub type PeerTable = Vec<(String, Arc<dyn ProposalSink>)>;
