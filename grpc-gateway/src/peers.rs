//! Outbound proposal dispatch to consensus peers.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};

use ordering::{PeerTable, Proposal, ProposalSink};

use crate::conversions;
use crate::proto::ordering_gate_client::OrderingGateClient;

/// A consensus peer reachable over gRPC.
///
/// The channel connects lazily: construction never touches the network, and
/// an unreachable peer surfaces as a dispatch failure on the first call
/// instead.
pub struct GrpcPeer {
    address: String,
    client: OrderingGateClient<Channel>,
}

impl GrpcPeer {
    pub fn new(address: impl Into<String>) -> anyhow::Result<Self> {
        let address = address.into();
        let channel = Endpoint::from_shared(address.clone())
            .with_context(|| format!("invalid peer address {address}"))?
            .connect_lazy();
        Ok(Self {
            address,
            client: OrderingGateClient::new(channel),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl ProposalSink for GrpcPeer {
    async fn on_proposal(&self, proposal: &Proposal) -> anyhow::Result<()> {
        // Cloning a tonic client is cheap; each call gets its own handle.
        let mut client = self.client.clone();
        client
            .on_proposal(conversions::proposal_to_wire(proposal))
            .await
            .with_context(|| format!("onProposal to {} failed", self.address))?;
        Ok(())
    }
}

/// Builds the peer dispatch table from configured addresses.
pub fn build_peer_table(addresses: &[String]) -> anyhow::Result<PeerTable> {
    addresses
        .iter()
        .map(|address| {
            let peer = GrpcPeer::new(address.clone())?;
            Ok((address.clone(), Arc::new(peer) as Arc<dyn ProposalSink>))
        })
        .collect()
}
