//! Proposal receive gate implementation.

use slog::Logger;
use tokio::sync::mpsc;
use tonic::{Request, Response, Status};

use ordering::Proposal;

use crate::conversions;
use crate::proto;
use crate::proto::ordering_gate_server::OrderingGate;

/// Implementation of the OrderingGate gRPC service.
///
/// Peers publish their proposals here; decoded proposals are forwarded to
/// the node's consensus input channel. The channel's consumer is outside
/// this crate, so a dropped receiver means the node is tearing down.
pub struct OrderingGateImpl {
    proposals: mpsc::Sender<Proposal>,
    logger: Logger,
}

impl OrderingGateImpl {
    pub fn new(proposals: mpsc::Sender<Proposal>, logger: Logger) -> Self {
        Self { proposals, logger }
    }
}

#[tonic::async_trait]
impl OrderingGate for OrderingGateImpl {
    async fn on_proposal(
        &self,
        request: Request<proto::Proposal>,
    ) -> Result<Response<proto::Empty>, Status> {
        let proposal = conversions::proposal_from_wire(request.into_inner()).map_err(|error| {
            slog::debug!(self.logger, "Rejected proposal"; "error" => %error);
            Status::from(error)
        })?;

        let height = proposal.height;
        let tx_count = proposal.transactions.len();
        if self.proposals.send(proposal).await.is_err() {
            return Err(Status::unavailable("proposal consumer is shut down"));
        }

        slog::debug!(self.logger, "Proposal received";
            "height" => height,
            "tx_count" => tx_count,
        );
        Ok(Response::new(proto::Empty {}))
    }
}
