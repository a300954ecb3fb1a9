//! gRPC server setup.

use std::future::Future;

use slog::Logger;
use tokio::sync::mpsc;
use tonic::transport::Server;

use ordering::{OrderingService, Proposal};

use crate::config::GatewayConfig;
use crate::peers;
use crate::proto::ordering_gate_server::OrderingGateServer;
use crate::proto::ordering_service_server::OrderingServiceServer;
use crate::services::{OrderingGateImpl, OrderingServiceImpl};

/// Ordering gateway: spawns the ordering loop and serves the ingress API.
pub struct GatewayServer {
    config: GatewayConfig,
    logger: Logger,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, logger: Logger) -> Self {
        Self { config, logger }
    }

    /// Spawns the ordering service and serves the `SendTransaction` ingress
    /// and the `OnProposal` gate until the shutdown future resolves, then
    /// tears the ordering loop down (final drain policy included).
    ///
    /// Proposals published by peers come out of `incoming_proposals`; its
    /// consumer is the node's consensus input.
    pub async fn serve(
        self,
        incoming_proposals: mpsc::Sender<Proposal>,
        shutdown: impl Future<Output = ()>,
    ) -> anyhow::Result<()> {
        let peer_table = peers::build_peer_table(&self.config.peers)?;
        let (service, handle) = OrderingService::spawn(
            self.config.ordering(),
            peer_table,
            self.logger.new(slog::o!("component" => "ordering")),
        );

        let ingress = OrderingServiceImpl::new(
            handle,
            self.logger.new(slog::o!("component" => "ingress")),
        );
        let gate = OrderingGateImpl::new(
            incoming_proposals,
            self.logger.new(slog::o!("component" => "gate")),
        );

        slog::info!(self.logger, "Gateway listening";
            "addr" => %self.config.listen_addr,
            "peer_count" => self.config.peers.len(),
        );

        Server::builder()
            .add_service(OrderingServiceServer::new(ingress))
            .add_service(OrderingGateServer::new(gate))
            .serve_with_shutdown(self.config.listen_addr, shutdown)
            .await?;

        service.shutdown().await;
        slog::info!(self.logger, "Gateway stopped");
        Ok(())
    }
}
