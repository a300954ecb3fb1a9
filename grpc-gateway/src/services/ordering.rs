//! Transaction ingress service implementation.

use slog::Logger;
use tonic::{Request, Response, Status};

use ordering::OrderingHandle;

use crate::conversions;
use crate::error::GatewayError;
use crate::proto;
use crate::proto::ordering_service_server::OrderingService;

/// Implementation of the OrderingService gRPC ingress.
///
/// Handlers run on tonic's thread pool and enqueue concurrently with the
/// ordering loop's drain; the handle is safe for that.
pub struct OrderingServiceImpl {
    handle: OrderingHandle,
    logger: Logger,
}

impl OrderingServiceImpl {
    pub fn new(handle: OrderingHandle, logger: Logger) -> Self {
        Self { handle, logger }
    }
}

#[tonic::async_trait]
impl OrderingService for OrderingServiceImpl {
    async fn send_transaction(
        &self,
        request: Request<proto::Transaction>,
    ) -> Result<Response<proto::Empty>, Status> {
        let tx = conversions::transaction_from_wire(request.into_inner()).map_err(|error| {
            slog::debug!(self.logger, "Rejected transaction"; "error" => %error);
            Status::from(error)
        })?;

        let tx_id = hex::encode(&tx.payload_hash()[..8]);
        self.handle.submit(tx).map_err(|error| {
            slog::warn!(self.logger, "Failed to enqueue transaction";
                "tx" => %tx_id,
                "error" => %error,
            );
            Status::from(GatewayError::from(error))
        })?;

        slog::trace!(self.logger, "Transaction enqueued";
            "tx" => %tx_id,
            "queue_len" => self.handle.queue_len(),
        );
        Ok(Response::new(proto::Empty {}))
    }
}
