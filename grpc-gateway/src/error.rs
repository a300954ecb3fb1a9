//! Error types for the gRPC API.

use thiserror::Error;
use tonic::Status;

use ordering::OrderingError;

/// Errors that can occur while handling inbound RPCs.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Wire payload failed conversion into the model
    #[error("invalid transaction encoding: {0}")]
    Decode(String),

    /// Intake queue at capacity; the transaction was dropped
    #[error("transaction queue is full")]
    QueueFull,

    /// The node is tearing down
    #[error("ordering service is shutting down")]
    ShuttingDown,
}

impl From<OrderingError> for GatewayError {
    fn from(err: OrderingError) -> Self {
        match err {
            OrderingError::QueueFull => GatewayError::QueueFull,
            OrderingError::ShuttingDown => GatewayError::ShuttingDown,
        }
    }
}

impl From<GatewayError> for Status {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Decode(msg) => {
                Status::invalid_argument(format!("invalid transaction encoding: {msg}"))
            }
            GatewayError::QueueFull => Status::resource_exhausted(err.to_string()),
            GatewayError::ShuttingDown => Status::unavailable(err.to_string()),
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn errors_map_to_the_documented_status_codes() {
        let decode: Status = GatewayError::Decode("creator must be 32 bytes".into()).into();
        assert_eq!(decode.code(), Code::InvalidArgument);

        let full: Status = GatewayError::from(OrderingError::QueueFull).into();
        assert_eq!(full.code(), Code::ResourceExhausted);

        let down: Status = GatewayError::from(OrderingError::ShuttingDown).into();
        assert_eq!(down.code(), Code::Unavailable);
    }
}
