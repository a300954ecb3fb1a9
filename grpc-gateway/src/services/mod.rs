//! gRPC service implementations.

mod gate;
mod ordering;

pub use gate::OrderingGateImpl;
pub use ordering::OrderingServiceImpl;
