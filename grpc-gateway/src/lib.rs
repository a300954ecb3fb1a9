//! gRPC surface for the ordering service.
//!
//! This crate wires the transport boundary around the `ordering` core:
//! - `SendTransaction` ingress, converting wire transactions into the model
//!   and enqueueing them for proposal formation
//! - per-peer `OnProposal` client stubs implementing the core's
//!   [`ordering::ProposalSink`] seam
//! - configuration loading and server assembly

pub mod config;
pub mod conversions;
pub mod error;
pub mod peers;
pub mod server;
pub mod services;

/// Generated protobuf code from tonic-build.
/// This module is populated by the build.rs script.
#[allow(clippy::all)]
#[allow(clippy::pedantic)]
pub mod proto {
    tonic::include_proto!("ordering.v1");
}

// Re-export key types for convenience
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use server::GatewayServer;
