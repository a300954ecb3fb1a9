//! Gateway configuration.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use mst::completer::{DefaultCompleter, SharedCompleter};
use ordering::OrderingConfig;

/// Configuration for the ordering gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address to listen on (e.g., "0.0.0.0:50051")
    #[serde(with = "socket_addr_serde")]
    pub listen_addr: SocketAddr,
    /// Maximum number of transactions per proposal
    pub max_size: usize,
    /// Proposal cadence in milliseconds
    pub delay_ms: u64,
    /// Intake queue capacity
    pub queue_capacity: usize,
    /// Height assigned to the first proposal; checkpoint-restoring
    /// collaborators override this
    pub initial_height: u64,
    /// Whether buffered transactions form a final proposal on shutdown
    pub flush_on_shutdown: bool,
    /// Multi-signature batch TTL in milliseconds
    pub mst_ttl_ms: u64,
    /// Consensus peers receiving proposals (e.g., "http://peer-a:50051")
    pub peers: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:50051".parse().unwrap(),
            max_size: 10,
            delay_ms: 500,
            queue_capacity: 10_000,
            initial_height: 1,
            flush_on_shutdown: true,
            mst_ttl_ms: 24 * 60 * 60 * 1000,
            peers: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file. Environment variables with the
    /// `ORDERING_` prefix override file values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config: GatewayConfig = Figment::from(Serialized::defaults(GatewayConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("ORDERING_"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Sanity checks that cannot be expressed in the type system.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.max_size > 0, "max_size must be positive");
        anyhow::ensure!(
            self.queue_capacity >= self.max_size,
            "queue_capacity ({}) must be at least max_size ({})",
            self.queue_capacity,
            self.max_size,
        );
        Ok(())
    }

    /// The ordering-service slice of this configuration.
    pub fn ordering(&self) -> OrderingConfig {
        OrderingConfig {
            max_size: self.max_size,
            delay: Duration::from_millis(self.delay_ms),
            queue_capacity: self.queue_capacity,
            initial_height: self.initial_height,
            flush_on_shutdown: self.flush_on_shutdown,
        }
    }

    /// The completer handed to the node's multi-signature processor, with
    /// the TTL policy taken from configuration.
    pub fn mst_completer(&self) -> SharedCompleter {
        Arc::new(DefaultCompleter::new(self.mst_ttl_ms))
    }
}

mod socket_addr_serde {
    use std::net::SocketAddr;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(addr: &SocketAddr, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&addr.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SocketAddr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
