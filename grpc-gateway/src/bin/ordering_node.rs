//! Ordering node entry point: loads configuration, builds the logger, and
//! serves the gateway until interrupted.

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use slog::{Drain, Level, Logger};

use grpc_gateway::{GatewayConfig, GatewayServer};

#[derive(Parser)]
#[command(name = "ordering-node", about = "Multi-signature ordering node")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "ordering.toml")]
    config: PathBuf,
}

fn create_logger() -> Logger {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|env_str| Level::from_str(&env_str).ok())
        .unwrap_or(Level::Info);

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain)
        .build()
        .fuse()
        .filter_level(log_level)
        .fuse();

    Logger::root(drain, slog::o!())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let logger = create_logger();
    let config = GatewayConfig::load(&args.config)?;

    // Proposals published by peers land here; with no consensus engine
    // attached, the node just records them.
    let (proposal_tx, mut proposal_rx) = tokio::sync::mpsc::channel::<ordering::Proposal>(64);
    let consumer_logger = logger.new(slog::o!("component" => "consensus-input"));
    tokio::spawn(async move {
        while let Some(proposal) = proposal_rx.recv().await {
            slog::info!(consumer_logger, "Proposal ready for consensus";
                "height" => proposal.height,
                "tx_count" => proposal.transactions.len(),
            );
        }
    });

    let server = GatewayServer::new(config, logger.clone());
    server
        .serve(proposal_tx, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
