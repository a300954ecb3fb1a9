//! Ordering loop: drains the intake queue on a timer tick or threshold
//! trigger and publishes height-stamped proposals to every configured peer.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use slog::Logger;
use tokio::sync::Notify;
use tokio::task::{JoinHandle, JoinSet};

use mst::model::Transaction;

use crate::error::OrderingError;
use crate::proposal::Proposal;
use crate::queue::TransactionQueue;
use crate::sink::{PeerTable, ProposalSink};

/// How long shutdown waits for in-flight peer dispatches before dropping
/// them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Construction parameters for the ordering service.
#[derive(Debug, Clone)]
pub struct OrderingConfig {
    /// Maximum transactions per proposal; reaching this many buffered
    /// transactions also triggers an early proposal
    pub max_size: usize,
    /// Proposal cadence. The loop fires at least this often while the
    /// buffer is non-empty. A zero delay is clamped to a 1 ms tick
    pub delay: Duration,
    /// Intake queue capacity; at least `max_size`
    pub queue_capacity: usize,
    /// Height assigned to the first emitted proposal. Checkpoint-restoring
    /// collaborators set this at construction
    pub initial_height: u64,
    /// Whether remaining buffered transactions form a final proposal on
    /// shutdown, or are dropped and counted
    pub flush_on_shutdown: bool,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            delay: Duration::from_millis(500),
            queue_capacity: 10_000,
            initial_height: 1,
            flush_on_shutdown: true,
        }
    }
}

/// Cumulative service counters, shared lock-free with observers.
#[derive(Debug, Default)]
pub struct OrderingStats {
    proposals_emitted: AtomicU64,
    transactions_ordered: AtomicU64,
    dispatch_failures: AtomicU64,
    dropped_on_shutdown: AtomicU64,
}

impl OrderingStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            proposals_emitted: self.proposals_emitted.load(Ordering::Relaxed),
            transactions_ordered: self.transactions_ordered.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            dropped_on_shutdown: self.dropped_on_shutdown.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`OrderingStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub proposals_emitted: u64,
    pub transactions_ordered: u64,
    pub dispatch_failures: u64,
    pub dropped_on_shutdown: u64,
}

/// Cloneable ingress endpoint handed to transport handlers.
#[derive(Clone)]
pub struct OrderingHandle {
    queue: Arc<TransactionQueue>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<OrderingStats>,
}

impl OrderingHandle {
    /// Enqueues a fully-signed transaction for inclusion in a future
    /// proposal. Never blocks; fails when the buffer is at capacity or the
    /// service is tearing down.
    pub fn submit(&self, tx: Transaction) -> Result<(), OrderingError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(OrderingError::ShuttingDown);
        }
        self.queue.push(tx)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
}

/// Ordering service: owns the loop task, the intake queue, and the peer
/// dispatch table.
pub struct OrderingService {
    shutdown: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
    stats: Arc<OrderingStats>,
}

impl OrderingService {
    /// Spawns the ordering loop on the current tokio runtime and returns the
    /// service alongside the ingress handle for transport threads.
    pub fn spawn(config: OrderingConfig, peers: PeerTable, logger: Logger) -> (Self, OrderingHandle) {
        assert!(config.max_size > 0, "proposal size must be positive");

        let queue = Arc::new(TransactionQueue::new(config.queue_capacity, config.max_size));
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_notify = Arc::new(Notify::new());
        let stats = Arc::new(OrderingStats::default());

        let handle = tokio::spawn(ordering_loop(
            config,
            peers,
            Arc::clone(&queue),
            Arc::clone(&shutdown),
            Arc::clone(&shutdown_notify),
            Arc::clone(&stats),
            logger,
        ));

        let ingress = OrderingHandle {
            queue,
            shutdown: Arc::clone(&shutdown),
            stats: Arc::clone(&stats),
        };
        let service = Self {
            shutdown,
            shutdown_notify,
            handle: Some(handle),
            stats,
        };
        (service, ingress)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Stops the loop, applies the shutdown drain policy, and waits for
    /// in-flight dispatches within the grace period.
    pub async fn shutdown(mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.shutdown_notify.notify_one();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for OrderingService {
    fn drop(&mut self) {
        // Best effort when dropped without an explicit shutdown: the loop
        // observes the flag and winds itself down.
        self.shutdown.store(true, Ordering::Release);
        self.shutdown_notify.notify_one();
    }
}

async fn ordering_loop(
    config: OrderingConfig,
    peers: PeerTable,
    queue: Arc<TransactionQueue>,
    shutdown: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
    stats: Arc<OrderingStats>,
    logger: Logger,
) {
    // tokio intervals reject a zero period.
    let period = config.delay.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    // The height counter lives on the loop task only.
    let mut next_height = config.initial_height;
    let mut in_flight = JoinSet::new();

    slog::info!(logger, "Ordering service started";
        "max_size" => config.max_size,
        "delay_ms" => period.as_millis() as u64,
        "peer_count" => peers.len(),
        "initial_height" => config.initial_height,
    );

    while !shutdown.load(Ordering::Acquire) {
        tokio::select! {
            biased;

            _ = shutdown_notify.notified() => break,
            _ = ticker.tick() => {}
            _ = queue.wait_full() => {}
        }

        // Reap finished dispatch tasks without blocking the loop.
        while in_flight.try_join_next().is_some() {}

        let transactions = queue.drain(config.max_size);
        if transactions.is_empty() {
            continue;
        }
        let proposal = Proposal {
            height: next_height,
            created_at: mst::model::now_ms(),
            transactions,
        };
        next_height += 1;
        publish(&peers, proposal, &mut in_flight, &stats, &logger);
    }

    // Whatever producers managed to enqueue before the shutdown flag went
    // up either forms final proposals or is dropped and counted.
    loop {
        let remainder = queue.drain(config.max_size);
        if remainder.is_empty() {
            break;
        }
        if config.flush_on_shutdown {
            let proposal = Proposal {
                height: next_height,
                created_at: mst::model::now_ms(),
                transactions: remainder,
            };
            next_height += 1;
            publish(&peers, proposal, &mut in_flight, &stats, &logger);
        } else {
            stats
                .dropped_on_shutdown
                .fetch_add(remainder.len() as u64, Ordering::Relaxed);
        }
    }

    let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while in_flight.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        slog::warn!(logger, "Shutdown grace period elapsed with dispatches still in flight");
    }
    slog::info!(logger, "Ordering service stopped"; "next_height" => next_height);
}

/// Fire-and-forget dispatch to every peer. Per-peer failures are logged and
/// counted; they never abort publication to the remaining peers.
fn publish(
    peers: &PeerTable,
    proposal: Proposal,
    in_flight: &mut JoinSet<()>,
    stats: &Arc<OrderingStats>,
    logger: &Logger,
) {
    let tx_count = proposal.transactions.len();
    stats.proposals_emitted.fetch_add(1, Ordering::Relaxed);
    stats
        .transactions_ordered
        .fetch_add(tx_count as u64, Ordering::Relaxed);
    slog::debug!(logger, "Publishing proposal";
        "height" => proposal.height,
        "tx_count" => tx_count,
        "peer_count" => peers.len(),
    );

    let proposal = Arc::new(proposal);
    for (address, sink) in peers {
        let address = address.clone();
        let sink = Arc::clone(sink);
        let proposal = Arc::clone(&proposal);
        let stats = Arc::clone(stats);
        let logger = logger.clone();
        in_flight.spawn(async move {
            if let Err(error) = sink.on_proposal(&proposal).await {
                stats.dispatch_failures.fetch_add(1, Ordering::Relaxed);
                slog::warn!(logger, "Proposal dispatch failed";
                    "peer" => address,
                    "height" => proposal.height,
                    "error" => %error,
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::sink::ProposalSink;
    use mst::model::{PublicKey, Transaction};

    fn test_logger() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    fn tx(tag: u8) -> Transaction {
        Transaction::new(PublicKey([tag; 32]), 1_000, 1, vec![tag])
    }

    #[derive(Default)]
    struct CollectingSink {
        received: Mutex<Vec<Proposal>>,
    }

    impl CollectingSink {
        fn heights(&self) -> Vec<u64> {
            self.received.lock().unwrap().iter().map(|p| p.height).collect()
        }

        fn sizes(&self) -> Vec<usize> {
            self.received
                .lock()
                .unwrap()
                .iter()
                .map(|p| p.transactions.len())
                .collect()
        }
    }

    #[async_trait]
    impl ProposalSink for CollectingSink {
        async fn on_proposal(&self, proposal: &Proposal) -> anyhow::Result<()> {
            self.received.lock().unwrap().push(proposal.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl ProposalSink for FailingSink {
        async fn on_proposal(&self, _proposal: &Proposal) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    fn config(max_size: usize, delay: Duration) -> OrderingConfig {
        OrderingConfig {
            max_size,
            delay,
            queue_capacity: 100,
            initial_height: 1,
            flush_on_shutdown: true,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fire_emits_partial_proposal() {
        let sink = Arc::new(CollectingSink::default());
        let peers: PeerTable = vec![("peer-a".into(), sink.clone())];
        let (service, handle) = OrderingService::spawn(
            config(3, Duration::from_millis(100)),
            peers,
            test_logger(),
        );

        handle.submit(tx(1)).unwrap();
        handle.submit(tx(2)).unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(sink.heights(), vec![1]);
        assert_eq!(sink.sizes(), vec![2]);
        service.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn full_buffer_fires_before_the_timer() {
        let sink = Arc::new(CollectingSink::default());
        let peers: PeerTable = vec![("peer-a".into(), sink.clone())];
        // Timer far in the future: only the threshold can trigger emission.
        let (service, handle) = OrderingService::spawn(
            config(3, Duration::from_secs(3600)),
            peers,
            test_logger(),
        );
        // Let the loop pass its immediate first tick before filling up.
        tokio::time::sleep(Duration::from_millis(10)).await;

        for tag in 0..3 {
            handle.submit(tx(tag)).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(sink.heights(), vec![1]);
        assert_eq!(sink.sizes(), vec![3]);
        service.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn heights_increase_strictly() {
        let sink = Arc::new(CollectingSink::default());
        let peers: PeerTable = vec![("peer-a".into(), sink.clone())];
        let (service, handle) = OrderingService::spawn(
            config(2, Duration::from_millis(100)),
            peers,
            test_logger(),
        );

        for round in 0..3 {
            handle.submit(tx(round)).unwrap();
            tokio::time::sleep(Duration::from_millis(150)).await;
        }

        assert_eq!(sink.heights(), vec![1, 2, 3]);
        service.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn initial_height_is_honored() {
        let sink = Arc::new(CollectingSink::default());
        let peers: PeerTable = vec![("peer-a".into(), sink.clone())];
        let mut cfg = config(2, Duration::from_millis(100));
        cfg.initial_height = 42;
        let (service, handle) = OrderingService::spawn(cfg, peers, test_logger());

        handle.submit(tx(1)).unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(sink.heights(), vec![42]);
        service.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn empty_ticks_emit_nothing() {
        let sink = Arc::new(CollectingSink::default());
        let peers: PeerTable = vec![("peer-a".into(), sink.clone())];
        let (service, _handle) = OrderingService::spawn(
            config(3, Duration::from_millis(50)),
            peers,
            test_logger(),
        );

        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(sink.heights().is_empty());
        assert_eq!(service.stats().proposals_emitted, 0);
        service.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failing_peer_does_not_starve_healthy_peer() {
        let healthy = Arc::new(CollectingSink::default());
        let peers: PeerTable = vec![
            ("peer-dead".into(), Arc::new(FailingSink)),
            ("peer-live".into(), healthy.clone()),
        ];
        let (service, handle) = OrderingService::spawn(
            config(1, Duration::from_millis(50)),
            peers,
            test_logger(),
        );

        for round in 0..3 {
            handle.submit(tx(round)).unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        assert_eq!(healthy.heights(), vec![1, 2, 3]);
        let stats = service.stats();
        assert_eq!(stats.proposals_emitted, 3);
        assert_eq!(stats.dispatch_failures, 3);
        service.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_flushes_the_remainder() {
        let sink = Arc::new(CollectingSink::default());
        let peers: PeerTable = vec![("peer-a".into(), sink.clone())];
        // Timer never fires within the test.
        let (service, handle) = OrderingService::spawn(
            config(10, Duration::from_secs(3600)),
            peers,
            test_logger(),
        );
        tokio::time::sleep(Duration::from_millis(10)).await;

        handle.submit(tx(1)).unwrap();
        handle.submit(tx(2)).unwrap();
        service.shutdown().await;

        assert_eq!(sink.sizes(), vec![2]);
        assert_eq!(handle.stats().dropped_on_shutdown, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_discards_when_flush_is_off() {
        let sink = Arc::new(CollectingSink::default());
        let peers: PeerTable = vec![("peer-a".into(), sink.clone())];
        let mut cfg = config(10, Duration::from_secs(3600));
        cfg.flush_on_shutdown = false;
        let (service, handle) = OrderingService::spawn(cfg, peers, test_logger());
        tokio::time::sleep(Duration::from_millis(10)).await;

        handle.submit(tx(1)).unwrap();
        handle.submit(tx(2)).unwrap();
        service.shutdown().await;

        assert!(sink.heights().is_empty());
        assert_eq!(handle.stats().dropped_on_shutdown, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ingress_is_refused_during_teardown() {
        let peers: PeerTable = Vec::new();
        let (service, handle) =
            OrderingService::spawn(config(3, Duration::from_millis(50)), peers, test_logger());

        service.shutdown().await;

        assert_eq!(handle.submit(tx(1)), Err(OrderingError::ShuttingDown));
    }
}
