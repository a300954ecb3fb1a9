
use std::time::Duration;

use tonic::Code;

use grpc_gateway::peers::build_peer_table;
use ordering::OrderingConfig;
use test_helpers::{spawn_gate, wait_until, wire_transaction, TestServer};

/// Config whose timer never fires within a test, so the queue is observable.
fn parked_config() -> OrderingConfig {
    OrderingConfig {
        max_size: 100,
        delay: Duration::from_secs(3600),
        queue_capacity: 1_000,
        initial_height: 1,
        flush_on_shutdown: false,
    }
}

#[tokio::test]
async fn valid_transaction_is_accepted_and_queued() {
    let server = TestServer::spawn(parked_config(), Vec::new()).await;
    // Let the loop pass its immediate first tick before submitting.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let mut client = server.client().await;

    client
        .send_transaction(wire_transaction(1, 2))
        .await
        .expect("accepted");

    assert_eq!(server.handle.queue_len(), 1);
}

#[tokio::test]
async fn malformed_creator_is_invalid_argument() {
    let server = TestServer::spawn(parked_config(), Vec::new()).await;
    let mut client = server.client().await;

    let mut wire = wire_transaction(1, 2);
    wire.creator = vec![1, 2, 3];

    let status = client.send_transaction(wire).await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(status.message().contains("creator"));
}

#[tokio::test]
async fn zero_quorum_is_invalid_argument() {
    let server = TestServer::spawn(parked_config(), Vec::new()).await;
    let mut client = server.client().await;

    let status = client
        .send_transaction(wire_transaction(1, 0))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn ingress_is_unavailable_during_teardown() {
    let server = TestServer::spawn(parked_config(), Vec::new()).await;
    let mut client = server.client().await;

    server.service.shutdown().await;

    let status = client
        .send_transaction(wire_transaction(1, 2))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unavailable);
}

#[tokio::test]
async fn proposals_reach_the_configured_gate() {
    let (gate_addr, gate) = spawn_gate().await;
    let peers = build_peer_table(&[format!("http://{gate_addr}")]).unwrap();

    let config = OrderingConfig {
        max_size: 2,
        delay: Duration::from_millis(50),
        queue_capacity: 100,
        initial_height: 1,
        flush_on_shutdown: false,
    };
    let server = TestServer::spawn(config, peers).await;
    let mut client = server.client().await;

    client.send_transaction(wire_transaction(1, 2)).await.unwrap();
    client.send_transaction(wire_transaction(2, 2)).await.unwrap();

    // The pair may come out as one proposal or straddle a tick; either way
    // both transactions must arrive and heights start at 1.
    wait_until(Duration::from_secs(5), || {
        let proposals = gate.proposals.lock().unwrap();
        proposals.iter().map(|p| p.transactions.len()).sum::<usize>() == 2
    })
    .await;

    let proposals = gate.proposals.lock().unwrap().clone();
    assert_eq!(proposals[0].height, 1);
    assert!(proposals.iter().all(|p| p.transactions.len() <= 2));
}

#[tokio::test]
async fn dead_peer_does_not_starve_the_healthy_one() {
    let (gate_addr, gate) = spawn_gate().await;
    // Nothing listens on the first address; every dispatch to it fails.
    let peers = build_peer_table(&[
        "http://127.0.0.1:1".to_string(),
        format!("http://{gate_addr}"),
    ])
    .unwrap();

    let config = OrderingConfig {
        max_size: 1,
        delay: Duration::from_millis(50),
        queue_capacity: 100,
        initial_height: 1,
        flush_on_shutdown: false,
    };
    let server = TestServer::spawn(config, peers).await;
    let mut client = server.client().await;

    for tag in 1..=3u8 {
        client.send_transaction(wire_transaction(tag, 2)).await.unwrap();
        wait_until(Duration::from_secs(5), || gate.heights().len() >= tag as usize).await;
    }

    assert_eq!(gate.heights(), vec![1, 2, 3]);
    wait_until(Duration::from_secs(5), || {
        server.handle.stats().dispatch_failures >= 3
    })
    .await;
}
