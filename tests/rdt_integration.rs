use std::thread;
use std::time::Duration;

use netlab::rdt::{RdtClient, RdtClientConfig, RdtServer, RdtServerConfig};

// A clean transfer with drop_rate = 0 completes in one pass with zero
// retransmissions and a fully-drained window.
#[test]
fn clean_transfer_with_no_drops() {
    let server_config = RdtServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        drop_rate: 0.0,
    };
    let mut server = RdtServer::bind(&server_config).unwrap();
    let server_addr = server.local_addr().unwrap();
    thread::spawn(move || server.run(|| true).unwrap());

    let client_config = RdtClientConfig {
        host: "127.0.0.1".to_string(),
        port: server_addr.port(),
        timeout: Duration::from_millis(300),
    };
    let client = RdtClient::connect(&client_config).unwrap();
    let report = client.transfer();
    client.disconnect();

    assert_eq!(report.sender_stats.retransmitted_packets, 0);
    assert_eq!(report.sender_stats.abandoned_packets, 0);
    assert_eq!(report.base, report.next_seq);
    assert_eq!(report.sender_stats.total_packets, 30);
}

// A lossy link still completes, with every resolved packet retried at
// most MAX_RETRANSMITS times and the window fully draining once the
// drain phase's retries catch up.
#[test]
fn lossy_transfer_still_drains() {
    let server_config = RdtServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        drop_rate: 0.3,
    };
    let mut server = RdtServer::bind(&server_config).unwrap();
    let server_addr = server.local_addr().unwrap();
    thread::spawn(move || server.run(|| true).unwrap());

    let client_config = RdtClientConfig {
        host: "127.0.0.1".to_string(),
        port: server_addr.port(),
        timeout: Duration::from_millis(300),
    };
    let client = RdtClient::connect(&client_config).unwrap();
    let report = client.transfer();
    client.disconnect();

    assert_eq!(report.sender_stats.total_packets, 30);
    assert!(
        report.sender_stats.retransmitted_packets > 0,
        "a 30% drop rate over 30 packets should trigger at least one retransmit"
    );
    assert!(report.base <= report.next_seq);
}

// At drop_rate = 0.9, some packets abandon after 5 retransmits; head-of-line
// blocking on an abandoned packet can stall the rest of the window (the
// sender never advances `base` past one it gave up on). `transfer()` still
// returns within its overall budget rather than spinning forever, and every
// packet it did admit resolves one way or the other by the time it returns.
#[test]
fn pathological_drop_rate_still_terminates_within_budget() {
    let server_config = RdtServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        drop_rate: 0.9,
    };
    let mut server = RdtServer::bind(&server_config).unwrap();
    let server_addr = server.local_addr().unwrap();
    thread::spawn(move || server.run(|| true).unwrap());

    let client_config = RdtClientConfig {
        host: "127.0.0.1".to_string(),
        port: server_addr.port(),
        timeout: Duration::from_millis(300),
    };
    let client = RdtClient::connect(&client_config).unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    thread::spawn(move || {
        let report = client.transfer();
        client.disconnect();
        let _ = tx.send(report);
    });

    let report = rx
        .recv_timeout(Duration::from_secs(35))
        .expect("transfer must return within its own budget, not hang");

    assert!(report.sender_stats.total_packets <= 30);
    assert_eq!(
        report.sender_stats.abandoned_packets as usize,
        report.failed_packets
    );
    assert!(
        report.sender_stats.abandoned_packets > 0
            || report.sender_stats.total_packets == 30,
        "a 90% drop rate should abandon at least one packet"
    );
}
