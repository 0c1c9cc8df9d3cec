use std::process::ExitCode;
use std::time::Duration;

use log::error;

use netlab::rdt::{RdtClient, RdtClientConfig};

fn usage() -> ! {
    eprintln!("Usage: rdt_client <host> <port> [timeout_ms]");
    std::process::exit(2);
}

fn parse_args() -> RdtClientConfig {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 || args.len() > 3 {
        usage();
    }

    let host = args[0].clone();
    if host != "localhost" && host.parse::<std::net::Ipv4Addr>().is_err() {
        eprintln!("invalid host: {host}");
        usage();
    }

    let port: u16 = match args[1].parse() {
        Ok(p) if (1024..=65535).contains(&p) => p,
        _ => {
            eprintln!("port must be in [1024, 65535]");
            usage();
        }
    };

    let timeout = match args.get(2) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(ms) if (1..=10000).contains(&ms) => Duration::from_millis(ms),
            _ => {
                eprintln!("timeout_ms must be in [1, 10000]");
                usage();
            }
        },
        None => Duration::from_millis(300),
    };

    RdtClientConfig {
        host,
        port,
        timeout,
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let config = parse_args();

    let client = match RdtClient::connect(&config) {
        Ok(c) => c,
        Err(e) => {
            error!("connect failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let report = client.transfer();
    println!(
        "total={} retransmitted={} abandoned={} bytes_sent={} base={} next_seq={} final_rto={:?}",
        report.sender_stats.total_packets,
        report.sender_stats.retransmitted_packets,
        report.sender_stats.abandoned_packets,
        report.total_bytes_sent,
        report.base,
        report.next_seq,
        report.final_rto,
    );

    client.disconnect();
    ExitCode::SUCCESS
}
