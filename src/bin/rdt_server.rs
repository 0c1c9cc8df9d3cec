use std::process::ExitCode;

use log::error;

use netlab::rdt::{RdtServer, RdtServerConfig};

fn usage() -> ! {
    eprintln!("Usage: rdt_server <host> <port> <drop_rate>");
    std::process::exit(2);
}

fn parse_args() -> RdtServerConfig {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 3 {
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

    let drop_rate: f64 = match args[2].parse() {
        Ok(r) if (0.0..=1.0).contains(&r) => r,
        _ => {
            eprintln!("drop_rate must be in [0.0, 1.0]");
            usage();
        }
    };

    RdtServerConfig {
        host,
        port,
        drop_rate,
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let config = parse_args();

    let mut server = match RdtServer::bind(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("bind failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    match server.run(|| true) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("server loop failed: {e}");
            ExitCode::FAILURE
        }
    }
}
