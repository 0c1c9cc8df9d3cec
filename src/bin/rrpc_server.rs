use std::process::ExitCode;

use log::error;

use netlab::rrpc::{server, RrpcServerConfig};

fn usage() -> ! {
    eprintln!("Usage: rrpc_server <port>");
    std::process::exit(2);
}

fn parse_args() -> RrpcServerConfig {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 1 {
        usage();
    }

    let port: u16 = match args[0].parse() {
        Ok(p) if (1024..=65535).contains(&p) => p,
        _ => {
            eprintln!("port must be in [1024, 65535]");
            usage();
        }
    };

    RrpcServerConfig { port }
}

fn main() -> ExitCode {
    env_logger::init();
    let config = parse_args();

    match server::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("rrpc server failed: {e}");
            ExitCode::FAILURE
        }
    }
}
