use std::path::PathBuf;
use std::process::ExitCode;

use log::error;

use netlab::rrpc::{client, RrpcClientConfig};

fn usage() -> ! {
    eprintln!("Usage: rrpc_client <host> <port> <Lmin> <Lmax> <input_file>");
    std::process::exit(2);
}

fn parse_args() -> RrpcClientConfig {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 5 {
        usage();
    }

    let host = args[0].clone();
    let port: u16 = match args[1].parse() {
        Ok(p) if (1024..=65535).contains(&p) => p,
        _ => {
            eprintln!("port must be in [1024, 65535]");
            usage();
        }
    };

    let l_min: u32 = args[2].parse().unwrap_or_else(|_| usage());
    let l_max: u32 = args[3].parse().unwrap_or_else(|_| usage());
    if l_min > l_max || l_max < 1 || l_max > 888 {
        eprintln!("require 0 <= Lmin <= Lmax <= 888 and Lmax >= 1");
        usage();
    }

    let input_file = PathBuf::from(&args[4]);
    if !input_file.is_file() {
        eprintln!("input_file does not exist: {}", input_file.display());
        usage();
    }

    RrpcClientConfig {
        host,
        port,
        l_min,
        l_max,
        input_file,
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let config = parse_args();

    match client::run(&config) {
        Ok(path) => {
            println!("wrote {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("rrpc client failed: {e}");
            ExitCode::FAILURE
        }
    }
}
