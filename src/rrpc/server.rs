use std::net::{TcpListener, TcpStream};
use std::thread;

use log::{info, warn};

use crate::err::RrpcError;

use super::message::{self, Message, AGREE, REVERSE_ANSWER, REVERSE_REQUEST};

#[derive(Debug, Clone)]
pub struct RrpcServerConfig {
    pub port: u16,
}

// Listener thread plus one worker thread per accepted connection; workers
// share no state.
pub fn run(config: &RrpcServerConfig) -> Result<(), RrpcError> {
    let listener = TcpListener::bind(("0.0.0.0", config.port))?;
    info!("rrpc server listening on {}", config.port);
    run_on(listener)
}

// Same accept loop as `run`, over an already-bound listener: lets tests
// bind to an OS-assigned port and read it back before accepting.
pub fn run_on(listener: TcpListener) -> Result<(), RrpcError> {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                thread::spawn(move || {
                    let peer = stream
                        .peer_addr()
                        .map(|a| a.to_string())
                        .unwrap_or_else(|_| "<unknown>".to_string());
                    if let Err(e) = handle_client(stream) {
                        warn!("connection {peer} ended with error: {e}");
                    }
                });
            }
            Err(e) => warn!("accept failed: {e}"),
        }
    }

    Ok(())
}

fn handle_client(mut stream: TcpStream) -> Result<(), RrpcError> {
    let chunks_num = message::read_initialization(&mut stream)?;
    info!("client requests {chunks_num} chunk(s)");

    message::write_message(&mut stream, &Message::new(AGREE, vec![]))?;

    for _ in 0..chunks_num {
        let req = message::read_message(&mut stream)?;
        if req.msg_type != REVERSE_REQUEST {
            return Err(RrpcError::UnexpectedType(req.msg_type));
        }
        message::validate_ascii(&req.payload)?;

        let mut reversed = req.payload.clone();
        reversed.reverse();

        message::write_message(&mut stream, &Message::new(REVERSE_ANSWER, reversed))?;
    }

    Ok(())
}
