#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Framer(#[from] FramerError),

    #[error(transparent)]
    Rdt(#[from] RdtError),

    #[error(transparent)]
    Rrpc(#[from] RrpcError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while decoding a wire packet.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Copy)]
pub enum FramerError {
    #[error("packet shorter than the 11-byte header ({0} bytes)")]
    TooShort(usize),

    #[error("declared payload length {declared} does not match remaining bytes {actual}")]
    LengthMismatch { declared: u16, actual: usize },
}

// Only handshake timeout and unrecoverable socket errors reach the caller;
// everything past that point is logged and handled locally.
#[derive(Debug, thiserror::Error)]
pub enum RdtError {
    #[error("handshake timed out waiting for SYN|ACK from {0}")]
    HandshakeTimeout(std::net::SocketAddr),

    #[error("received malformed response during handshake")]
    HandshakeMalformed,

    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),
}

// Errors raised by the RRPC framing layer.
#[derive(Debug, thiserror::Error)]
pub enum RrpcError {
    #[error("connection closed before a full header was read")]
    IncompleteHeader,

    #[error("connection closed before {expected} bytes of payload were read (got {got})")]
    IncompletePayload { expected: u32, got: usize },

    #[error("unexpected message type {0}")]
    UnexpectedType(u16),

    #[error("reverse-answer length {got} did not match request length {expected}")]
    LengthMismatch { expected: u32, got: u32 },

    #[error("payload contained a non-ASCII byte")]
    NonAscii,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
