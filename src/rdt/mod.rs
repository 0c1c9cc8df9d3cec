//! Reliable datagram transport: a connection-oriented, sliding-window
//! reliable delivery layer over UDP.

pub mod client;
pub mod handshake;
pub mod packet;
pub mod rtt;
pub mod sender;
pub mod server;

pub use client::{RdtClient, RdtClientConfig, TransferReport};
pub use server::{RdtServer, RdtServerConfig};
