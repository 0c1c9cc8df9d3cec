//! Reverse-chunk RPC: length-prefixed request/response over a TCP stream.

pub mod client;
pub mod message;
pub mod server;

pub use client::RrpcClientConfig;
pub use server::RrpcServerConfig;
