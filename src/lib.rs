pub mod err;
pub use err::*;

pub mod rdt;
pub mod rrpc;
