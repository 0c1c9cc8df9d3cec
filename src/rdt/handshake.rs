// Pure frame builders/parsers for the handshake and teardown. No I/O here;
// callers own the socket and the timing.

use super::packet::{self, Packet, ACK, FIN, SYN};

pub fn build_syn(iss: u32) -> Vec<u8> {
    packet::encode(SYN, iss, 0, &[])
}

// Doesn't reject an unexpected ack field itself; callers log a warning and
// proceed rather than aborting the handshake over it.
pub fn parse_syn_ack(p: &Packet) -> Option<(u32, u32)> {
    if p.has(SYN) && p.has(ACK) {
        Some((p.seq, p.ack))
    } else {
        None
    }
}

pub fn build_ack(iss_client: u32, iss_server: u32) -> Vec<u8> {
    packet::encode(ACK, iss_client + 1, iss_server + 1, &[])
}

pub fn build_fin(seq: u32, ack: u32) -> Vec<u8> {
    packet::encode(FIN, seq, ack, &[])
}

pub fn parse_fin_ack(p: &Packet) -> bool {
    p.has(FIN) && p.has(ACK)
}

pub fn build_final_ack(next_seq: u32, peer_seq: u32) -> Vec<u8> {
    packet::encode(ACK, next_seq + 1, peer_seq + 1, &[])
}
