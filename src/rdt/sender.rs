use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use super::rtt::RttEstimator;

pub const WINDOW_BYTES: u32 = 400;

// Transmitted at most MAX_RETRANSMITS + 1 times total before we give up on it.
pub const MAX_RETRANSMITS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Closed,
    SynSent,
    Established,
    FinWait,
}

#[derive(Debug, Clone)]
pub struct OutstandingPacket {
    pub packet_id: u64,
    pub payload: Vec<u8>,
    pub start_byte: u32,
    pub end_byte: u32,
    pub send_time: Instant,
    pub retransmit_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    Accepted,
    Refused,
}

#[derive(Debug, Clone)]
pub struct Resend {
    pub packet_id: u64,
    pub seq: u32,
    pub payload: Vec<u8>,
    pub retransmit_count: u32,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SenderStats {
    pub total_packets: u64,
    pub retransmitted_packets: u64,
    pub abandoned_packets: u64,
}

// Owns no socket; callers drive send_packet/on_ack/retransmit_due and do the actual I/O.
#[derive(Debug)]
pub struct Sender {
    pub iss: u32,
    pub base: u32,
    pub next_seq: u32,
    pub state: ConnState,
    outstanding: BTreeMap<u32, OutstandingPacket>,
    rtt: RttEstimator,
    stats: SenderStats,
}

impl Sender {
    pub fn new(iss: u32) -> Self {
        Sender {
            iss,
            base: iss,
            next_seq: iss,
            state: ConnState::Closed,
            outstanding: BTreeMap::new(),
            rtt: RttEstimator::new(),
            stats: SenderStats::default(),
        }
    }

    pub fn rto(&self) -> Duration {
        self.rtt.rto()
    }

    pub fn sample_count(&self) -> usize {
        self.rtt.sample_count()
    }

    pub fn stats(&self) -> SenderStats {
        self.stats
    }

    pub fn inflight_bytes(&self) -> u32 {
        self.next_seq - self.base
    }

    pub fn is_drained(&self) -> bool {
        self.outstanding.is_empty()
    }

    pub fn send_packet(&mut self, packet_id: u64, payload: Vec<u8>, now: Instant) -> AdmitOutcome {
        let len = payload.len() as u32;
        if self.inflight_bytes() + len > WINDOW_BYTES {
            return AdmitOutcome::Refused;
        }

        let start = self.next_seq;
        let end = start + len.saturating_sub(1);

        self.outstanding.insert(
            start,
            OutstandingPacket {
                packet_id,
                payload,
                start_byte: start,
                end_byte: end,
                send_time: now,
                retransmit_count: 0,
            },
        );

        self.next_seq += len;
        self.stats.total_packets += 1;

        AdmitOutcome::Accepted
    }

    // Cumulative ACK: retires every outstanding packet the ack fully covers and
    // samples RTT for each, even ones that were retransmitted.
    pub fn on_ack(&mut self, ack_num: u32, now: Instant) {
        if ack_num < self.base {
            return; // stale, ignore
        }

        self.base = ack_num;

        let retired: Vec<u32> = self
            .outstanding
            .iter()
            .filter(|(_, p)| p.end_byte < ack_num)
            .map(|(seq, _)| *seq)
            .collect();

        for seq in retired {
            if let Some(p) = self.outstanding.remove(&seq) {
                let rtt_ms = now.duration_since(p.send_time).as_secs_f64() * 1000.0;
                self.rtt.sample(rtt_ms);
            }
        }
    }

    // Resends anything older than rto; drops a packet for good once it has been
    // retransmitted MAX_RETRANSMITS times. Does not move base, so an abandoned
    // packet below base stalls the window until the connection is torn down.
    pub fn retransmit_due(&mut self, now: Instant) -> Vec<Resend> {
        let rto = self.rtt.rto();
        let due: Vec<u32> = self
            .outstanding
            .iter()
            .filter(|(_, p)| now.duration_since(p.send_time) > rto)
            .map(|(seq, _)| *seq)
            .collect();

        let mut resends = Vec::new();
        for seq in due {
            let abandon = {
                let p = self.outstanding.get(&seq).unwrap();
                p.retransmit_count >= MAX_RETRANSMITS
            };

            if abandon {
                self.outstanding.remove(&seq);
                self.stats.abandoned_packets += 1;
                continue;
            }

            let p = self.outstanding.get_mut(&seq).unwrap();
            p.send_time = now;
            p.retransmit_count += 1;
            self.stats.retransmitted_packets += 1;

            resends.push(Resend {
                packet_id: p.packet_id,
                seq,
                payload: p.payload.clone(),
                retransmit_count: p.retransmit_count,
            });
        }

        resends
    }

    pub fn unresolved(&self) -> Vec<&OutstandingPacket> {
        self.outstanding.values().collect()
    }
}
