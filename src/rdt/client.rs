use std::net::{SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use rand::Rng;

use crate::err::RdtError;

use super::handshake;
use super::packet::{self, ACK, DATA};
use super::sender::{AdmitOutcome, ConnState, Sender, SenderStats};

const PAYLOAD_SIZE_RANGE: std::ops::RangeInclusive<usize> = 40..=80;
const PACKETS_TO_SEND: u32 = 30;

const PRODUCER_BACKOFF: Duration = Duration::from_millis(10);
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);
const DRAIN_TOTAL_BUDGET: Duration = Duration::from_secs(30);

const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_millis(300);
const RECV_BUF_LEN: usize = 1024;

#[derive(Debug, Clone)]
pub struct RdtClientConfig {
    pub host: String,
    pub port: u16,
    // Used only for the handshake step; the data phase's timeout tracks rto.
    pub timeout: Duration,
}

impl Default for RdtClientConfig {
    fn default() -> Self {
        RdtClientConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            timeout: DEFAULT_RECV_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransferReport {
    pub sender_stats: SenderStats,
    pub success_packets: usize,
    pub failed_packets: usize,
    pub total_bytes_sent: u32,
    pub base: u32,
    pub next_seq: u32,
    pub final_rto: Duration,
}

pub struct RdtClient {
    socket: UdpSocket,
    server_addr: SocketAddr,
    sender: Arc<Mutex<Sender>>,
    // Fixed at iss_server + 1 once established: this transfer never has the
    // server sending DATA back, so our own rcv_next never advances.
    rcv_next: u32,
}

impl RdtClient {
    // No retry at this layer: a lost SYN|ACK just fails the connection attempt.
    pub fn connect(config: &RdtClientConfig) -> Result<Self, RdtError> {
        let server_addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|_| RdtError::HandshakeMalformed)?;

        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_read_timeout(Some(config.timeout))?;

        let iss: u32 = rand::thread_rng().gen_range(1000..=9999);
        info!("connecting to {server_addr}, iss={iss}");

        socket.send_to(&handshake::build_syn(iss), server_addr)?;
        debug!("sent SYN seq={iss}");

        let mut buf = [0u8; RECV_BUF_LEN];
        let (n, _) = socket
            .recv_from(&mut buf)
            .map_err(|_| RdtError::HandshakeTimeout(server_addr))?;

        let reply = packet::decode(&buf[..n]).map_err(|_| RdtError::HandshakeMalformed)?;
        let (iss_server, ack_num) =
            handshake::parse_syn_ack(&reply).ok_or(RdtError::HandshakeMalformed)?;

        if ack_num != iss + 1 {
            warn!("unexpected ack {ack_num} in SYN|ACK, expected {}", iss + 1);
        }

        socket.send_to(&handshake::build_ack(iss, iss_server), server_addr)?;
        info!("handshake complete, iss_server={iss_server}");

        let mut sender = Sender::new(iss);
        sender.state = ConnState::Established;
        sender.base = iss + 1;
        sender.next_seq = iss + 1;

        Ok(RdtClient {
            socket,
            server_addr,
            sender: Arc::new(Mutex::new(sender)),
            rcv_next: iss_server + 1,
        })
    }

    pub fn transfer(&self) -> TransferReport {
        let receiver = self.spawn_receiver();
        // Covers admission and drain together: a peer that never acks the
        // packet currently defining `base` stalls the whole window, so the
        // producer needs the same deadline as the drain phase to avoid
        // spinning forever trying to admit packets that will never fit.
        let deadline = Instant::now() + DRAIN_TOTAL_BUDGET;

        let mut packet_id: u64 = 1;
        let mut total_bytes_sent: u32 = 0;
        let mut rng = rand::thread_rng();

        while packet_id <= PACKETS_TO_SEND as u64 {
            if Instant::now() >= deadline {
                warn!("transfer budget exhausted with {packet_id} of {PACKETS_TO_SEND} packets admitted");
                break;
            }

            let size = rng.gen_range(PAYLOAD_SIZE_RANGE);
            let payload = vec![b'X'; size];

            let admitted = {
                let mut sender = self.sender.lock().unwrap();
                let seq = sender.next_seq;
                let outcome = sender.send_packet(packet_id, payload.clone(), Instant::now());
                if outcome == AdmitOutcome::Accepted {
                    Some(seq)
                } else {
                    None
                }
            };

            match admitted {
                Some(seq) => {
                    self.send_data(seq, &payload);
                    trace!("sent packet {packet_id} seq={seq} len={size}");
                    total_bytes_sent += size as u32;
                    packet_id += 1;
                }
                None => thread::sleep(PRODUCER_BACKOFF),
            }

            self.run_retransmit_scan();
            thread::sleep(PRODUCER_BACKOFF);
        }

        self.drain_until(deadline);

        let report = {
            let sender = self.sender.lock().unwrap();
            TransferReport {
                sender_stats: sender.stats(),
                success_packets: sender.sample_count(),
                failed_packets: sender.stats().abandoned_packets as usize,
                total_bytes_sent,
                base: sender.base,
                next_seq: sender.next_seq,
                final_rto: sender.rto(),
            }
        };

        // Dropping the state out of ESTABLISHED lets the receiver thread exit.
        self.sender.lock().unwrap().state = ConnState::FinWait;
        let _ = receiver.join();

        report
    }

    pub fn disconnect(&self) {
        let (seq, ack) = {
            let sender = self.sender.lock().unwrap();
            (sender.next_seq, self.rcv_next)
        };

        info!("sending FIN seq={seq}");
        if self
            .socket
            .send_to(&handshake::build_fin(seq, ack), self.server_addr)
            .is_err()
        {
            return;
        }

        let mut buf = [0u8; RECV_BUF_LEN];
        match self.socket.recv_from(&mut buf) {
            Ok((n, _)) => {
                if let Ok(reply) = packet::decode(&buf[..n]) {
                    if handshake::parse_fin_ack(&reply) {
                        let _ = self.socket.send_to(
                            &handshake::build_final_ack(seq, reply.seq),
                            self.server_addr,
                        );
                        info!("teardown complete");
                    }
                }
            }
            Err(_) => warn!("teardown timed out, closing locally"),
        }
    }

    fn send_data(&self, seq: u32, payload: &[u8]) {
        let ack = self.rcv_next;
        let wire = packet::encode(DATA, seq, ack, payload);
        if let Err(e) = self.socket.send_to(&wire, self.server_addr) {
            warn!("send_to failed: {e}");
        }
    }

    fn run_retransmit_scan(&self) {
        let resends = {
            let mut sender = self.sender.lock().unwrap();
            sender.retransmit_due(Instant::now())
        };
        for r in resends {
            trace!(
                "retransmitting seq={} (attempt {})",
                r.seq,
                r.retransmit_count
            );
            self.send_data(r.seq, &r.payload);
        }
    }

    fn drain_until(&self, deadline: Instant) {
        loop {
            let drained = self.sender.lock().unwrap().is_drained();
            if drained || Instant::now() >= deadline {
                break;
            }
            thread::sleep(DRAIN_POLL_INTERVAL);
            self.run_retransmit_scan();
        }

        if !self.sender.lock().unwrap().is_drained() {
            let sender = self.sender.lock().unwrap();
            warn!(
                "drain budget exhausted with {} bytes unresolved",
                sender.next_seq - sender.base
            );
        }
    }

    fn spawn_receiver(&self) -> thread::JoinHandle<()> {
        let socket = self.socket.try_clone().expect("socket clone");
        let sender = self.sender.clone();

        thread::spawn(move || {
            let mut buf = [0u8; RECV_BUF_LEN];
            loop {
                if sender.lock().unwrap().state != ConnState::Established {
                    break;
                }

                match socket.recv_from(&mut buf) {
                    Ok((n, _)) => {
                        let Ok(p) = packet::decode(&buf[..n]) else {
                            continue;
                        };
                        if p.has(ACK) {
                            let new_rto = {
                                let mut sender = sender.lock().unwrap();
                                sender.on_ack(p.ack, Instant::now());
                                sender.rto()
                            };
                            let _ = socket.set_read_timeout(Some(new_rto));
                        }
                    }
                    Err(ref e)
                        if e.kind() == std::io::ErrorKind::WouldBlock
                            || e.kind() == std::io::ErrorKind::TimedOut =>
                    {
                        continue;
                    }
                    Err(_) => break,
                }
            }
        })
    }
}
