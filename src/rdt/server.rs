use std::collections::HashMap;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::Rng;

use crate::err::RdtError;

use super::packet::{self, ACK, DATA, FIN, SYN};
use super::sender::ConnState;

const RECV_BUF_LEN: usize = 1024;
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);
const RECV_POLL_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct RdtServerConfig {
    pub host: String,
    pub port: u16,
    pub drop_rate: f64,
}

// Only the fields the demultiplexer needs to decide drop/advance/ack; no
// window or retransmit bookkeeping, since the server never originates DATA.
struct PeerState {
    state: ConnState,
    iss_server: u32,
    rcv_next: u32,
    last_activity: Instant,
}

pub struct RdtServer {
    socket: UdpSocket,
    drop_rate: f64,
    peers: HashMap<SocketAddr, PeerState>,
    last_sweep: Instant,
}

impl RdtServer {
    pub fn bind(config: &RdtServerConfig) -> Result<Self, RdtError> {
        let addr = format!("{}:{}", config.host, config.port);
        let socket = UdpSocket::bind(&addr)?;
        socket.set_read_timeout(Some(RECV_POLL_TIMEOUT))?;
        info!("rdt server listening on {addr}, drop_rate={}", config.drop_rate);

        Ok(RdtServer {
            socket,
            drop_rate: config.drop_rate,
            peers: HashMap::new(),
            last_sweep: Instant::now(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    // One datagram is processed to completion before the next is read. Runs
    // until `running` goes false (checked between datagrams and after each
    // poll timeout).
    pub fn run(&mut self, running: impl Fn() -> bool) -> Result<(), RdtError> {
        let mut buf = [0u8; RECV_BUF_LEN];

        while running() {
            self.sweep_if_due();

            match self.socket.recv_from(&mut buf) {
                Ok((n, peer)) => self.handle_datagram(&buf[..n], peer),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(e) => return Err(RdtError::Socket(e)),
            }
        }

        Ok(())
    }

    fn sweep_if_due(&mut self) {
        let now = Instant::now();
        if now.duration_since(self.last_sweep) < SWEEP_INTERVAL {
            return;
        }
        self.last_sweep = now;

        let before = self.peers.len();
        self.peers
            .retain(|_, p| now.duration_since(p.last_activity) < IDLE_TIMEOUT);
        let removed = before - self.peers.len();
        if removed > 0 {
            debug!("idle sweep removed {removed} connection(s)");
        }
    }

    fn handle_datagram(&mut self, bytes: &[u8], peer: SocketAddr) {
        let packet = match packet::decode(bytes) {
            Ok(p) => p,
            Err(e) => {
                warn!("malformed packet from {peer}: {e}");
                return;
            }
        };

        if packet.has(SYN) {
            self.handle_syn(&packet, peer);
            return;
        }

        let known = self.peers.contains_key(&peer);
        if !known {
            warn!("{peer} sent {:#x} flags with no known connection, ignoring", packet.flags);
            return;
        }

        if packet.has(ACK) && !packet.has(DATA) && !packet.has(FIN) {
            self.handle_ack(&packet, peer);
        } else if packet.has(DATA) {
            self.handle_data(&packet, peer);
        } else if packet.has(FIN) {
            self.handle_fin(&packet, peer);
        } else {
            warn!("unrecognized flag combination {:#x} from {peer}", packet.flags);
        }
    }

    fn handle_syn(&mut self, packet: &super::packet::Packet, peer: SocketAddr) {
        let iss_server: u32 = rand::thread_rng().gen_range(1000..=9999);
        let rcv_next = packet.seq + 1;

        self.peers.insert(
            peer,
            PeerState {
                state: ConnState::SynSent, // reused as SYN_RECEIVED: no ESTABLISHED traffic yet
                iss_server,
                rcv_next,
                last_activity: Instant::now(),
            },
        );

        let wire = packet::encode(SYN | ACK, iss_server, rcv_next, &[]);
        if let Err(e) = self.socket.send_to(&wire, peer) {
            warn!("send_to {peer} failed: {e}");
        }
        debug!("SYN from {peer}: iss_server={iss_server} rcv_next={rcv_next}");
    }

    fn handle_ack(&mut self, packet: &super::packet::Packet, peer: SocketAddr) {
        let Some(p) = self.peers.get_mut(&peer) else {
            return;
        };
        if p.state != ConnState::SynSent {
            return;
        }

        if packet.ack == p.iss_server + 1 {
            p.state = ConnState::Established;
            p.last_activity = Instant::now();
            debug!("{peer} established");
        } else {
            warn!(
                "{peer} ACK mismatch in handshake: got {}, expected {}",
                packet.ack,
                p.iss_server + 1
            );
        }
    }

    fn handle_data(&mut self, packet: &super::packet::Packet, peer: SocketAddr) {
        let Some(p) = self.peers.get_mut(&peer) else {
            return;
        };
        if p.state != ConnState::Established {
            warn!("DATA from {peer} before ESTABLISHED, ignoring");
            return;
        }

        // Updated before the drop draw and sequence check, even for
        // duplicate/out-of-order datagrams.
        p.last_activity = Instant::now();

        if packet.seq != p.rcv_next {
            let wire = packet::encode(ACK, p.iss_server, p.rcv_next, &[]);
            let _ = self.socket.send_to(&wire, peer);
            debug!("duplicate ACK to {peer}, rcv_next={}", p.rcv_next);
            return;
        }

        if rand::thread_rng().gen_bool(self.drop_rate) {
            debug!("dropped DATA seq={} from {peer}", packet.seq);
            return;
        }

        p.rcv_next += packet.payload.len() as u32;
        let wire = packet::encode(ACK, p.iss_server, p.rcv_next, &[]);
        if let Err(e) = self.socket.send_to(&wire, peer) {
            warn!("send_to {peer} failed: {e}");
        }
    }

    fn handle_fin(&mut self, packet: &super::packet::Packet, peer: SocketAddr) {
        let Some(p) = self.peers.get(&peer) else {
            return;
        };
        if p.state != ConnState::Established {
            warn!("FIN from {peer} before ESTABLISHED, ignoring");
            return;
        }

        let wire = packet::encode(FIN | ACK, p.iss_server, packet.seq + 1, &[]);
        let _ = self.socket.send_to(&wire, peer);
        self.peers.remove(&peer);
        info!("{peer} closed");
    }
}
