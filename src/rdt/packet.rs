use crate::err::FramerError;

// 1 (flags) + 4 (seq) + 4 (ack) + 2 (len)
pub const HEADER_LEN: usize = 11;

pub const PAYLOAD_CAP: usize = 80;

pub const SYN: u8 = 0x01;
pub const ACK: u8 = 0x02;
pub const FIN: u8 = 0x04;
pub const DATA: u8 = 0x08;
pub const RST: u8 = 0x10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub flags: u8,
    pub seq: u32,
    pub ack: u32,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(flags: u8, seq: u32, ack: u32, payload: Vec<u8>) -> Self {
        Packet {
            flags,
            seq,
            ack,
            payload,
        }
    }

    pub fn has(&self, bit: u8) -> bool {
        self.flags & bit != 0
    }

    // SYN and FIN each consume one sequence number; DATA consumes its payload length.
    pub fn seq_len(&self) -> u32 {
        let mut len = self.payload.len() as u32;
        if self.has(SYN) {
            len += 1;
        }
        if self.has(FIN) {
            len += 1;
        }
        len
    }
}

pub fn encode(flags: u8, seq: u32, ack: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.push(flags);
    buf.extend_from_slice(&seq.to_be_bytes());
    buf.extend_from_slice(&ack.to_be_bytes());
    buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

pub fn decode(bytes: &[u8]) -> Result<Packet, FramerError> {
    if bytes.len() < HEADER_LEN {
        return Err(FramerError::TooShort(bytes.len()));
    }

    let flags = bytes[0];
    let seq = u32::from_be_bytes(bytes[1..5].try_into().unwrap());
    let ack = u32::from_be_bytes(bytes[5..9].try_into().unwrap());
    let len = u16::from_be_bytes(bytes[9..11].try_into().unwrap());

    let remaining = bytes.len() - HEADER_LEN;
    if remaining != len as usize {
        return Err(FramerError::LengthMismatch {
            declared: len,
            actual: remaining,
        });
    }

    Ok(Packet::new(flags, seq, ack, bytes[HEADER_LEN..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_empty_payload() {
        let wire = encode(SYN, 1234, 0, &[]);
        let p = decode(&wire).unwrap();
        assert_eq!(p, Packet::new(SYN, 1234, 0, vec![]));
    }

    #[test]
    fn round_trip_max_payload() {
        let payload = vec![0x42u8; PAYLOAD_CAP];
        let wire = encode(DATA, 5000, 7, &payload);
        let p = decode(&wire).unwrap();
        assert_eq!(p.payload.len(), PAYLOAD_CAP);
        assert_eq!(p, Packet::new(DATA, 5000, 7, payload));
    }

    #[test]
    fn round_trip_combined_flags() {
        for flags in [SYN | ACK, FIN | ACK, ACK] {
            let wire = encode(flags, 1, 2, b"hi");
            let p = decode(&wire).unwrap();
            assert_eq!(p, Packet::new(flags, 1, 2, b"hi".to_vec()));
        }
    }

    #[test]
    fn decode_rejects_short_header() {
        let err = decode(&[0u8; 5]).unwrap_err();
        assert_eq!(err, FramerError::TooShort(5));
    }

    #[test]
    fn decode_rejects_length_mismatch() {
        let mut wire = encode(DATA, 1, 1, b"abcd");
        wire.truncate(wire.len() - 1);
        let err = decode(&wire).unwrap_err();
        assert_eq!(
            err,
            FramerError::LengthMismatch {
                declared: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn seq_len_accounts_for_syn_and_fin() {
        assert_eq!(Packet::new(SYN, 0, 0, vec![]).seq_len(), 1);
        assert_eq!(Packet::new(FIN, 0, 0, vec![]).seq_len(), 1);
        assert_eq!(Packet::new(DATA, 0, 0, vec![1, 2, 3]).seq_len(), 3);
    }
}
