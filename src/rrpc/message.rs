use std::io::{Read, Write};

use crate::err::RrpcError;

pub const HEADER_LEN: usize = 6;

pub const INITIALIZATION: u16 = 1;
pub const AGREE: u16 = 2;
pub const REVERSE_REQUEST: u16 = 3;
pub const REVERSE_ANSWER: u16 = 4;

// A decoded RRPC message: `{type: u16, length: u32}` big-endian header,
// optionally followed by `length` bytes of ASCII payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub msg_type: u16,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(msg_type: u16, payload: Vec<u8>) -> Self {
        Message { msg_type, payload }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.payload.len());
        buf.extend_from_slice(&self.msg_type.to_be_bytes());
        buf.extend_from_slice(&(self.payload.len() as u32).to_be_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }
}

// Initialization is the one message type where `length` carries the chunk
// count directly rather than a byte count, with no trailing payload.
pub fn write_initialization(w: &mut impl Write, chunks_num: u32) -> Result<(), RrpcError> {
    let mut buf = Vec::with_capacity(HEADER_LEN);
    buf.extend_from_slice(&INITIALIZATION.to_be_bytes());
    buf.extend_from_slice(&chunks_num.to_be_bytes());
    w.write_all(&buf)?;
    Ok(())
}

// Reads an Initialization header and returns the chunk count carried in
// its `length` field.
pub fn read_initialization(r: &mut impl Read) -> Result<u32, RrpcError> {
    let mut header = [0u8; HEADER_LEN];
    r.read_exact(&mut header).map_err(|_| RrpcError::IncompleteHeader)?;

    let msg_type = u16::from_be_bytes([header[0], header[1]]);
    if msg_type != INITIALIZATION {
        return Err(RrpcError::UnexpectedType(msg_type));
    }
    Ok(u32::from_be_bytes([header[2], header[3], header[4], header[5]]))
}

pub fn validate_ascii(payload: &[u8]) -> Result<(), RrpcError> {
    if payload.iter().all(u8::is_ascii) {
        Ok(())
    } else {
        Err(RrpcError::NonAscii)
    }
}

// write_all loops internally, so no partial-write retry is needed here.
pub fn write_message(w: &mut impl Write, msg: &Message) -> Result<(), RrpcError> {
    w.write_all(&msg.encode())?;
    Ok(())
}

// Loops on short reads rather than trusting a single recv to return the
// whole header or payload.
pub fn read_message(r: &mut impl Read) -> Result<Message, RrpcError> {
    let mut header = [0u8; HEADER_LEN];
    r.read_exact(&mut header).map_err(|_| RrpcError::IncompleteHeader)?;

    let msg_type = u16::from_be_bytes([header[0], header[1]]);
    let length = u32::from_be_bytes([header[2], header[3], header[4], header[5]]);

    let mut payload = vec![0u8; length as usize];
    let mut got = 0usize;
    while got < payload.len() {
        match r.read(&mut payload[got..]) {
            Ok(0) => {
                return Err(RrpcError::IncompletePayload {
                    expected: length,
                    got,
                })
            }
            Ok(n) => got += n,
            Err(e) => return Err(RrpcError::Io(e)),
        }
    }

    Ok(Message::new(msg_type, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trip_with_payload() {
        let msg = Message::new(REVERSE_REQUEST, b"HelloWorld".to_vec());
        let wire = msg.encode();
        let mut cursor = Cursor::new(wire);
        let decoded = read_message(&mut cursor).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn round_trip_empty_payload() {
        let msg = Message::new(AGREE, vec![]);
        let mut cursor = Cursor::new(msg.encode());
        let decoded = read_message(&mut cursor).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn incomplete_header_is_an_error() {
        let mut cursor = Cursor::new(vec![0u8; 3]);
        assert!(matches!(
            read_message(&mut cursor),
            Err(RrpcError::IncompleteHeader)
        ));
    }

    #[test]
    fn incomplete_payload_is_an_error() {
        let mut wire = Message::new(REVERSE_REQUEST, b"abcd".to_vec()).encode();
        wire.truncate(wire.len() - 1);
        let mut cursor = Cursor::new(wire);
        assert!(matches!(
            read_message(&mut cursor),
            Err(RrpcError::IncompletePayload { .. })
        ));
    }

    #[test]
    fn initialization_round_trip_has_no_trailing_bytes() {
        let mut buf = Vec::new();
        write_initialization(&mut buf, 7).unwrap();
        assert_eq!(buf.len(), HEADER_LEN);
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_initialization(&mut cursor).unwrap(), 7);
    }

    #[test]
    fn rejects_non_ascii_payload() {
        assert!(validate_ascii(b"hello").is_ok());
        assert!(matches!(validate_ascii(&[0xff, 0x00]), Err(RrpcError::NonAscii)));
    }
}
