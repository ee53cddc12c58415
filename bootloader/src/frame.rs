//! Bit-exact wire frame: `START | LENGTH(be16) | PAYLOAD | CRC16 | END`.
//! CRC16 covers `LENGTH || PAYLOAD`, not `START`/`CRC16`/`END` themselves.

use crate::crc::crc16_ccitt;

pub const FRAME_START: u8 = 0x7E;
pub const FRAME_END: u8 = 0x7F;
pub const FRAME_OVERHEAD: usize = 6;

/// No payload length is pinned by the wire format itself; this is the
/// largest `DataPacket` payload a session will accept in one frame.
pub const MAX_PAYLOAD_LEN: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    BadStart(u8),
    LengthExceedsMax { length: usize, max: usize },
    Truncated,
    CrcMismatch { expected: u16, actual: u16 },
    BadEnd(u8),
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadStart(b) => write!(f, "expected start byte 0x{FRAME_START:02X}, got 0x{b:02X}"),
            Self::LengthExceedsMax { length, max } => {
                write!(f, "frame length {length} exceeds maximum {max}")
            }
            Self::Truncated => write!(f, "frame is shorter than its declared length"),
            Self::CrcMismatch { expected, actual } => {
                write!(f, "CRC16 mismatch: expected 0x{expected:04X}, got 0x{actual:04X}")
            }
            Self::BadEnd(b) => write!(f, "expected end byte 0x{FRAME_END:02X}, got 0x{b:02X}"),
        }
    }
}

impl std::error::Error for FrameError {}

/// Encode `payload` into a complete wire frame.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let len = payload.len() as u16;
    let mut len_and_payload = Vec::with_capacity(2 + payload.len());
    len_and_payload.extend_from_slice(&len.to_be_bytes());
    len_and_payload.extend_from_slice(payload);
    let crc = crc16_ccitt(&len_and_payload);

    let mut frame = Vec::with_capacity(FRAME_OVERHEAD + payload.len());
    frame.push(FRAME_START);
    frame.extend_from_slice(&len_and_payload);
    frame.extend_from_slice(&crc.to_be_bytes());
    frame.push(FRAME_END);
    frame
}

/// Decode one complete frame from the front of `bytes`, returning the
/// payload and the number of bytes consumed.
pub fn decode(bytes: &[u8]) -> Result<(Vec<u8>, usize), FrameError> {
    if bytes.is_empty() {
        return Err(FrameError::Truncated);
    }
    if bytes[0] != FRAME_START {
        return Err(FrameError::BadStart(bytes[0]));
    }
    if bytes.len() < 3 {
        return Err(FrameError::Truncated);
    }
    let length = u16::from_be_bytes([bytes[1], bytes[2]]) as usize;
    if length > MAX_PAYLOAD_LEN {
        return Err(FrameError::LengthExceedsMax {
            length,
            max: MAX_PAYLOAD_LEN,
        });
    }
    let total = FRAME_OVERHEAD + length;
    if bytes.len() < total {
        return Err(FrameError::Truncated);
    }

    let len_and_payload = &bytes[1..3 + length];
    let payload = &bytes[3..3 + length];
    let expected_crc = crc16_ccitt(len_and_payload);
    let actual_crc = u16::from_be_bytes([bytes[3 + length], bytes[4 + length]]);
    if expected_crc != actual_crc {
        return Err(FrameError::CrcMismatch {
            expected: expected_crc,
            actual: actual_crc,
        });
    }

    let end = bytes[5 + length];
    if end != FRAME_END {
        return Err(FrameError::BadEnd(end));
    }

    Ok((payload.to_vec(), total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips() {
        let payload = b"hello bootloader";
        let frame = encode(payload);
        let (decoded, consumed) = decode(&frame).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(consumed, frame.len());
    }

    #[test]
    fn empty_payload_round_trips() {
        let frame = encode(&[]);
        let (decoded, consumed) = decode(&frame).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(consumed, FRAME_OVERHEAD);
    }

    #[test]
    fn corrupted_payload_byte_fails_crc() {
        let mut frame = encode(b"0123456789");
        let payload_start = 3;
        frame[payload_start] ^= 0xFF;
        assert!(matches!(decode(&frame), Err(FrameError::CrcMismatch { .. })));
    }

    #[test]
    fn bad_start_byte_rejected() {
        let mut frame = encode(b"x");
        frame[0] = 0x00;
        assert!(matches!(decode(&frame), Err(FrameError::BadStart(0x00))));
    }

    #[test]
    fn bad_end_byte_rejected() {
        let mut frame = encode(b"x");
        let last = frame.len() - 1;
        frame[last] = 0x00;
        assert!(matches!(decode(&frame), Err(FrameError::BadEnd(0x00))));
    }

    #[test]
    fn length_over_max_rejected() {
        let mut frame = encode(&[0u8; 4]);
        frame[1..3].copy_from_slice(&((MAX_PAYLOAD_LEN + 1) as u16).to_be_bytes());
        assert!(matches!(
            decode(&frame),
            Err(FrameError::LengthExceedsMax { .. })
        ));
    }

    #[test]
    fn truncated_frame_rejected() {
        let frame = encode(b"0123456789");
        assert!(matches!(decode(&frame[..5]), Err(FrameError::Truncated)));
    }
}
