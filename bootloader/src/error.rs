//! Protocol error taxonomy. Every variant is either recoverable (resets the
//! session to `Idle`, counted in statistics) or critical (ends the session,
//! optionally triggering emergency shutdown).

use crate::frame::FrameError;
use crate::flash_staging::StagingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    Framing(FrameError),
    Crc32Mismatch { expected: u32, actual: u32 },
    MisorderedOffset { expected: u32, got: u32 },
    LengthOverflow { declared: u32 },
    FrameTimeout,
    SessionTimeout,
    FlashWriteFailed,
    InvariantViolation(&'static str),
}

impl ProtocolError {
    /// Critical errors end the session outright; everything else resets
    /// it back to `Idle` and is just counted.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::FlashWriteFailed | Self::InvariantViolation(_))
    }
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Framing(e) => write!(f, "framing error: {e}"),
            Self::Crc32Mismatch { expected, actual } => {
                write!(f, "CRC32 mismatch: expected 0x{expected:08X}, got 0x{actual:08X}")
            }
            Self::MisorderedOffset { expected, got } => {
                write!(f, "expected data offset {expected}, got {got}")
            }
            Self::LengthOverflow { declared } => {
                write!(f, "total_data_length {declared} exceeds flash page size")
            }
            Self::FrameTimeout => write!(f, "timed out waiting for the rest of a frame"),
            Self::SessionTimeout => write!(f, "session exceeded its wall-time budget"),
            Self::FlashWriteFailed => write!(f, "platform port reported a flash write failure"),
            Self::InvariantViolation(what) => write!(f, "internal invariant violated: {what}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<FrameError> for ProtocolError {
    fn from(e: FrameError) -> Self {
        Self::Framing(e)
    }
}

impl From<StagingError> for ProtocolError {
    fn from(e: StagingError) -> Self {
        match e {
            StagingError::MisorderedOffset { expected, got } => {
                Self::MisorderedOffset { expected, got }
            }
            StagingError::OverflowsDeclaredLength { declared, .. } => {
                Self::LengthOverflow { declared }
            }
            StagingError::FlashWriteFailed => Self::FlashWriteFailed,
        }
    }
}
