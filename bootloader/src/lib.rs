//! Bootloader Protocol Core: receives a guest image over a serial
//! transport and writes it atomically into the reserved flash page.
//! Transport-agnostic — [`session::BootloaderSession`] consumes decoded
//! [`message::Request`]s and produces [`message::Response`]s; a real
//! target wraps it with [`frame`] encode/decode over a UART byte stream.

pub mod crc;
pub mod error;
pub mod flash_staging;
pub mod frame;
pub mod message;
pub mod session;
pub mod timeout;

pub use error::ProtocolError;
pub use session::{BootloaderSession, Outcome, Phase, SessionConfig, SessionStats};
