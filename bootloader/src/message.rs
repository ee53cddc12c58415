//! Message layer: length-delimited request/response records carried inside
//! a frame's payload. Real encoding is schema-driven on the reference
//! target; these types model the fields the session logic actually reads
//! and writes, independent of wire serialization.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub client_version: u16,
    pub max_packet_size: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashProgramRequest {
    pub total_data_length: u32,
    pub verify_after_program: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPacket {
    pub offset: u32,
    pub bytes: Vec<u8>,
    pub crc32: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPayload {
    Handshake(Handshake),
    FlashProgram(FlashProgramRequest),
    Data(DataPacket),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub sequence_id: u32,
    pub payload: RequestPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerHandshake {
    pub server_version: u16,
    pub flash_page_size: u32,
    pub target_flash_address: u32,
    pub max_packet_size: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashProgramResponse {
    pub bytes_programmed: u32,
    pub actual_data_length: u32,
    pub verification_hash: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    Handshake(ServerHandshake),
    Acknowledgment(Acknowledgment),
    FlashProgramResponse(FlashProgramResponse),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub sequence_id: u32,
    pub payload: ResponsePayload,
}

impl Response {
    pub fn ack(sequence_id: u32, success: bool, message: impl Into<String>) -> Self {
        Self {
            sequence_id,
            payload: ResponsePayload::Acknowledgment(Acknowledgment {
                success,
                message: message.into(),
            }),
        }
    }
}
