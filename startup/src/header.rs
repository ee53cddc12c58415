//! Guest image header: the fixed-layout prologue at the start of the
//! reserved flash page, validated before the instruction stream behind it
//! is ever handed to the Execution Engine.

/// `magic` value every guest image must carry. Fixed per release; chosen
/// here since no prior release constrains it.
pub const IMAGE_MAGIC: u32 = 0x434F_4356; // "COCV"
pub const IMAGE_VERSION: u16 = 1;

/// `magic(4) | version(2) | instruction_count(2) | crc32(4) | reserved(4)`.
pub const HEADER_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestHeader {
    pub magic: u32,
    pub version: u16,
    pub instruction_count: u16,
    pub crc32: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    PageTooSmall,
    MissingMagic { found: u32 },
    VersionMismatch { found: u16 },
    LengthExceedsPage { declared_bytes: usize, page_capacity: usize },
    CrcMismatch { expected: u32, actual: u32 },
}

impl std::fmt::Display for HeaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PageTooSmall => write!(f, "flash page is smaller than a header"),
            Self::MissingMagic { found } => {
                write!(f, "bad magic: expected 0x{IMAGE_MAGIC:08X}, found 0x{found:08X}")
            }
            Self::VersionMismatch { found } => {
                write!(f, "unsupported image version {found}, expected {IMAGE_VERSION}")
            }
            Self::LengthExceedsPage { declared_bytes, page_capacity } => write!(
                f,
                "declared instruction stream is {declared_bytes} bytes, page only has {page_capacity} bytes after the header"
            ),
            Self::CrcMismatch { expected, actual } => write!(
                f,
                "instruction stream CRC32 mismatch: header says 0x{expected:08X}, computed 0x{actual:08X}"
            ),
        }
    }
}

impl std::error::Error for HeaderError {}

/// Parses and fully validates the header at the front of `page`, returning
/// the header and the instruction-stream byte slice that follows it.
pub fn validate<'a>(page: &'a [u8], crc32: impl Fn(&[u8]) -> u32) -> Result<(GuestHeader, &'a [u8]), HeaderError> {
    if page.len() < HEADER_SIZE {
        return Err(HeaderError::PageTooSmall);
    }
    let magic = u32::from_le_bytes(page[0..4].try_into().unwrap());
    if magic != IMAGE_MAGIC {
        return Err(HeaderError::MissingMagic { found: magic });
    }
    let version = u16::from_le_bytes(page[4..6].try_into().unwrap());
    if version != IMAGE_VERSION {
        return Err(HeaderError::VersionMismatch { found: version });
    }
    let instruction_count = u16::from_le_bytes(page[6..8].try_into().unwrap());
    let declared_crc = u32::from_le_bytes(page[8..12].try_into().unwrap());

    let declared_bytes = instruction_count as usize * 4;
    let page_capacity = page.len() - HEADER_SIZE;
    if declared_bytes > page_capacity {
        return Err(HeaderError::LengthExceedsPage {
            declared_bytes,
            page_capacity,
        });
    }

    let stream = &page[HEADER_SIZE..HEADER_SIZE + declared_bytes];
    let actual_crc = crc32(stream);
    if actual_crc != declared_crc {
        return Err(HeaderError::CrcMismatch {
            expected: declared_crc,
            actual: actual_crc,
        });
    }

    Ok((
        GuestHeader {
            magic,
            version,
            instruction_count,
            crc32: declared_crc,
        },
        stream,
    ))
}

/// Serializes a header and instruction stream into a flash-page-ready
/// image. Used by tests and by host-side flashing tools.
pub fn encode(instruction_count: u16, stream: &[u8], crc32: impl Fn(&[u8]) -> u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + stream.len());
    out.extend_from_slice(&IMAGE_MAGIC.to_le_bytes());
    out.extend_from_slice(&IMAGE_VERSION.to_le_bytes());
    out.extend_from_slice(&instruction_count.to_le_bytes());
    out.extend_from_slice(&crc32(stream).to_le_bytes());
    out.extend_from_slice(&[0u8; 4]); // reserved
    out.extend_from_slice(stream);
    out
}
