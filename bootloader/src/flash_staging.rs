//! Accumulates incoming data-packet bytes and commits them to flash in
//! full 8-byte-aligned chunks, tracking `actual_data_length` (exact guest
//! size) separately from `bytes_programmed` (rounded up to the next
//! multiple of 8).

pub const FLASH_WORD_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingError {
    MisorderedOffset { expected: u32, got: u32 },
    OverflowsDeclaredLength { declared: u32, would_reach: u64 },
    FlashWriteFailed,
}

impl std::fmt::Display for StagingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MisorderedOffset { expected, got } => {
                write!(f, "expected data offset {expected}, got {got}")
            }
            Self::OverflowsDeclaredLength { declared, would_reach } => write!(
                f,
                "data packet would extend staged length to {would_reach}, exceeding declared {declared}"
            ),
            Self::FlashWriteFailed => write!(f, "platform port reported a flash write failure"),
        }
    }
}

impl std::error::Error for StagingError {}

pub struct FlashStaging {
    base_address: u32,
    declared_length: u32,
    received: Vec<u8>,
    bytes_programmed: u32,
}

impl FlashStaging {
    pub fn new(base_address: u32, declared_length: u32) -> Self {
        Self {
            base_address,
            declared_length,
            received: Vec::with_capacity(declared_length as usize),
            bytes_programmed: 0,
        }
    }

    pub fn actual_data_length(&self) -> u32 {
        self.received.len() as u32
    }

    pub fn declared_length(&self) -> u32 {
        self.declared_length
    }

    pub fn bytes_programmed(&self) -> u32 {
        self.bytes_programmed
    }

    /// Next offset the server expects a `DataPacket` to carry.
    pub fn expected_offset(&self) -> u32 {
        self.received.len() as u32
    }

    /// Appends `bytes` at `offset`, writing every full 8-byte chunk that
    /// becomes available via `write_word`. Partial trailing bytes stay
    /// buffered until a later packet completes the chunk or `finish` pads
    /// them.
    pub fn append(
        &mut self,
        offset: u32,
        bytes: &[u8],
        mut write_word: impl FnMut(u32, u64) -> Result<(), ()>,
    ) -> Result<(), StagingError> {
        let expected = self.expected_offset();
        if offset != expected {
            return Err(StagingError::MisorderedOffset { expected, got: offset });
        }
        let would_reach = self.received.len() as u64 + bytes.len() as u64;
        if would_reach > self.declared_length as u64 {
            return Err(StagingError::OverflowsDeclaredLength {
                declared: self.declared_length,
                would_reach,
            });
        }
        self.received.extend_from_slice(bytes);

        while self.received.len() - self.bytes_programmed as usize >= FLASH_WORD_SIZE {
            self.program_next_word(&mut write_word)?;
        }
        Ok(())
    }

    /// Pads and programs any remaining partial chunk with zero bytes,
    /// called once the client declares the transfer complete.
    pub fn finish(
        &mut self,
        mut write_word: impl FnMut(u32, u64) -> Result<(), ()>,
    ) -> Result<(), StagingError> {
        if self.received.len() > self.bytes_programmed as usize {
            let start = self.bytes_programmed as usize;
            let mut padded = self.received[start..].to_vec();
            padded.resize(FLASH_WORD_SIZE, 0);
            let word = u64::from_le_bytes(padded.try_into().unwrap());
            let addr = self.base_address + self.bytes_programmed;
            write_word(addr, word).map_err(|()| StagingError::FlashWriteFailed)?;
            self.bytes_programmed += FLASH_WORD_SIZE as u32;
        }
        Ok(())
    }

    fn program_next_word(
        &mut self,
        write_word: &mut impl FnMut(u32, u64) -> Result<(), ()>,
    ) -> Result<(), StagingError> {
        let start = self.bytes_programmed as usize;
        let chunk: [u8; FLASH_WORD_SIZE] = self.received[start..start + FLASH_WORD_SIZE]
            .try_into()
            .unwrap();
        let word = u64::from_le_bytes(chunk);
        let addr = self.base_address + self.bytes_programmed;
        write_word(addr, word).map_err(|()| StagingError::FlashWriteFailed)?;
        self.bytes_programmed += FLASH_WORD_SIZE as u32;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_multiple_of_8_programs_cleanly() {
        let mut staging = FlashStaging::new(0x1000, 16);
        let mut written = Vec::new();
        staging
            .append(0, &[0xAAu8; 16], |addr, word| {
                written.push((addr, word));
                Ok(())
            })
            .unwrap();
        assert_eq!(staging.bytes_programmed(), 16);
        assert_eq!(staging.actual_data_length(), 16);
        assert_eq!(written.len(), 2);
    }

    #[test]
    fn non_aligned_length_pads_on_finish() {
        let mut staging = FlashStaging::new(0x1000, 10);
        let mut written = Vec::new();
        staging
            .append(0, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10], |addr, word| {
                written.push((addr, word));
                Ok(())
            })
            .unwrap();
        assert_eq!(staging.bytes_programmed(), 8);
        staging
            .finish(|addr, word| {
                written.push((addr, word));
                Ok(())
            })
            .unwrap();
        assert_eq!(staging.bytes_programmed(), 16);
        assert_eq!(staging.actual_data_length(), 10);
        assert_eq!(written.len(), 2);
        let (_, last_word) = written[1];
        assert_eq!(&last_word.to_le_bytes()[..2], &[9, 10]);
        assert_eq!(&last_word.to_le_bytes()[2..], &[0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn misordered_offset_rejected() {
        let mut staging = FlashStaging::new(0x1000, 16);
        let err = staging.append(4, &[0; 4], |_, _| Ok(())).unwrap_err();
        assert_eq!(err, StagingError::MisorderedOffset { expected: 0, got: 4 });
    }

    #[test]
    fn overflow_of_declared_length_rejected() {
        let mut staging = FlashStaging::new(0x1000, 4);
        let err = staging.append(0, &[0; 8], |_, _| Ok(())).unwrap_err();
        assert!(matches!(err, StagingError::OverflowsDeclaredLength { .. }));
    }
}
