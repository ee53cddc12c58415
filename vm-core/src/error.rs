//! VM-level error taxonomy: every variant is fatal to the current guest
//! run and is never automatically retried.

use std::fmt;

/// Every way a single guest instruction can fail. `None` is not an error at
/// all — it's the sentinel `ExecutionEngine::last_error()` reports while a
/// program is healthy, matching the on-device convention of a single latched
/// error register rather than an `Option<VmError>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VmError {
    #[default]
    None,
    StackOverflow,
    StackUnderflow,
    StackCorruption,
    InvalidOpcode(u8),
    InvalidJump(usize),
    DivisionByZero,
    InvalidShift(u32),
    MemoryBounds,
    HardwareFault,
    ProgramNotLoaded,
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "no error"),
            Self::StackOverflow => write!(f, "operand stack overflow"),
            Self::StackUnderflow => write!(f, "operand stack underflow"),
            Self::StackCorruption => write!(f, "operand stack canary corrupted"),
            Self::InvalidOpcode(op) => write!(f, "invalid opcode 0x{op:02X}"),
            Self::InvalidJump(target) => write!(f, "jump target {target} out of range"),
            Self::DivisionByZero => write!(f, "division or modulo by zero"),
            Self::InvalidShift(amount) => write!(f, "shift amount {amount} out of range [0, 32)"),
            Self::MemoryBounds => write!(f, "global or array access out of bounds"),
            Self::HardwareFault => write!(f, "platform port reported a hardware fault"),
            Self::ProgramNotLoaded => write!(f, "no program is loaded"),
        }
    }
}

impl VmError {
    /// Short, stable tag for structured log lines — independent of the
    /// `Display` wording, which is free to change without breaking a
    /// downstream log grep.
    pub fn code(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::StackOverflow => "STACK_OVERFLOW",
            Self::StackUnderflow => "STACK_UNDERFLOW",
            Self::StackCorruption => "STACK_CORRUPTION",
            Self::InvalidOpcode(_) => "INVALID_OPCODE",
            Self::InvalidJump(_) => "INVALID_JUMP",
            Self::DivisionByZero => "DIVISION_BY_ZERO",
            Self::InvalidShift(_) => "INVALID_SHIFT",
            Self::MemoryBounds => "MEMORY_BOUNDS",
            Self::HardwareFault => "HARDWARE_FAULT",
            Self::ProgramNotLoaded => "PROGRAM_NOT_LOADED",
        }
    }
}

impl std::error::Error for VmError {}
