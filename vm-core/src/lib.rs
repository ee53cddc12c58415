//! Bytecode virtual machine for resource-constrained microcontrollers:
//! a fixed-width stack machine over a guest instruction set covering
//! arithmetic, control flow, comparisons, guest memory (globals and small
//! arrays), and hardware access (GPIO, ADC/PWM, timers, UART, printf).
//!
//! [`ComponentVM`] composes the three owned subsystems — [`ExecutionEngine`],
//! [`MemoryManager`], and [`IoController`] — into the single entry point a
//! host embeds. Everything below that line is reusable on its own for
//! targeted testing (e.g. `ExecutionEngine` alone against a stub
//! `MemoryManager`/`IoController`).

mod component_vm;
pub mod engine;
pub mod error;
pub mod instruction;
pub mod io;
pub mod memory;
pub mod observer;
pub mod platform;
pub mod stack;

/// Reusable `PlatformPort` test double, gated behind the `test-support`
/// feature so `cockpit-bootloader`/`cockpit-startup` can exercise their
/// state machines without each hand-rolling a stub.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use component_vm::ComponentVM;
pub use engine::{ExecutionEngine, VmState};
pub use error::VmError;
pub use instruction::{decode_program, Instruction, Opcode, ProgramDecodeError};
pub use io::IoController;
pub use memory::MemoryManager;
pub use observer::{NullObserver, Observer};
pub use platform::{PinMode, PlatformPort};
pub use stack::OperandStack;
