//! Optional execution observer. Notified before and
//! after each dispatched instruction; absence must produce bit-identical
//! behavior, and an observer must never be able to mutate VM state — hence
//! it only ever receives copies of scalars, never a reference into the VM.

use crate::error::VmError;

pub trait Observer {
    fn before_instruction(&mut self, pc: usize, opcode: u8, sp: usize);
    fn after_instruction(&mut self, pc: usize, sp: usize, error: VmError);
}

/// The default observer: does nothing. `ComponentVM::new` wires this in so
/// callers who don't care about tracing pay no cost and see no behavior
/// change versus an engine with no observer hook at all.
#[derive(Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn before_instruction(&mut self, _pc: usize, _opcode: u8, _sp: usize) {}
    fn after_instruction(&mut self, _pc: usize, _sp: usize, _error: VmError) {}
}
