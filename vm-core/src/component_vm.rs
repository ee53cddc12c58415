//! `ComponentVM`: the single entry point a host embeds, composing the
//! Execution Engine, Memory Manager, and I/O Controller behind one API so
//! callers never juggle three separate lifetimes and error types by hand.

use crate::engine::{ExecutionEngine, VmState};
use crate::error::VmError;
use crate::instruction::{decode_program, Instruction, ProgramDecodeError};
use crate::io::IoController;
use crate::memory::MemoryManager;
use crate::observer::{NullObserver, Observer};
use crate::platform::PlatformPort;

/// Failure loading a program image, before any guest instruction runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    Decode(ProgramDecodeError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<ProgramDecodeError> for LoadError {
    fn from(e: ProgramDecodeError) -> Self {
        Self::Decode(e)
    }
}

pub struct ComponentVM<'p, P: PlatformPort + ?Sized, O: Observer = NullObserver> {
    engine: ExecutionEngine,
    memory: MemoryManager,
    io: IoController<'p, P>,
    observer: O,
}

impl<'p, P: PlatformPort + ?Sized> ComponentVM<'p, P, NullObserver> {
    pub fn new(platform: &'p mut P) -> Self {
        Self {
            engine: ExecutionEngine::new(),
            memory: MemoryManager::new(),
            io: IoController::new(platform),
            observer: NullObserver,
        }
    }
}

impl<'p, P: PlatformPort + ?Sized, O: Observer> ComponentVM<'p, P, O> {
    /// Attaches a non-default observer. Swapping [`NullObserver`] for a
    /// real one must not change any guest-visible outcome — only what the
    /// observer itself records.
    pub fn with_observer(platform: &'p mut P, observer: O) -> Self {
        Self {
            engine: ExecutionEngine::new(),
            memory: MemoryManager::new(),
            io: IoController::new(platform),
            observer,
        }
    }

    pub fn load_bytes(&mut self, image: &[u8]) -> Result<(), LoadError> {
        let program = decode_program(image)?;
        self.engine.load_program(program);
        Ok(())
    }

    pub fn load_program(&mut self, program: Vec<Instruction>) {
        self.engine.load_program(program);
    }

    pub fn add_string(&mut self, text: &str) -> Result<u8, ()> {
        self.io.add_string(text)
    }

    /// Runs the loaded program to completion (halt or fault).
    pub fn run(&mut self) -> Result<(), VmError> {
        while !self.engine.halted() {
            self.step()?;
        }
        Ok(())
    }

    /// Executes exactly one guest instruction, notifying the observer
    /// immediately before and after. With a [`NullObserver`] this reduces
    /// to the hooks being dead code, so behavior is identical to calling
    /// the engine directly.
    pub fn step(&mut self) -> Result<(), VmError> {
        let pc_before = self.engine.pc();
        let sp_before = self.engine.sp();
        if let Some(opcode) = self.engine.next_opcode() {
            self.observer.before_instruction(pc_before, opcode, sp_before);
        }
        let result = self.engine.execute_single_instruction(&mut self.memory, &mut self.io);
        let error = result.err().unwrap_or(VmError::None);
        self.observer
            .after_instruction(self.engine.pc(), self.engine.sp(), error);
        if error == VmError::None { Ok(()) } else { Err(error) }
    }

    /// Returns every subsystem to its post-construction state: no program
    /// loaded, empty stack, zeroed globals and arrays, and every pin back to
    /// unconfigured. Printf strings registered through [`Self::add_string`]
    /// survive, since [`IoController::reset`] only clears pin state.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.memory.reset();
        self.io.reset();
    }

    pub fn pc(&self) -> usize {
        self.engine.pc()
    }

    pub fn sp(&self) -> usize {
        self.engine.sp()
    }

    pub fn halted(&self) -> bool {
        self.engine.halted()
    }

    pub fn state(&self) -> VmState {
        self.engine.state()
    }

    pub fn last_error(&self) -> VmError {
        self.engine.last_error()
    }

    pub fn stack_top(&self) -> Result<i32, VmError> {
        self.engine.stack_top()
    }

    /// Reads a guest global after the fact, for callers (tests, the CLI)
    /// that want to inspect state a halted program left behind.
    pub fn load_global(&self, id: u8) -> Result<i32, VmError> {
        self.memory.load_global(id).map_err(|()| VmError::MemoryBounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Opcode;
    use crate::test_support::RecordingPlatform;

    fn program(insns: &[Instruction]) -> Vec<Instruction> {
        insns.to_vec()
    }

    #[test]
    fn runs_arithmetic_program_to_halt() {
        let mut platform = RecordingPlatform::default();
        let mut vm = ComponentVM::new(&mut platform);
        vm.load_program(program(&[
            Instruction::new(Opcode::Push as u8, 0, 10),
            Instruction::new(Opcode::Push as u8, 0, 5),
            Instruction::new(Opcode::Add as u8, 0, 0),
            Instruction::new(Opcode::Halt as u8, 0, 0),
        ]));
        vm.run().unwrap();
        assert!(vm.halted());
        assert_eq!(vm.stack_top().unwrap(), 15);
        assert_eq!(vm.state(), VmState::Halted);
    }

    #[test]
    fn fault_latches_last_error_and_halts() {
        let mut platform = RecordingPlatform::default();
        let mut vm = ComponentVM::new(&mut platform);
        vm.load_program(program(&[
            Instruction::new(Opcode::Push as u8, 0, 1),
            Instruction::new(Opcode::Push as u8, 0, 0),
            Instruction::new(Opcode::Div as u8, 0, 0),
        ]));
        let err = vm.run().unwrap_err();
        assert_eq!(err, VmError::DivisionByZero);
        assert_eq!(vm.last_error(), VmError::DivisionByZero);
        assert!(vm.halted());
    }

    #[test]
    fn reset_forgets_program_but_keeps_registered_strings() {
        let mut platform = RecordingPlatform::default();
        let mut vm = ComponentVM::new(&mut platform);
        vm.add_string("hello\n").unwrap();
        vm.load_program(program(&[Instruction::new(Opcode::Halt as u8, 0, 0)]));
        vm.run().unwrap();
        vm.reset();
        assert_eq!(vm.state(), VmState::Idle);
        assert_eq!(vm.pc(), 0);
        // A second string still gets id 1, proving the table survived reset.
        assert_eq!(vm.add_string("world\n").unwrap(), 1);
    }

    struct CountingObserver {
        before: usize,
        after: usize,
    }

    impl Observer for CountingObserver {
        fn before_instruction(&mut self, _pc: usize, _opcode: u8, _sp: usize) {
            self.before += 1;
        }
        fn after_instruction(&mut self, _pc: usize, _sp: usize, _error: VmError) {
            self.after += 1;
        }
    }

    #[test]
    fn observer_sees_one_call_pair_per_instruction() {
        let mut platform = RecordingPlatform::default();
        let observer = CountingObserver { before: 0, after: 0 };
        let mut vm = ComponentVM::with_observer(&mut platform, observer);
        vm.load_program(program(&[
            Instruction::new(Opcode::Push as u8, 0, 1),
            Instruction::new(Opcode::Halt as u8, 0, 0),
        ]));
        vm.run().unwrap();
        assert_eq!(vm.observer.before, 2);
        assert_eq!(vm.observer.after, 2);
    }
}
