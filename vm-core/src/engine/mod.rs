//! Execution Engine: decodes and dispatches instructions, owns
//! the operand stack and program counter, emits structured errors.
//!
//! The dispatcher is the single writer of `pc` and `halted` — handlers never
//! mutate either directly, they return a [`PcAction`] describing the intent
//! and `ExecutionEngine::commit` applies it, so handlers report
//! control-flow facts rather than poking registers behind the dispatcher's
//! back.

mod handlers;

use crate::error::VmError;
use crate::instruction::{Instruction, Opcode};
use crate::io::IoController;
use crate::memory::MemoryManager;
use crate::platform::PlatformPort;
use crate::stack::OperandStack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Idle,
    Loaded,
    Running,
    Halted,
    Faulted,
}

/// The control-flow intent a handler hands back to the dispatcher.
/// `JumpAbsolute` carries a raw, not-yet-validated target; `commit` validates
/// it against `program_size` before writing `pc`.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PcAction {
    Increment,
    JumpAbsolute(usize),
    Halt,
    CallFunction(usize),
    ReturnFunction,
}

pub(crate) type HandlerResult = Result<PcAction, VmError>;

/// Read-only execution context and the stack, handed to every opcode
/// handler. Handlers compute a `PcAction`; they never see `halted` or write
/// `pc` themselves.
pub(crate) struct HandlerContext<'a> {
    pub stack: &'a mut OperandStack,
    pub pc: usize,
    pub program_size: usize,
}

pub struct ExecutionEngine {
    program: Vec<Instruction>,
    stack: OperandStack,
    pc: usize,
    halted: bool,
    state: VmState,
    last_error: VmError,
}

impl ExecutionEngine {
    pub fn new() -> Self {
        Self {
            program: Vec::new(),
            stack: OperandStack::new(),
            pc: 0,
            halted: false,
            state: VmState::Idle,
            last_error: VmError::None,
        }
    }

    pub fn load_program(&mut self, image: Vec<Instruction>) {
        log::debug!(
            "category=vm code=PROGRAM_LOADED instructions={}",
            image.len()
        );
        self.program = image;
        self.stack.reset();
        self.pc = 0;
        self.halted = false;
        self.last_error = VmError::None;
        self.state = VmState::Loaded;
    }

    /// Moves all state back to `Idle`, indistinguishable from
    /// post-construction: the loaded program is forgotten along with the
    /// stack and PC.
    pub fn reset(&mut self) {
        self.program.clear();
        self.stack.reset();
        self.pc = 0;
        self.halted = false;
        self.last_error = VmError::None;
        self.state = VmState::Idle;
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn sp(&self) -> usize {
        self.stack.sp()
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn last_error(&self) -> VmError {
        self.last_error
    }

    pub fn program_size(&self) -> usize {
        self.program.len()
    }

    /// Top of stack, for callers (tests, the CLI) that want the guest's
    /// return value without reaching into internals.
    pub fn stack_top(&self) -> Result<i32, VmError> {
        self.stack.peek(0)
    }

    /// The raw opcode byte at the current `pc`, without decoding or
    /// executing it. Used by callers that want to observe an instruction
    /// before it runs (e.g. an [`crate::observer::Observer`]) without the
    /// engine needing to know observers exist.
    pub fn next_opcode(&self) -> Option<u8> {
        self.program.get(self.pc).map(|insn| insn.opcode)
    }

    pub fn execute_program<P: PlatformPort + ?Sized>(
        &mut self,
        mm: &mut MemoryManager,
        ioc: &mut IoController<'_, P>,
    ) -> Result<(), VmError> {
        loop {
            if self.halted {
                return Ok(());
            }
            self.execute_single_instruction(mm, ioc)?;
        }
    }

    pub fn execute_single_instruction<P: PlatformPort + ?Sized>(
        &mut self,
        mm: &mut MemoryManager,
        ioc: &mut IoController<'_, P>,
    ) -> Result<(), VmError> {
        if self.state == VmState::Idle {
            self.fault(VmError::ProgramNotLoaded);
            return Err(VmError::ProgramNotLoaded);
        }
        if self.halted {
            // Halted/Faulted are terminal; stepping again is a no-op success
            // for Halted (nothing left to run).
            return Ok(());
        }
        self.state = VmState::Running;

        let insn = match self.program.get(self.pc) {
            Some(insn) => *insn,
            None => {
                self.fault(VmError::InvalidJump(self.pc));
                return Err(VmError::InvalidJump(self.pc));
            }
        };

        let opcode = match Opcode::decode(insn.opcode) {
            Some(op) => op,
            None => {
                self.fault(VmError::InvalidOpcode(insn.opcode));
                return Err(VmError::InvalidOpcode(insn.opcode));
            }
        };

        let mut ctx = HandlerContext {
            stack: &mut self.stack,
            pc: self.pc,
            program_size: self.program.len(),
        };

        let result = handlers::dispatch(opcode, insn.flags, insn.immediate, &mut ctx, mm, ioc);

        match result {
            Ok(action) => self.commit(action),
            Err(e) => {
                self.fault(e);
                Err(e)
            }
        }
    }

    fn commit(&mut self, action: PcAction) -> Result<(), VmError> {
        match action {
            PcAction::Increment => self.advance_to(self.pc + 1),
            PcAction::JumpAbsolute(target) => self.advance_to(target),
            PcAction::Halt => {
                self.halted = true;
                self.state = VmState::Halted;
                Ok(())
            }
            PcAction::CallFunction(target) => {
                match self.stack.push((self.pc + 1) as i32) {
                    Ok(()) => self.advance_to(target),
                    Err(e) => {
                        self.fault(e);
                        Err(e)
                    }
                }
            }
            PcAction::ReturnFunction => match self.stack.pop() {
                Ok(addr) if addr >= 0 => self.advance_to(addr as usize),
                Ok(_) => {
                    self.fault(VmError::InvalidJump(self.pc));
                    Err(VmError::InvalidJump(self.pc))
                }
                Err(e) => {
                    self.fault(e);
                    Err(e)
                }
            },
        }
    }

    /// The one place a new `pc` value is validated against `program_size`
    /// and actually committed.
    fn advance_to(&mut self, target: usize) -> Result<(), VmError> {
        if target >= self.program.len() {
            self.fault(VmError::InvalidJump(target));
            return Err(VmError::InvalidJump(target));
        }
        self.pc = target;
        Ok(())
    }

    fn fault(&mut self, error: VmError) {
        log::warn!(
            "category=vm code={} pc={} {error}",
            error.code(),
            self.pc
        );
        self.halted = true;
        self.state = VmState::Faulted;
        self.last_error = error;
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}
