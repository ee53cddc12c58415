//! Arithmetic to a clean halt, and the fault path when it isn't clean.

mod common;
use cockpit_vm_core::{ComponentVM, Instruction, Opcode, VmState};
use common::TestPlatform;

#[test]
fn arithmetic_runs_to_halt_with_expected_result() {
    let mut platform = TestPlatform::default();
    let mut vm = ComponentVM::new(&mut platform);
    vm.load_program(vec![
        Instruction::new(Opcode::Push as u8, 0, 10),
        Instruction::new(Opcode::Push as u8, 0, 5),
        Instruction::new(Opcode::Add as u8, 0, 0),
        Instruction::new(Opcode::Push as u8, 0, 3),
        Instruction::new(Opcode::Mul as u8, 0, 0),
        Instruction::new(Opcode::Halt as u8, 0, 0),
    ]);
    vm.run().unwrap();
    assert!(vm.halted());
    assert_eq!(vm.state(), VmState::Halted);
    assert_eq!(vm.stack_top().unwrap(), 45);
}

#[test]
fn division_by_zero_faults_without_halting_cleanly() {
    let mut platform = TestPlatform::default();
    let mut vm = ComponentVM::new(&mut platform);
    vm.load_program(vec![
        Instruction::new(Opcode::Push as u8, 0, 7),
        Instruction::new(Opcode::Push as u8, 0, 0),
        Instruction::new(Opcode::Div as u8, 0, 0),
        Instruction::new(Opcode::Halt as u8, 0, 0),
    ]);
    let err = vm.run().unwrap_err();
    assert_eq!(err, cockpit_vm_core::VmError::DivisionByZero);
    assert_eq!(vm.state(), VmState::Faulted);
    assert_eq!(vm.last_error(), cockpit_vm_core::VmError::DivisionByZero);
}
