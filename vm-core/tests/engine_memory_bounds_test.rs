//! Out-of-range global and array accesses fault the VM without corrupting
//! state that was never touched.

mod common;
use cockpit_vm_core::{ComponentVM, Instruction, Opcode, VmError, VmState};
use common::TestPlatform;

#[test]
fn store_global_out_of_range_is_memory_bounds() {
    let mut platform = TestPlatform::default();
    let mut vm = ComponentVM::new(&mut platform);
    vm.load_program(vec![
        Instruction::new(Opcode::Push as u8, 0, 42),
        Instruction::new(Opcode::StoreGlobal as u8, 0, 64), // MAX_GLOBALS is 64, valid ids are 0..63
        Instruction::new(Opcode::Halt as u8, 0, 0),
    ]);
    let err = vm.run().unwrap_err();
    assert_eq!(err, VmError::MemoryBounds);
    assert_eq!(vm.state(), VmState::Faulted);
    assert_eq!(vm.last_error(), VmError::MemoryBounds);
    // The in-range global was never written.
    assert_eq!(vm.load_global(0).unwrap(), 0);
}

#[test]
fn array_index_past_declared_size_is_memory_bounds() {
    let mut platform = TestPlatform::default();
    let mut vm = ComponentVM::new(&mut platform);
    vm.load_program(vec![
        Instruction::new(Opcode::CreateArray as u8, 0, 0x0004), // array 0, 4 elements
        Instruction::new(Opcode::Push as u8, 0, 4),             // index 4 is out of range
        Instruction::new(Opcode::Push as u8, 0, 7),             // value
        Instruction::new(Opcode::StoreArray as u8, 0, 0),
        Instruction::new(Opcode::Halt as u8, 0, 0),
    ]);
    let err = vm.run().unwrap_err();
    assert_eq!(err, VmError::MemoryBounds);
    assert_eq!(vm.state(), VmState::Faulted);
}
