//! `PRINTF` routes to the semihosting channel when a debugger is attached
//! and to UART otherwise, with no guest-visible way to override it.

mod common;
use cockpit_vm_core::{ComponentVM, Instruction, Opcode};
use common::TestPlatform;

fn render_program(string_id: u8) -> Vec<Instruction> {
    vec![
        Instruction::new(Opcode::Push as u8, 0, 7),            // arg0 = 7
        Instruction::new(Opcode::Push as u8, 0, 1),             // arg_count = 1
        Instruction::new(Opcode::Printf as u8, 0, string_id as u16),
        Instruction::new(Opcode::Halt as u8, 0, 0),
    ]
}

#[test]
fn printf_goes_to_uart_without_a_debugger() {
    let mut platform = TestPlatform::default();
    {
        let mut vm = ComponentVM::new(&mut platform);
        let string_id = vm.add_string("count=%d\n").unwrap();
        vm.load_program(render_program(string_id));
        vm.run().unwrap();
        assert!(vm.halted());
    }
    assert_eq!(String::from_utf8(platform.uart_writes.clone()).unwrap(), "count=7\n");
    assert!(platform.semihosted.is_empty());
}

#[test]
fn printf_goes_to_semihosting_with_a_debugger_attached() {
    let mut platform = TestPlatform {
        debugger_attached: true,
        ..Default::default()
    };
    {
        let mut vm = ComponentVM::new(&mut platform);
        let string_id = vm.add_string("count=%d\n").unwrap();
        vm.load_program(render_program(string_id));
        vm.run().unwrap();
        assert!(vm.halted());
    }
    assert_eq!(String::from_utf8(platform.semihosted.clone()).unwrap(), "count=7\n");
    assert!(platform.uart_writes.is_empty());
}
