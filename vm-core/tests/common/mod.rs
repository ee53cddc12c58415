use cockpit_vm_core::{PinMode, PlatformPort};
use std::collections::HashMap;

/// Minimal platform for testing: in-memory GPIO/flash, no real clock or
/// transport. Each integration test file gets its own copy through this
/// module rather than linking the library's internal test double.
#[derive(Default)]
pub struct TestPlatform {
    pub gpio_levels: HashMap<u8, bool>,
    pub uart_writes: Vec<u8>,
    pub semihosted: Vec<u8>,
    pub millis: u32,
    pub debugger_attached: bool,
}

impl PlatformPort for TestPlatform {
    fn gpio_configure(&mut self, _pin: u8, _mode: PinMode) {}

    fn gpio_write(&mut self, pin: u8, high: bool) {
        self.gpio_levels.insert(pin, high);
    }

    fn gpio_read(&mut self, pin: u8) -> bool {
        *self.gpio_levels.get(&pin).unwrap_or(&false)
    }

    fn adc_read(&mut self, _pin: u8) -> u16 {
        0
    }

    fn pwm_write(&mut self, _pin: u8, _duty: u16) {}

    fn millis(&self) -> u32 {
        self.millis
    }

    fn micros(&self) -> u32 {
        self.millis * 1000
    }

    fn delay_ns(&mut self, _ns: u32) {}

    fn uart_init(&mut self, _baud: u32) {}

    fn uart_write(&mut self, bytes: &[u8]) {
        self.uart_writes.extend_from_slice(bytes);
    }

    fn uart_read_available(&self) -> bool {
        false
    }

    fn uart_read_byte(&mut self) -> u8 {
        0
    }

    fn semihosted_write(&mut self, bytes: &[u8]) {
        self.semihosted.extend_from_slice(bytes);
    }

    fn flash_erase_page(&mut self, _addr: u32) -> Result<(), ()> {
        Ok(())
    }

    fn flash_program_64bit(&mut self, _addr: u32, _word: u64) -> Result<(), ()> {
        Ok(())
    }

    fn flash_read(&self, _addr: u32, len: usize) -> Vec<u8> {
        vec![0xFF; len]
    }

    fn debugger_attached(&self) -> bool {
        self.debugger_attached
    }
}
