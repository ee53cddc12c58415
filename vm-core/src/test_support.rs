//! Reusable test double for `PlatformPort`. Lives behind the
//! `test-support` feature rather than plain `#[cfg(test)]` so sibling
//! crates (`cockpit-bootloader`, `cockpit-startup`) can pull it in as a
//! dev-dependency instead of each hand-rolling their own stub.

use crate::platform::{PinMode, PlatformPort};
use std::collections::HashMap;

#[derive(Default)]
pub struct RecordingPlatform {
    pub debugger_attached: bool,
    pub uart_writes: Vec<String>,
    pub semihosted_writes: Vec<String>,
    pub millis: u32,
    pub micros: u32,
    pub gpio_levels: HashMap<u8, bool>,
    pub gpio_modes: HashMap<u8, PinMode>,
    pub adc_levels: HashMap<u8, u16>,
    pub flash: HashMap<u32, u8>,
    pub erased_pages: Vec<u32>,
}

impl RecordingPlatform {
    /// Writes `bytes` into the flash model starting at `base`, as if a
    /// prior session had already programmed them.
    pub fn stage_flash_page(&mut self, base: u32, bytes: Vec<u8>) {
        for (i, byte) in bytes.into_iter().enumerate() {
            self.flash.insert(base + i as u32, byte);
        }
    }

    /// Overrides `pin`'s level to low regardless of configured mode,
    /// modeling a button held down at reset.
    pub fn force_gpio_low(&mut self, pin: u8) {
        self.gpio_levels.insert(pin, false);
    }
}

impl PlatformPort for RecordingPlatform {
    fn gpio_configure(&mut self, pin: u8, mode: PinMode) {
        self.gpio_modes.insert(pin, mode);
    }

    fn gpio_write(&mut self, pin: u8, high: bool) {
        self.gpio_levels.insert(pin, high);
    }

    fn gpio_read(&mut self, pin: u8) -> bool {
        if let Some(level) = self.gpio_levels.get(&pin) {
            return *level;
        }
        matches!(self.gpio_modes.get(&pin), Some(PinMode::PullUp))
    }

    fn adc_read(&mut self, pin: u8) -> u16 {
        *self.adc_levels.get(&pin).unwrap_or(&0)
    }

    fn pwm_write(&mut self, pin: u8, duty: u16) {
        self.adc_levels.insert(pin, duty);
    }

    fn millis(&self) -> u32 {
        self.millis
    }

    fn micros(&self) -> u32 {
        self.micros
    }

    fn delay_ns(&mut self, _ns: u32) {}

    fn uart_init(&mut self, _baud: u32) {}

    fn uart_write(&mut self, bytes: &[u8]) {
        self.uart_writes.push(String::from_utf8_lossy(bytes).into_owned());
    }

    fn uart_read_available(&self) -> bool {
        false
    }

    fn uart_read_byte(&mut self) -> u8 {
        0
    }

    fn semihosted_write(&mut self, bytes: &[u8]) {
        self.semihosted_writes
            .push(String::from_utf8_lossy(bytes).into_owned());
    }

    fn flash_erase_page(&mut self, addr: u32) -> Result<(), ()> {
        self.erased_pages.push(addr);
        Ok(())
    }

    fn flash_program_64bit(&mut self, addr: u32, word: u64) -> Result<(), ()> {
        for (i, byte) in word.to_le_bytes().into_iter().enumerate() {
            self.flash.insert(addr + i as u32, byte);
        }
        Ok(())
    }

    fn flash_read(&self, addr: u32, len: usize) -> Vec<u8> {
        (0..len as u32)
            .map(|i| *self.flash.get(&(addr + i)).unwrap_or(&0xFF))
            .collect()
    }

    fn debugger_attached(&self) -> bool {
        self.debugger_attached
    }
}
