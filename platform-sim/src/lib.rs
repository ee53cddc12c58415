//! Host-hosted [`PlatformPort`] implementation: a minimal in-memory board
//! that gives the component under test a real bus to run against instead
//! of a mock. Backs the CLI and doubles as the reference fixture for
//! integration tests that want realistic flash/erase semantics rather than
//! `cockpit-vm-core::test_support::RecordingPlatform`'s bare HashMap.

use cockpit_vm_core::{PinMode, PlatformPort};
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

/// STM32F407-shaped address space: 256 KiB of flash starting where the
/// reference target's vector table lives.
pub const FLASH_BASE: u32 = 0x0800_0000;
pub const FLASH_SIZE: usize = 256 * 1024;
pub const FLASH_PAGE_SIZE: usize = 2048;

/// A simulated microcontroller board: GPIO/ADC/PWM state, a flash array
/// with real erase-then-program semantics, a wall-clock-backed timer, and
/// loopback UART/semihosting buffers a test or CLI driver can inspect.
pub struct SimPlatform {
    gpio_levels: HashMap<u8, bool>,
    gpio_modes: HashMap<u8, PinMode>,
    adc_levels: HashMap<u8, u16>,
    pwm_duty: HashMap<u8, u16>,
    flash: Vec<u8>,
    started: Instant,
    uart_baud: u32,
    uart_tx: Vec<u8>,
    uart_rx: VecDeque<u8>,
    semihosted: Vec<u8>,
    debugger_attached: bool,
}

impl Default for SimPlatform {
    fn default() -> Self {
        Self {
            gpio_levels: HashMap::new(),
            gpio_modes: HashMap::new(),
            adc_levels: HashMap::new(),
            pwm_duty: HashMap::new(),
            flash: vec![0xFFu8; FLASH_SIZE],
            started: Instant::now(),
            uart_baud: 0,
            uart_tx: Vec::new(),
            uart_rx: VecDeque::new(),
            semihosted: Vec::new(),
            debugger_attached: false,
        }
    }
}

impl SimPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces a debugger-attached reading, since the real predicate reads a
    /// debug-control register bit no host process has.
    pub fn set_debugger_attached(&mut self, attached: bool) {
        self.debugger_attached = attached;
    }

    /// Drains and returns bytes the guest wrote over UART, in write order.
    pub fn take_uart_tx(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.uart_tx)
    }

    /// Stages bytes for the guest to read back via `uart_read_byte`.
    pub fn push_uart_rx(&mut self, bytes: &[u8]) {
        self.uart_rx.extend(bytes.iter().copied());
    }

    /// Drains and returns bytes written to the semihosting channel.
    pub fn take_semihosted(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.semihosted)
    }

    /// Directly sets a pin level, bypassing `gpio_write`, for simulating
    /// external stimulus (a button press, a jumper).
    pub fn drive_pin(&mut self, pin: u8, high: bool) {
        self.gpio_levels.insert(pin, high);
    }

    fn flash_index(&self, addr: u32) -> Option<usize> {
        let offset = addr.checked_sub(FLASH_BASE)?;
        let offset = offset as usize;
        (offset < self.flash.len()).then_some(offset)
    }
}

impl PlatformPort for SimPlatform {
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
        match self.gpio_modes.get(&pin) {
            Some(PinMode::PullUp) => true,
            _ => false,
        }
    }

    fn adc_read(&mut self, pin: u8) -> u16 {
        *self.adc_levels.get(&pin).unwrap_or(&0)
    }

    fn pwm_write(&mut self, pin: u8, duty: u16) {
        self.pwm_duty.insert(pin, duty);
    }

    fn millis(&self) -> u32 {
        self.started.elapsed().as_millis() as u32
    }

    fn micros(&self) -> u32 {
        self.started.elapsed().as_micros() as u32
    }

    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(ns as u64));
    }

    fn uart_init(&mut self, baud: u32) {
        self.uart_baud = baud;
    }

    fn uart_write(&mut self, bytes: &[u8]) {
        self.uart_tx.extend_from_slice(bytes);
    }

    fn uart_read_available(&self) -> bool {
        !self.uart_rx.is_empty()
    }

    fn uart_read_byte(&mut self) -> u8 {
        self.uart_rx.pop_front().unwrap_or(0)
    }

    fn semihosted_write(&mut self, bytes: &[u8]) {
        self.semihosted.extend_from_slice(bytes);
    }

    /// Erases a page to all-ones, matching NOR flash's actual erased state.
    /// `addr` is rounded down to the page boundary, mirroring the reference
    /// target's HAL.
    fn flash_erase_page(&mut self, addr: u32) -> Result<(), ()> {
        let start = self.flash_index(addr).ok_or(())?;
        let page_start = start - (start % FLASH_PAGE_SIZE);
        let page_end = (page_start + FLASH_PAGE_SIZE).min(self.flash.len());
        self.flash[page_start..page_end].fill(0xFF);
        Ok(())
    }

    /// Programs 8 bytes, enforcing that flash bits can only ever be cleared
    /// (1 -> 0), never set, until the next erase — a real NOR flash
    /// constraint `cockpit-vm-core::test_support::RecordingPlatform`
    /// doesn't bother modeling.
    fn flash_program_64bit(&mut self, addr: u32, word: u64) -> Result<(), ()> {
        let start = self.flash_index(addr).ok_or(())?;
        if start + 8 > self.flash.len() {
            return Err(());
        }
        for (i, byte) in word.to_le_bytes().into_iter().enumerate() {
            let existing = self.flash[start + i];
            if existing & byte != byte {
                log::error!("flash write at 0x{:08X} would set a cleared bit", addr + i as u32);
                return Err(());
            }
            self.flash[start + i] = byte;
        }
        Ok(())
    }

    fn flash_read(&self, addr: u32, len: usize) -> Vec<u8> {
        match self.flash_index(addr) {
            Some(start) => {
                let end = (start + len).min(self.flash.len());
                let mut out = self.flash[start..end].to_vec();
                out.resize(len, 0xFF);
                out
            }
            None => vec![0xFF; len],
        }
    }

    fn debugger_attached(&self) -> bool {
        self.debugger_attached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erased_flash_reads_all_ones() {
        let platform = SimPlatform::new();
        assert_eq!(platform.flash_read(FLASH_BASE, 8), vec![0xFF; 8]);
    }

    #[test]
    fn program_then_read_round_trips() {
        let mut platform = SimPlatform::new();
        platform.flash_program_64bit(FLASH_BASE, 0x1122_3344_5566_7788).unwrap();
        assert_eq!(
            platform.flash_read(FLASH_BASE, 8),
            0x1122_3344_5566_7788u64.to_le_bytes().to_vec()
        );
    }

    #[test]
    fn programming_a_cleared_bit_back_to_one_fails() {
        let mut platform = SimPlatform::new();
        platform.flash_program_64bit(FLASH_BASE, 0).unwrap();
        assert!(platform.flash_program_64bit(FLASH_BASE, u64::MAX).is_err());
    }

    #[test]
    fn erase_page_restores_all_ones() {
        let mut platform = SimPlatform::new();
        platform.flash_program_64bit(FLASH_BASE, 0).unwrap();
        platform.flash_erase_page(FLASH_BASE).unwrap();
        assert_eq!(platform.flash_read(FLASH_BASE, 8), vec![0xFF; 8]);
    }

    #[test]
    fn uart_loopback_staging() {
        let mut platform = SimPlatform::new();
        platform.push_uart_rx(&[0x41, 0x42]);
        assert!(platform.uart_read_available());
        assert_eq!(platform.uart_read_byte(), 0x41);
        platform.uart_write(&[0x99]);
        assert_eq!(platform.take_uart_tx(), vec![0x99]);
    }

    #[test]
    fn pull_up_pin_defaults_high() {
        let mut platform = SimPlatform::new();
        platform.gpio_configure(5, PinMode::PullUp);
        assert!(platform.gpio_read(5));
        platform.drive_pin(5, false);
        assert!(!platform.gpio_read(5));
    }
}
