//! The platform port: a narrow abstract capability set for
//! GPIO, ADC/PWM, timers, UART, and flash, mediating every guest-visible
//! hardware operation. Modeled as a trait passed into `IoController` and the
//! bootloader at construction, not ambient global state — the thing a guest
//! program talks to sits behind a trait instead of a concrete memory map.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output,
    PullUp,
    PullDown,
}

/// Abstract capability set consumed by the I/O controller, the bootloader
/// protocol core, and the startup coordinator. A real embedded target
/// implements this against its HAL; `cockpit-platform-sim` implements it in
/// memory for host-side tests and the CLI.
pub trait PlatformPort {
    fn gpio_configure(&mut self, pin: u8, mode: PinMode);
    fn gpio_write(&mut self, pin: u8, high: bool);
    fn gpio_read(&mut self, pin: u8) -> bool;

    fn adc_read(&mut self, pin: u8) -> u16;
    fn pwm_write(&mut self, pin: u8, duty: u16);

    fn millis(&self) -> u32;
    fn micros(&self) -> u32;
    fn delay_ns(&mut self, ns: u32);

    fn uart_init(&mut self, baud: u32);
    fn uart_write(&mut self, bytes: &[u8]);
    fn uart_read_available(&self) -> bool;
    fn uart_read_byte(&mut self) -> u8;

    /// Host-tooling channel used by `IoController::route_printf` when a
    /// debugger is attached (e.g. ITM/semihosting on the reference target).
    fn semihosted_write(&mut self, bytes: &[u8]);

    fn flash_erase_page(&mut self, addr: u32) -> Result<(), ()>;
    fn flash_program_64bit(&mut self, addr: u32, word: u64) -> Result<(), ()>;
    fn flash_read(&self, addr: u32, len: usize) -> Vec<u8>;

    /// Probed via a platform-provided predicate (e.g. a debug-control
    /// register bit). Drives `IoController::route_printf`'s sink choice.
    fn debugger_attached(&self) -> bool;
}
