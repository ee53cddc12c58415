//! I/O Controller: guest-visible hardware operations plus a
//! formatted-print facility with automatic output routing. Holds a
//! non-owning reference to the platform port — mediation, not ownership,
//! of the shared singleton.

use crate::platform::{PinMode, PlatformPort};

pub const MAX_PINS: usize = 16;
pub const MAX_STRINGS: usize = 16;
pub const MAX_STRING_LEN: usize = 128;
pub const MAX_PRINTF_ARGS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintfSink {
    Semihosted,
    Uart,
}

#[derive(Debug, Clone, Copy, Default)]
struct PinState {
    mode: Option<PinMode>,
    last_value: u16,
    initialized: bool,
}

/// Append-only table of printf format strings, populated before guest
/// execution and constant at run time.
#[derive(Default)]
pub struct StringTable {
    strings: Vec<String>,
}

impl StringTable {
    pub fn add_string(&mut self, text: &str) -> Result<u8, ()> {
        if self.strings.len() >= MAX_STRINGS || text.len() > MAX_STRING_LEN {
            return Err(());
        }
        let id = self.strings.len() as u8;
        self.strings.push(text.to_string());
        Ok(id)
    }

    pub fn get(&self, id: u8) -> Option<&str> {
        self.strings.get(id as usize).map(String::as_str)
    }
}

pub struct IoController<'p, P: PlatformPort + ?Sized> {
    platform: &'p mut P,
    pins: [PinState; MAX_PINS],
    strings: StringTable,
}

impl<'p, P: PlatformPort + ?Sized> IoController<'p, P> {
    pub fn new(platform: &'p mut P) -> Self {
        Self {
            platform,
            pins: [PinState::default(); MAX_PINS],
            strings: StringTable::default(),
        }
    }

    pub fn reset(&mut self) {
        self.pins = [PinState::default(); MAX_PINS];
    }

    pub fn add_string(&mut self, text: &str) -> Result<u8, ()> {
        self.strings.add_string(text)
    }

    fn pin_in_range(pin: u8) -> Result<usize, ()> {
        let idx = pin as usize;
        if idx < MAX_PINS { Ok(idx) } else { Err(()) }
    }

    pub fn pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), ()> {
        let idx = Self::pin_in_range(pin)?;
        self.platform.gpio_configure(pin, mode);
        self.pins[idx].mode = Some(mode);
        self.pins[idx].initialized = true;
        Ok(())
    }

    pub fn digital_write(&mut self, pin: u8, value: bool) -> Result<(), ()> {
        let idx = Self::pin_in_range(pin)?;
        match self.pins[idx].mode {
            Some(PinMode::Output) => {
                self.platform.gpio_write(pin, value);
                self.pins[idx].last_value = value as u16;
                Ok(())
            }
            _ => Err(()),
        }
    }

    pub fn digital_read(&mut self, pin: u8) -> Result<bool, ()> {
        let idx = Self::pin_in_range(pin)?;
        let value = self.platform.gpio_read(pin);
        self.pins[idx].last_value = value as u16;
        Ok(value)
    }

    pub fn analog_write(&mut self, pin: u8, duty: u16) -> Result<(), ()> {
        let idx = Self::pin_in_range(pin)?;
        match self.pins[idx].mode {
            Some(PinMode::Output) => {
                self.platform.pwm_write(pin, duty);
                self.pins[idx].last_value = duty;
                Ok(())
            }
            _ => Err(()),
        }
    }

    pub fn analog_read(&mut self, pin: u8) -> Result<u16, ()> {
        let idx = Self::pin_in_range(pin)?;
        let value = self.platform.adc_read(pin);
        self.pins[idx].last_value = value;
        Ok(value)
    }

    pub fn delay_nanoseconds(&mut self, ns: u32) {
        self.platform.delay_ns(ns);
    }

    pub fn millis(&self) -> u32 {
        self.platform.millis()
    }

    pub fn micros(&self) -> u32 {
        self.platform.micros()
    }

    /// Button edge queries read the live GPIO level; `pressed`/`released`
    /// differ only in which level counts as the event (the
    /// `BUTTON_PRESSED`/`BUTTON_RELEASED` opcodes).
    pub fn button_pressed(&mut self, pin: u8) -> Result<bool, ()> {
        Self::pin_in_range(pin)?;
        Ok(self.platform.gpio_read(pin))
    }

    pub fn button_released(&mut self, pin: u8) -> Result<bool, ()> {
        Self::pin_in_range(pin)?;
        Ok(!self.platform.gpio_read(pin))
    }

    /// Formats `string_id` with `args` (`%d`, `%x`, `%c`; unknown specifiers
    /// pass through literally) and writes it via `route_printf`.
    pub fn vm_printf(&mut self, string_id: u8, args: &[i32]) -> Result<(), ()> {
        if args.len() > MAX_PRINTF_ARGS {
            return Err(());
        }
        let format = self.strings.get(string_id).ok_or(())?;
        let text = format_printf(format, args);
        self.route_printf(&text);
        Ok(())
    }

    /// Selects a sink per-call based on debugger presence. Not configurable
    /// by the guest — the routing decision lives entirely here.
    fn route_printf(&mut self, text: &str) {
        let sink = if self.platform.debugger_attached() {
            PrintfSink::Semihosted
        } else {
            PrintfSink::Uart
        };
        match sink {
            PrintfSink::Semihosted => self.platform.semihosted_write(text.as_bytes()),
            PrintfSink::Uart => self.platform.uart_write(text.as_bytes()),
        }
    }
}

/// Renders a printf-style format string against `i32` arguments. `%c` takes
/// the low byte; unrecognized specifiers (including a lone trailing `%`)
/// pass through literally rather than erroring.
fn format_printf(format: &str, args: &[i32]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    let mut arg_iter = args.iter();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('d') => match arg_iter.next() {
                Some(v) => out.push_str(&v.to_string()),
                None => out.push_str("%d"),
            },
            Some('x') => match arg_iter.next() {
                Some(v) => out.push_str(&format!("{:x}", *v as u32)),
                None => out.push_str("%x"),
            },
            Some('c') => match arg_iter.next() {
                Some(v) => out.push(*v as u8 as char),
                None => out.push_str("%c"),
            },
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingPlatform;

    #[test]
    fn printf_formats_known_specifiers() {
        assert_eq!(format_printf("x=%d\n", &[42]), "x=42\n");
        assert_eq!(format_printf("0x%x", &[255]), "0xff");
        assert_eq!(format_printf("%c", &[65]), "A");
    }

    #[test]
    fn printf_passes_through_unknown_specifiers() {
        assert_eq!(format_printf("%q", &[]), "%q");
        assert_eq!(format_printf("100%", &[]), "100%");
    }

    #[test]
    fn printf_routing_follows_debugger_presence() {
        let mut platform = RecordingPlatform {
            debugger_attached: true,
            ..Default::default()
        };
        {
            let mut ioc = IoController::new(&mut platform);
            ioc.add_string("x=%d\n").unwrap();
            ioc.vm_printf(0, &[42]).unwrap();
        }
        assert_eq!(platform.semihosted_writes.last().unwrap(), "x=42\n");
        assert!(platform.uart_writes.is_empty());

        platform.debugger_attached = false;
        {
            let mut ioc = IoController::new(&mut platform);
            ioc.add_string("x=%d\n").unwrap();
            ioc.vm_printf(0, &[42]).unwrap();
        }
        assert_eq!(platform.uart_writes.last().unwrap(), "x=42\n");
    }

    #[test]
    fn printf_arg_count_over_max_fails() {
        let mut platform = RecordingPlatform::default();
        let mut ioc = IoController::new(&mut platform);
        ioc.add_string("%d%d%d%d%d%d%d%d%d").unwrap();
        let args = [0; MAX_PRINTF_ARGS + 1];
        assert!(ioc.vm_printf(0, &args).is_err());
    }

    #[test]
    fn digital_write_requires_output_mode() {
        let mut platform = RecordingPlatform::default();
        let mut ioc = IoController::new(&mut platform);
        assert!(ioc.digital_write(3, true).is_err());
        ioc.pin_mode(3, PinMode::Output).unwrap();
        assert!(ioc.digital_write(3, true).is_ok());
    }

    #[test]
    fn invalid_pin_index_fails() {
        let mut platform = RecordingPlatform::default();
        let mut ioc = IoController::new(&mut platform);
        assert!(ioc.pin_mode(200, PinMode::Output).is_err());
    }
}
