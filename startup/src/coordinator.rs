//! Startup Coordinator: the code that runs first on reset, deciding
//! between three paths before anything else touches the bus — manual
//! bootloader entry, auto-executing a validated guest image, or falling
//! back to the bootloader protocol core when no valid image is present.

use cockpit_bootloader::crc::crc32;
use cockpit_vm_core::{decode_program, ComponentVM, PinMode, PlatformPort, VmError};

use crate::header::{self, HeaderError};

/// Held low (active-low, internal pull-up) during reset to force
/// bootloader entry regardless of what is staged in flash.
pub const BOOTLOADER_ENTRY_PIN: u8 = 0;

/// Guest image reserved page: header followed by the instruction stream.
pub const GUEST_IMAGE_BASE: u32 = 0x0801_F800;
pub const GUEST_IMAGE_PAGE_LEN: usize = 2048;

/// Sentinel a guest pushes before halting to ask the coordinator to stay
/// resident in a monitoring loop (polling telemetry pins) instead of
/// returning control to the reset vector. No other halt value has special
/// meaning.
pub const MONITOR_REQUEST_SENTINEL: i32 = 0x4D4F_4E21u32 as i32; // "MON!"

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupOutcome {
    /// Guest ran to a normal halt.
    Success,
    /// No image staged: header page reads as erased flash (bad magic).
    NoProgram,
    /// Header present but malformed: bad version or impossible length.
    InvalidHeader,
    /// Header well-formed but the instruction stream doesn't match its CRC.
    CrcMismatch,
    /// Guest image loaded and ran, but faulted before halting cleanly.
    VmError(VmError),
    /// Entry pin was held low at reset; bootloader protocol core should
    /// take the bus instead of any guest code running.
    BootloaderMode,
    /// Guest asked to keep the coordinator resident after halting.
    MonitoringMode,
    /// Guest bytecode failed to decode even though the header validated.
    Error,
}

/// Runs the boot decision to completion against `platform`, executing the
/// guest image in place if one validates. Returns the outcome without
/// retrying or falling back on its own — callers decide what a
/// `NoProgram`/`InvalidHeader`/`CrcMismatch`/`Error` outcome means for BPC
/// entry, since only the caller knows whether a serial transport is wired
/// up to hand off to.
pub fn run<P: PlatformPort + ?Sized>(platform: &mut P) -> StartupOutcome {
    platform.gpio_configure(BOOTLOADER_ENTRY_PIN, PinMode::PullUp);
    if !platform.gpio_read(BOOTLOADER_ENTRY_PIN) {
        log::info!("category=startup code=BOOTLOADER_MODE entry pin held low at reset");
        return StartupOutcome::BootloaderMode;
    }

    let page = platform.flash_read(GUEST_IMAGE_BASE, GUEST_IMAGE_PAGE_LEN);
    let (header, stream) = match header::validate(&page, crc32) {
        Ok(ok) => ok,
        Err(HeaderError::MissingMagic { .. }) => {
            log::info!("category=startup code=NO_PROGRAM no guest image staged at 0x{GUEST_IMAGE_BASE:08X}");
            return StartupOutcome::NoProgram;
        }
        Err(e @ (HeaderError::PageTooSmall
        | HeaderError::VersionMismatch { .. }
        | HeaderError::LengthExceedsPage { .. })) => {
            log::warn!("category=startup code=INVALID_HEADER {e}");
            return StartupOutcome::InvalidHeader;
        }
        Err(e @ HeaderError::CrcMismatch { .. }) => {
            log::warn!("category=startup code=CRC_MISMATCH {e}");
            return StartupOutcome::CrcMismatch;
        }
    };

    let program = match decode_program(stream) {
        Ok(program) => program,
        Err(e) => {
            log::error!("category=startup code=DECODE_ERROR header validated but bytecode failed to decode: {e}");
            return StartupOutcome::Error;
        }
    };
    log::info!(
        "category=startup code=EXECUTING instructions={} version={}",
        header.instruction_count,
        header.version
    );

    let mut vm = ComponentVM::new(platform);
    vm.load_program(program);
    match vm.run() {
        Ok(()) => {
            if vm.stack_top() == Ok(MONITOR_REQUEST_SENTINEL) {
                StartupOutcome::MonitoringMode
            } else {
                StartupOutcome::Success
            }
        }
        Err(err) => StartupOutcome::VmError(err),
    }
}
