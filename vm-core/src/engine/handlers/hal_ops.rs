//! HAL opcodes (0x10-0x1A): guest-visible hardware operations, routed
//! through the I/O Controller. Stack order documented per-op; all are
//! "last-pushed argument consumed first" unless noted.

use crate::engine::{HandlerContext, HandlerResult, PcAction};
use crate::error::VmError;
use crate::io::{IoController, MAX_PRINTF_ARGS};
use crate::platform::{PinMode, PlatformPort};

fn pin_mode_from_i32(value: i32) -> Result<PinMode, VmError> {
    match value {
        0 => Ok(PinMode::Input),
        1 => Ok(PinMode::Output),
        2 => Ok(PinMode::PullUp),
        3 => Ok(PinMode::PullDown),
        _ => Err(VmError::HardwareFault),
    }
}

/// `digital_write(pin, value)`: guest pushes `pin` then `value`.
pub(in crate::engine) fn digital_write<P: PlatformPort + ?Sized>(
    ctx: &mut HandlerContext<'_>,
    ioc: &mut IoController<'_, P>,
) -> HandlerResult {
    let value = ctx.stack.pop()?;
    let pin = ctx.stack.pop()?;
    ioc.digital_write(pin as u8, value != 0)
        .map_err(|()| VmError::HardwareFault)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn digital_read<P: PlatformPort + ?Sized>(
    ctx: &mut HandlerContext<'_>,
    ioc: &mut IoController<'_, P>,
) -> HandlerResult {
    let pin = ctx.stack.pop()?;
    let value = ioc.digital_read(pin as u8).map_err(|()| VmError::HardwareFault)?;
    ctx.stack.push(value as i32)?;
    Ok(PcAction::Increment)
}

/// `analog_write(pin, duty)`: guest pushes `pin` then `duty`.
pub(in crate::engine) fn analog_write<P: PlatformPort + ?Sized>(
    ctx: &mut HandlerContext<'_>,
    ioc: &mut IoController<'_, P>,
) -> HandlerResult {
    let duty = ctx.stack.pop()?;
    let pin = ctx.stack.pop()?;
    ioc.analog_write(pin as u8, duty as u16)
        .map_err(|()| VmError::HardwareFault)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn analog_read<P: PlatformPort + ?Sized>(
    ctx: &mut HandlerContext<'_>,
    ioc: &mut IoController<'_, P>,
) -> HandlerResult {
    let pin = ctx.stack.pop()?;
    let value = ioc.analog_read(pin as u8).map_err(|()| VmError::HardwareFault)?;
    ctx.stack.push(value as i32)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn delay_ns<P: PlatformPort + ?Sized>(
    ctx: &mut HandlerContext<'_>,
    ioc: &mut IoController<'_, P>,
) -> HandlerResult {
    let ns = ctx.stack.pop()?;
    ioc.delay_nanoseconds(ns as u32);
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn button_pressed<P: PlatformPort + ?Sized>(
    ctx: &mut HandlerContext<'_>,
    ioc: &mut IoController<'_, P>,
) -> HandlerResult {
    let pin = ctx.stack.pop()?;
    let pressed = ioc.button_pressed(pin as u8).map_err(|()| VmError::HardwareFault)?;
    ctx.stack.push(pressed as i32)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn button_released<P: PlatformPort + ?Sized>(
    ctx: &mut HandlerContext<'_>,
    ioc: &mut IoController<'_, P>,
) -> HandlerResult {
    let pin = ctx.stack.pop()?;
    let released = ioc
        .button_released(pin as u8)
        .map_err(|()| VmError::HardwareFault)?;
    ctx.stack.push(released as i32)?;
    Ok(PcAction::Increment)
}

/// `pin_mode(pin, mode)`: guest pushes `pin` then `mode`.
pub(in crate::engine) fn pin_mode<P: PlatformPort + ?Sized>(
    ctx: &mut HandlerContext<'_>,
    ioc: &mut IoController<'_, P>,
) -> HandlerResult {
    let mode = ctx.stack.pop()?;
    let pin = ctx.stack.pop()?;
    let mode = pin_mode_from_i32(mode)?;
    ioc.pin_mode(pin as u8, mode).map_err(|()| VmError::HardwareFault)?;
    Ok(PcAction::Increment)
}

/// `printf(string_id, args..., arg_count)`: `string_id` is the immediate;
/// the guest pushes each argument left-to-right, finishing with `arg_count`
/// on top. Popping `arg_count` args off the top yields them in reverse, so
/// they're un-reversed before formatting to preserve `%d` substitution
/// order.
pub(in crate::engine) fn printf<P: PlatformPort + ?Sized>(
    immediate: u16,
    ctx: &mut HandlerContext<'_>,
    ioc: &mut IoController<'_, P>,
) -> HandlerResult {
    let string_id = immediate as u8;
    let arg_count = ctx.stack.pop()?;
    if !(0..=MAX_PRINTF_ARGS as i32).contains(&arg_count) {
        return Err(VmError::HardwareFault);
    }
    let mut args = Vec::with_capacity(arg_count as usize);
    for _ in 0..arg_count {
        args.push(ctx.stack.pop()?);
    }
    args.reverse();
    ioc.vm_printf(string_id, &args).map_err(|()| VmError::HardwareFault)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn millis<P: PlatformPort + ?Sized>(
    ctx: &mut HandlerContext<'_>,
    ioc: &mut IoController<'_, P>,
) -> HandlerResult {
    ctx.stack.push(ioc.millis() as i32)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn micros<P: PlatformPort + ?Sized>(
    ctx: &mut HandlerContext<'_>,
    ioc: &mut IoController<'_, P>,
) -> HandlerResult {
    ctx.stack.push(ioc.micros() as i32)?;
    Ok(PcAction::Increment)
}
