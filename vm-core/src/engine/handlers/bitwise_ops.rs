//! Bitwise opcodes (0x60-0x65): AND/OR/XOR/NOT, SHL/SHR. Shift amount must
//! lie in `[0, 32)`; anything else is fatal. 0 is identity, 31 is the
//! widest defined shift, 32 and above are rejected as `InvalidShift`.

use crate::engine::{HandlerContext, HandlerResult, PcAction};
use crate::error::VmError;

pub(in crate::engine) fn and(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let b = ctx.stack.pop()?;
    let a = ctx.stack.pop()?;
    ctx.stack.push(a & b)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn or(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let b = ctx.stack.pop()?;
    let a = ctx.stack.pop()?;
    ctx.stack.push(a | b)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn xor(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let b = ctx.stack.pop()?;
    let a = ctx.stack.pop()?;
    ctx.stack.push(a ^ b)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn not(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let a = ctx.stack.pop()?;
    ctx.stack.push(!a)?;
    Ok(PcAction::Increment)
}

fn shift_amount(ctx: &mut HandlerContext<'_>) -> Result<(i32, u32), VmError> {
    let amount = ctx.stack.pop()?;
    let value = ctx.stack.pop()?;
    if !(0..32).contains(&amount) {
        return Err(VmError::InvalidShift(amount as u32));
    }
    Ok((value, amount as u32))
}

pub(in crate::engine) fn shl(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let (value, amount) = shift_amount(ctx)?;
    ctx.stack.push(value.wrapping_shl(amount))?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn shr(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let (value, amount) = shift_amount(ctx)?;
    ctx.stack.push(value.wrapping_shr(amount))?;
    Ok(PcAction::Increment)
}
