//! Comparison opcodes (0x20-0x2B): EQ/NE/LT/GT/LE/GE, unsigned by default.
//! The `_SIGNED` opcodes (dispatched with `FLAG_SIGNED` forced on) and a
//! plain opcode with `Instruction::flags & FLAG_SIGNED` set both select the
//! signed i32 comparison — both mechanisms are accepted.
//! Pops `b` then `a`; pushes 1 if the relation holds, 0 otherwise.

use crate::engine::{HandlerContext, HandlerResult, PcAction};
use crate::instruction::FLAG_SIGNED;

fn compare(
    flags: u8,
    ctx: &mut HandlerContext<'_>,
    unsigned: impl Fn(u32, u32) -> bool,
    signed: impl Fn(i32, i32) -> bool,
) -> HandlerResult {
    let b = ctx.stack.pop()?;
    let a = ctx.stack.pop()?;
    let result = if flags & FLAG_SIGNED != 0 {
        signed(a, b)
    } else {
        unsigned(a as u32, b as u32)
    };
    ctx.stack.push(result as i32)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn eq(flags: u8, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    compare(flags, ctx, |a, b| a == b, |a, b| a == b)
}

pub(in crate::engine) fn ne(flags: u8, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    compare(flags, ctx, |a, b| a != b, |a, b| a != b)
}

pub(in crate::engine) fn lt(flags: u8, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    compare(flags, ctx, |a, b| a < b, |a, b| a < b)
}

pub(in crate::engine) fn gt(flags: u8, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    compare(flags, ctx, |a, b| a > b, |a, b| a > b)
}

pub(in crate::engine) fn le(flags: u8, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    compare(flags, ctx, |a, b| a <= b, |a, b| a <= b)
}

pub(in crate::engine) fn ge(flags: u8, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    compare(flags, ctx, |a, b| a >= b, |a, b| a >= b)
}
