//! Logical opcodes (0x40-0x42): AND/OR/NOT with C-boolean semantics,
//! normalized to 0/1.

use crate::engine::{HandlerContext, HandlerResult, PcAction};

pub(in crate::engine) fn and(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let b = ctx.stack.pop()?;
    let a = ctx.stack.pop()?;
    ctx.stack.push(((a != 0) && (b != 0)) as i32)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn or(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let b = ctx.stack.pop()?;
    let a = ctx.stack.pop()?;
    ctx.stack.push(((a != 0) || (b != 0)) as i32)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn not(ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let a = ctx.stack.pop()?;
    ctx.stack.push((a == 0) as i32)?;
    Ok(PcAction::Increment)
}
