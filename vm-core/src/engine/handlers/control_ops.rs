//! Control flow opcodes (0x30-0x32): JMP, JMP_TRUE, JMP_FALSE. Conditional
//! variants pop one cell; 0 is false, non-zero is true.

use crate::engine::{HandlerContext, HandlerResult, PcAction};

pub(in crate::engine) fn jmp(immediate: u16) -> HandlerResult {
    Ok(PcAction::JumpAbsolute(immediate as usize))
}

pub(in crate::engine) fn jmp_true(immediate: u16, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let cond = ctx.stack.pop()?;
    if cond != 0 {
        Ok(PcAction::JumpAbsolute(immediate as usize))
    } else {
        Ok(PcAction::Increment)
    }
}

pub(in crate::engine) fn jmp_false(immediate: u16, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let cond = ctx.stack.pop()?;
    if cond == 0 {
        Ok(PcAction::JumpAbsolute(immediate as usize))
    } else {
        Ok(PcAction::Increment)
    }
}
