//! Memory opcodes (0x50-0x56): globals, stack-relative locals, and arrays.
//!
//! `immediate` encodings:
//! - `LOAD_GLOBAL`/`STORE_GLOBAL`: `global_id` in the low byte.
//! - `LOAD_LOCAL`/`STORE_LOCAL`: depth-from-top in the low byte (the index
//!   counts from the top of the stack, and must be less than `sp`).
//! - `LOAD_ARRAY`/`STORE_ARRAY`: `array_id` in the low byte; index and value
//!   come off the stack.
//! - `CREATE_ARRAY`: `array_id` in the high byte, element count in the low
//!   byte — both fit comfortably in one byte each (id < 16, count <= 64),
//!   so a single 16-bit immediate carries both without needing a stack
//!   operand for the size.

use crate::engine::{HandlerContext, HandlerResult, PcAction};
use crate::error::VmError;
use crate::memory::MemoryManager;

pub(in crate::engine) fn load_global(
    immediate: u16,
    ctx: &mut HandlerContext<'_>,
    mm: &MemoryManager,
) -> HandlerResult {
    let id = immediate as u8;
    let value = mm.load_global(id).map_err(|()| VmError::MemoryBounds)?;
    ctx.stack.push(value)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn store_global(
    immediate: u16,
    ctx: &mut HandlerContext<'_>,
    mm: &mut MemoryManager,
) -> HandlerResult {
    let id = immediate as u8;
    let value = ctx.stack.pop()?;
    mm.store_global(id, value).map_err(|()| VmError::MemoryBounds)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn load_local(immediate: u16, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let depth = immediate as usize;
    let value = ctx.stack.peek(depth)?;
    ctx.stack.push(value)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn store_local(immediate: u16, ctx: &mut HandlerContext<'_>) -> HandlerResult {
    let value = ctx.stack.pop()?;
    let depth = immediate as usize;
    ctx.stack.set(depth, value)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn load_array(
    immediate: u16,
    ctx: &mut HandlerContext<'_>,
    mm: &MemoryManager,
) -> HandlerResult {
    let id = immediate as u8;
    let index = ctx.stack.pop()?;
    if index < 0 {
        return Err(VmError::MemoryBounds);
    }
    let value = mm
        .load_array_element(id, index as usize)
        .map_err(|()| VmError::MemoryBounds)?;
    ctx.stack.push(value)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn store_array(
    immediate: u16,
    ctx: &mut HandlerContext<'_>,
    mm: &mut MemoryManager,
) -> HandlerResult {
    let id = immediate as u8;
    let value = ctx.stack.pop()?;
    let index = ctx.stack.pop()?;
    if index < 0 {
        return Err(VmError::MemoryBounds);
    }
    mm.store_array_element(id, index as usize, value)
        .map_err(|()| VmError::MemoryBounds)?;
    Ok(PcAction::Increment)
}

pub(in crate::engine) fn create_array(immediate: u16, mm: &mut MemoryManager) -> HandlerResult {
    let id = (immediate >> 8) as u8;
    let size = (immediate & 0x00FF) as usize;
    mm.create_array(id, size).map_err(|()| VmError::MemoryBounds)?;
    Ok(PcAction::Increment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::OperandStack;

    fn ctx(stack: &mut OperandStack) -> HandlerContext<'_> {
        HandlerContext {
            stack,
            pc: 0,
            program_size: 10,
        }
    }

    #[test]
    fn array_bounds_violation_reports_memory_bounds() {
        let mut mm = MemoryManager::new();
        create_array(0x0004, &mut mm).unwrap(); // id=0, size=4
        let mut stack = OperandStack::new();
        stack.push(5).unwrap(); // out-of-range index
        stack.push(0).unwrap(); // value
        let mut c = ctx(&mut stack);
        let err = store_array(0, &mut c, &mut mm).unwrap_err();
        assert_eq!(err, VmError::MemoryBounds);
        assert_eq!(mm.load_global(0).unwrap(), 0); // globals untouched
    }

    #[test]
    fn local_store_then_load_round_trips() {
        let mut stack = OperandStack::new();
        stack.push(1).unwrap();
        stack.push(2).unwrap();
        stack.push(99).unwrap(); // value to store into local 1 (depth 1 after pop)
        let mut c = ctx(&mut stack);
        store_local(1, &mut c).unwrap();
        load_local(1, &mut c).unwrap();
        assert_eq!(stack.peek(0).unwrap(), 99);
    }
}
