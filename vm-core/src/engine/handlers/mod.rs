//! Per-group opcode handlers. Each handler is a (conceptually) pure function
//! over `(flags, immediate, &mut HandlerContext, &mut MemoryManager,
//! &mut IoController)` returning a [`super::HandlerResult`] — the intent,
//! never a direct PC/halted write. Grouped into submodules by instruction
//! category (ALU, branch, load/store, stack) under one `mod.rs` dispatcher.

mod bitwise_ops;
mod compare_ops;
mod control_ops;
mod core_ops;
mod hal_ops;
mod logical_ops;
mod memory_ops;

use super::{HandlerContext, HandlerResult};
use crate::instruction::Opcode;
use crate::io::IoController;
use crate::memory::MemoryManager;
use crate::platform::PlatformPort;

/// Single dispatch point. A `match` over the dense `Opcode` enum compiles to
/// a jump table; Rust's exhaustiveness checking makes this the simpler,
/// equally fast choice for a closed opcode set this size.
pub(super) fn dispatch<P: PlatformPort + ?Sized>(
    opcode: Opcode,
    flags: u8,
    immediate: u16,
    ctx: &mut HandlerContext<'_>,
    mm: &mut MemoryManager,
    ioc: &mut IoController<'_, P>,
) -> HandlerResult {
    use Opcode::*;
    match opcode {
        Halt => core_ops::halt(),
        Push => core_ops::push(immediate, ctx),
        Pop => core_ops::pop(ctx),
        Add => core_ops::add(ctx),
        Sub => core_ops::sub(ctx),
        Mul => core_ops::mul(ctx),
        Div => core_ops::div(ctx),
        Mod => core_ops::modulo(ctx),
        Call => core_ops::call(immediate),
        Ret => core_ops::ret(),

        DigitalWrite => hal_ops::digital_write(ctx, ioc),
        DigitalRead => hal_ops::digital_read(ctx, ioc),
        AnalogWrite => hal_ops::analog_write(ctx, ioc),
        AnalogRead => hal_ops::analog_read(ctx, ioc),
        DelayNs => hal_ops::delay_ns(ctx, ioc),
        ButtonPressed => hal_ops::button_pressed(ctx, ioc),
        ButtonReleased => hal_ops::button_released(ctx, ioc),
        PinMode => hal_ops::pin_mode(ctx, ioc),
        Printf => hal_ops::printf(immediate, ctx, ioc),
        Millis => hal_ops::millis(ctx, ioc),
        Micros => hal_ops::micros(ctx, ioc),

        Eq => compare_ops::eq(flags, ctx),
        Ne => compare_ops::ne(flags, ctx),
        Lt => compare_ops::lt(flags, ctx),
        Gt => compare_ops::gt(flags, ctx),
        Le => compare_ops::le(flags, ctx),
        Ge => compare_ops::ge(flags, ctx),
        EqSigned => compare_ops::eq(FLAG_SIGNED_FORCED, ctx),
        NeSigned => compare_ops::ne(FLAG_SIGNED_FORCED, ctx),
        LtSigned => compare_ops::lt(FLAG_SIGNED_FORCED, ctx),
        GtSigned => compare_ops::gt(FLAG_SIGNED_FORCED, ctx),
        LeSigned => compare_ops::le(FLAG_SIGNED_FORCED, ctx),
        GeSigned => compare_ops::ge(FLAG_SIGNED_FORCED, ctx),

        Jmp => control_ops::jmp(immediate),
        JmpTrue => control_ops::jmp_true(immediate, ctx),
        JmpFalse => control_ops::jmp_false(immediate, ctx),

        LogicalAnd => logical_ops::and(ctx),
        LogicalOr => logical_ops::or(ctx),
        LogicalNot => logical_ops::not(ctx),

        LoadGlobal => memory_ops::load_global(immediate, ctx, mm),
        StoreGlobal => memory_ops::store_global(immediate, ctx, mm),
        LoadLocal => memory_ops::load_local(immediate, ctx),
        StoreLocal => memory_ops::store_local(immediate, ctx),
        LoadArray => memory_ops::load_array(immediate, ctx, mm),
        StoreArray => memory_ops::store_array(immediate, ctx, mm),
        CreateArray => memory_ops::create_array(immediate, mm),

        BitAnd => bitwise_ops::and(ctx),
        BitOr => bitwise_ops::or(ctx),
        BitXor => bitwise_ops::xor(ctx),
        BitNot => bitwise_ops::not(ctx),
        Shl => bitwise_ops::shl(ctx),
        Shr => bitwise_ops::shr(ctx),
    }
}

use crate::instruction::FLAG_SIGNED as FLAG_SIGNED_FORCED;
