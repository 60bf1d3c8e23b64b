//! Opcode decode table for the 6502.
//!
//! All 151 official opcodes are described by a 256-entry table indexed
//! directly by the opcode byte. Each entry names the instruction (a
//! closed enum, so the executor's `match` is exhaustively checked),
//! the addressing mode, the base cycle count, and whether the
//! instruction pays the page-crossing penalty.
//!
//! The 105 undefined slots decode to a two-cycle NOP: unofficial
//! opcodes are out of scope, and fetching one must never crash the
//! machine.

use crate::addressing::AddrMode;

/// Instruction mnemonics (official set only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)] // The variants are the 6502 mnemonics themselves.
pub enum Instr {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx,
    Iny, Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp,
    Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay,
    Tsx, Txa, Txs, Tya,
}

/// One decoded opcode table entry.
#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    /// Instruction to execute.
    pub instr: Instr,
    /// Addressing mode.
    pub mode: AddrMode,
    /// Base cycle count.
    pub cycles: u8,
    /// Whether a page-crossed effective address adds one cycle.
    /// True only for read instructions via Abx/Aby/Izy.
    pub page_penalty: bool,
    /// False for the undefined slots that decode to NOP.
    pub official: bool,
}

const fn op(instr: Instr, mode: AddrMode, cycles: u8) -> Opcode {
    Opcode {
        instr,
        mode,
        cycles,
        page_penalty: false,
        official: true,
    }
}

/// A read instruction that pays the page-cross penalty.
const fn rd(instr: Instr, mode: AddrMode, cycles: u8) -> Opcode {
    Opcode {
        instr,
        mode,
        cycles,
        page_penalty: true,
        official: true,
    }
}

/// Undefined opcode: behaves as a two-cycle NOP.
const fn xx() -> Opcode {
    Opcode {
        instr: Instr::Nop,
        mode: AddrMode::Imp,
        cycles: 2,
        page_penalty: false,
        official: false,
    }
}

use AddrMode::{Abs, Abx, Aby, Acc, Imm, Imp, Ind, Izx, Izy, Rel, Zp0, Zpx, Zpy};
use Instr::*;

/// Complete 256-entry opcode lookup table, indexed by opcode byte.
#[rustfmt::skip]
pub static OPCODES: [Opcode; 256] = [
    // 0x00-0x0F
    op(Brk, Imp, 7), op(Ora, Izx, 6), xx(), xx(), xx(), op(Ora, Zp0, 3), op(Asl, Zp0, 5), xx(),
    op(Php, Imp, 3), op(Ora, Imm, 2), op(Asl, Acc, 2), xx(), xx(), op(Ora, Abs, 4), op(Asl, Abs, 6), xx(),
    // 0x10-0x1F
    op(Bpl, Rel, 2), rd(Ora, Izy, 5), xx(), xx(), xx(), op(Ora, Zpx, 4), op(Asl, Zpx, 6), xx(),
    op(Clc, Imp, 2), rd(Ora, Aby, 4), xx(), xx(), xx(), rd(Ora, Abx, 4), op(Asl, Abx, 7), xx(),
    // 0x20-0x2F
    op(Jsr, Abs, 6), op(And, Izx, 6), xx(), xx(), op(Bit, Zp0, 3), op(And, Zp0, 3), op(Rol, Zp0, 5), xx(),
    op(Plp, Imp, 4), op(And, Imm, 2), op(Rol, Acc, 2), xx(), op(Bit, Abs, 4), op(And, Abs, 4), op(Rol, Abs, 6), xx(),
    // 0x30-0x3F
    op(Bmi, Rel, 2), rd(And, Izy, 5), xx(), xx(), xx(), op(And, Zpx, 4), op(Rol, Zpx, 6), xx(),
    op(Sec, Imp, 2), rd(And, Aby, 4), xx(), xx(), xx(), rd(And, Abx, 4), op(Rol, Abx, 7), xx(),
    // 0x40-0x4F
    op(Rti, Imp, 6), op(Eor, Izx, 6), xx(), xx(), xx(), op(Eor, Zp0, 3), op(Lsr, Zp0, 5), xx(),
    op(Pha, Imp, 3), op(Eor, Imm, 2), op(Lsr, Acc, 2), xx(), op(Jmp, Abs, 3), op(Eor, Abs, 4), op(Lsr, Abs, 6), xx(),
    // 0x50-0x5F
    op(Bvc, Rel, 2), rd(Eor, Izy, 5), xx(), xx(), xx(), op(Eor, Zpx, 4), op(Lsr, Zpx, 6), xx(),
    op(Cli, Imp, 2), rd(Eor, Aby, 4), xx(), xx(), xx(), rd(Eor, Abx, 4), op(Lsr, Abx, 7), xx(),
    // 0x60-0x6F
    op(Rts, Imp, 6), op(Adc, Izx, 6), xx(), xx(), xx(), op(Adc, Zp0, 3), op(Ror, Zp0, 5), xx(),
    op(Pla, Imp, 4), op(Adc, Imm, 2), op(Ror, Acc, 2), xx(), op(Jmp, Ind, 5), op(Adc, Abs, 4), op(Ror, Abs, 6), xx(),
    // 0x70-0x7F
    op(Bvs, Rel, 2), rd(Adc, Izy, 5), xx(), xx(), xx(), op(Adc, Zpx, 4), op(Ror, Zpx, 6), xx(),
    op(Sei, Imp, 2), rd(Adc, Aby, 4), xx(), xx(), xx(), rd(Adc, Abx, 4), op(Ror, Abx, 7), xx(),
    // 0x80-0x8F
    xx(), op(Sta, Izx, 6), xx(), xx(), op(Sty, Zp0, 3), op(Sta, Zp0, 3), op(Stx, Zp0, 3), xx(),
    op(Dey, Imp, 2), xx(), op(Txa, Imp, 2), xx(), op(Sty, Abs, 4), op(Sta, Abs, 4), op(Stx, Abs, 4), xx(),
    // 0x90-0x9F
    op(Bcc, Rel, 2), op(Sta, Izy, 6), xx(), xx(), op(Sty, Zpx, 4), op(Sta, Zpx, 4), op(Stx, Zpy, 4), xx(),
    op(Tya, Imp, 2), op(Sta, Aby, 5), op(Txs, Imp, 2), xx(), xx(), op(Sta, Abx, 5), xx(), xx(),
    // 0xA0-0xAF
    op(Ldy, Imm, 2), op(Lda, Izx, 6), op(Ldx, Imm, 2), xx(), op(Ldy, Zp0, 3), op(Lda, Zp0, 3), op(Ldx, Zp0, 3), xx(),
    op(Tay, Imp, 2), op(Lda, Imm, 2), op(Tax, Imp, 2), xx(), op(Ldy, Abs, 4), op(Lda, Abs, 4), op(Ldx, Abs, 4), xx(),
    // 0xB0-0xBF
    op(Bcs, Rel, 2), rd(Lda, Izy, 5), xx(), xx(), op(Ldy, Zpx, 4), op(Lda, Zpx, 4), op(Ldx, Zpy, 4), xx(),
    op(Clv, Imp, 2), rd(Lda, Aby, 4), op(Tsx, Imp, 2), xx(), rd(Ldy, Abx, 4), rd(Lda, Abx, 4), rd(Ldx, Aby, 4), xx(),
    // 0xC0-0xCF
    op(Cpy, Imm, 2), op(Cmp, Izx, 6), xx(), xx(), op(Cpy, Zp0, 3), op(Cmp, Zp0, 3), op(Dec, Zp0, 5), xx(),
    op(Iny, Imp, 2), op(Cmp, Imm, 2), op(Dex, Imp, 2), xx(), op(Cpy, Abs, 4), op(Cmp, Abs, 4), op(Dec, Abs, 6), xx(),
    // 0xD0-0xDF
    op(Bne, Rel, 2), rd(Cmp, Izy, 5), xx(), xx(), xx(), op(Cmp, Zpx, 4), op(Dec, Zpx, 6), xx(),
    op(Cld, Imp, 2), rd(Cmp, Aby, 4), xx(), xx(), xx(), rd(Cmp, Abx, 4), op(Dec, Abx, 7), xx(),
    // 0xE0-0xEF
    op(Cpx, Imm, 2), op(Sbc, Izx, 6), xx(), xx(), op(Cpx, Zp0, 3), op(Sbc, Zp0, 3), op(Inc, Zp0, 5), xx(),
    op(Inx, Imp, 2), op(Sbc, Imm, 2), op(Nop, Imp, 2), xx(), op(Cpx, Abs, 4), op(Sbc, Abs, 4), op(Inc, Abs, 6), xx(),
    // 0xF0-0xFF
    op(Beq, Rel, 2), rd(Sbc, Izy, 5), xx(), xx(), xx(), op(Sbc, Zpx, 4), op(Inc, Zpx, 6), xx(),
    op(Sed, Imp, 2), rd(Sbc, Aby, 4), xx(), xx(), xx(), rd(Sbc, Abx, 4), op(Inc, Abx, 7), xx(),
];
