//! 6502 CPU core: fetch, decode, execute, interrupt service.
//!
//! The CPU is instruction-stepped: [`Cpu::step`] runs exactly one
//! instruction (or services one pending interrupt) and returns its
//! cycle cost, so a caller can keep the rest of the machine in
//! lock-step. Timing follows the documented 6502 cycle counts,
//! including the page-crossing and branch-taken penalties.

use crate::addressing::AddrMode;
use crate::opcodes::{Instr, OPCODES};
use crate::status::Status;
use crate::vectors;

/// Memory interface presented to the CPU.
///
/// The CPU performs every memory access through this trait, which lets
/// it run against the real system bus or a flat array in tests.
pub trait Bus {
    /// Read a byte.
    fn read(&mut self, addr: u16) -> u8;

    /// Write a byte.
    fn write(&mut self, addr: u16, value: u8);

    /// Read a little-endian 16-bit word.
    fn read_u16(&mut self, addr: u16) -> u16 {
        let lo = u16::from(self.read(addr));
        let hi = u16::from(self.read(addr.wrapping_add(1)));
        (hi << 8) | lo
    }
}

/// NES 6502 CPU (the 2A03 core: a 6502 with decimal mode disconnected).
#[derive(Debug)]
pub struct Cpu {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Program counter.
    pub pc: u16,
    /// Stack pointer into page $01xx.
    pub sp: u8,
    /// Status flags.
    pub status: Status,
    /// Free-running cycle counter.
    pub cycles: u64,
    /// Edge-latched NMI request.
    nmi_pending: bool,
    /// Level IRQ request.
    irq_pending: bool,
}

impl Cpu {
    /// Create a CPU in its pre-reset state. Call [`Cpu::reset`] before
    /// stepping.
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0xFD,
            status: Status::RESET,
            cycles: 0,
            nmi_pending: false,
            irq_pending: false,
        }
    }

    /// Reset: load PC from the vector at $FFFC, SP = $FD, P = $24.
    /// Charges the 7-cycle reset sequence.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.pc = bus.read_u16(vectors::RESET);
        self.sp = 0xFD;
        self.status = Status::RESET;
        self.cycles += 7;
        self.nmi_pending = false;
        self.irq_pending = false;
    }

    /// Latch an NMI request. Serviced at the next instruction boundary;
    /// NMI is edge-triggered and cannot be masked.
    pub fn nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Request an IRQ. No-op while the interrupt-disable flag is set.
    pub fn irq(&mut self) {
        if !self.status.contains(Status::I) {
            self.irq_pending = true;
        }
    }

    /// Execute one instruction (or service a pending interrupt) and
    /// return the cycle cost. NMI wins over IRQ at the boundary.
    pub fn step(&mut self, bus: &mut impl Bus) -> u8 {
        if self.nmi_pending {
            self.nmi_pending = false;
            return self.service_interrupt(bus, vectors::NMI);
        }
        if self.irq_pending && !self.status.contains(Status::I) {
            self.irq_pending = false;
            return self.service_interrupt(bus, vectors::IRQ);
        }

        let opcode = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);

        let entry = &OPCODES[opcode as usize];
        if !entry.official {
            log::debug!("unofficial opcode {opcode:02X} treated as NOP");
        }

        let (addr, crossed) = self.operand_addr(bus, entry.mode);
        let mut total = entry.cycles;
        if crossed && entry.page_penalty {
            total += 1;
        }
        total += self.execute(bus, entry.instr, entry.mode, addr, crossed);

        self.cycles += u64::from(total);
        total
    }

    /// Hardware interrupt entry: push PC and P (B clear), set I, load
    /// the vector. 7 cycles.
    fn service_interrupt(&mut self, bus: &mut impl Bus, vector: u16) -> u8 {
        self.push_u16(bus, self.pc);
        self.push(bus, self.status.to_stack_byte(false));
        self.status |= Status::I;
        self.pc = bus.read_u16(vector);
        self.cycles += 7;
        7
    }

    /// Resolve the effective address for an addressing mode, consuming
    /// operand bytes. Returns the address and whether indexing crossed
    /// a page (the caller decides if the instruction pays for it).
    fn operand_addr(&mut self, bus: &mut impl Bus, mode: AddrMode) -> (u16, bool) {
        match mode {
            AddrMode::Imp | AddrMode::Acc => (0, false),
            AddrMode::Imm => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                (addr, false)
            }
            AddrMode::Zp0 => {
                let addr = u16::from(self.fetch(bus));
                (addr, false)
            }
            AddrMode::Zpx => {
                let addr = u16::from(self.fetch(bus).wrapping_add(self.x));
                (addr, false)
            }
            AddrMode::Zpy => {
                let addr = u16::from(self.fetch(bus).wrapping_add(self.y));
                (addr, false)
            }
            AddrMode::Rel => {
                let offset = self.fetch(bus) as i8;
                let target = self.pc.wrapping_add(offset as u16);
                (target, (target & 0xFF00) != (self.pc & 0xFF00))
            }
            AddrMode::Abs => {
                let addr = self.fetch_u16(bus);
                (addr, false)
            }
            AddrMode::Abx => {
                let base = self.fetch_u16(bus);
                let addr = base.wrapping_add(u16::from(self.x));
                (addr, (addr & 0xFF00) != (base & 0xFF00))
            }
            AddrMode::Aby => {
                let base = self.fetch_u16(bus);
                let addr = base.wrapping_add(u16::from(self.y));
                (addr, (addr & 0xFF00) != (base & 0xFF00))
            }
            AddrMode::Ind => {
                // JMP (ind) bug: the pointer's high byte is fetched
                // from the same page as its low byte.
                let ptr = self.fetch_u16(bus);
                let lo = u16::from(bus.read(ptr));
                let hi_addr = (ptr & 0xFF00) | u16::from((ptr as u8).wrapping_add(1));
                let hi = u16::from(bus.read(hi_addr));
                ((hi << 8) | lo, false)
            }
            AddrMode::Izx => {
                let ptr = self.fetch(bus).wrapping_add(self.x);
                let addr = self.read_u16_zp(bus, ptr);
                (addr, false)
            }
            AddrMode::Izy => {
                let ptr = self.fetch(bus);
                let base = self.read_u16_zp(bus, ptr);
                let addr = base.wrapping_add(u16::from(self.y));
                (addr, (addr & 0xFF00) != (base & 0xFF00))
            }
        }
    }

    /// Execute an already-decoded instruction. Returns any extra
    /// cycles (branch penalties only).
    #[allow(clippy::too_many_lines)] // one arm per mnemonic
    fn execute(
        &mut self,
        bus: &mut impl Bus,
        instr: Instr,
        mode: AddrMode,
        addr: u16,
        crossed: bool,
    ) -> u8 {
        match instr {
            // Loads and stores
            Instr::Lda => {
                self.a = bus.read(addr);
                self.status.set_zn(self.a);
            }
            Instr::Ldx => {
                self.x = bus.read(addr);
                self.status.set_zn(self.x);
            }
            Instr::Ldy => {
                self.y = bus.read(addr);
                self.status.set_zn(self.y);
            }
            Instr::Sta => bus.write(addr, self.a),
            Instr::Stx => bus.write(addr, self.x),
            Instr::Sty => bus.write(addr, self.y),

            // Register transfers
            Instr::Tax => {
                self.x = self.a;
                self.status.set_zn(self.x);
            }
            Instr::Tay => {
                self.y = self.a;
                self.status.set_zn(self.y);
            }
            Instr::Tsx => {
                self.x = self.sp;
                self.status.set_zn(self.x);
            }
            Instr::Txa => {
                self.a = self.x;
                self.status.set_zn(self.a);
            }
            Instr::Txs => self.sp = self.x,
            Instr::Tya => {
                self.a = self.y;
                self.status.set_zn(self.a);
            }

            // Stack
            Instr::Pha => self.push(bus, self.a),
            Instr::Php => self.push(bus, self.status.to_stack_byte(true)),
            Instr::Pla => {
                self.a = self.pop(bus);
                self.status.set_zn(self.a);
            }
            Instr::Plp => self.status = Status::from_stack_byte(self.pop(bus)),

            // Logic
            Instr::And => {
                self.a &= bus.read(addr);
                self.status.set_zn(self.a);
            }
            Instr::Ora => {
                self.a |= bus.read(addr);
                self.status.set_zn(self.a);
            }
            Instr::Eor => {
                self.a ^= bus.read(addr);
                self.status.set_zn(self.a);
            }
            Instr::Bit => {
                let value = bus.read(addr);
                self.status.set_flag(Status::Z, self.a & value == 0);
                self.status.set_flag(Status::V, value & 0x40 != 0);
                self.status.set_flag(Status::N, value & 0x80 != 0);
            }

            // Arithmetic (binary only; D flag is ignored)
            Instr::Adc => {
                let value = bus.read(addr);
                self.add(value);
            }
            Instr::Sbc => {
                let value = bus.read(addr);
                self.add(!value);
            }

            // Compares
            Instr::Cmp => {
                let value = bus.read(addr);
                self.compare(self.a, value);
            }
            Instr::Cpx => {
                let value = bus.read(addr);
                self.compare(self.x, value);
            }
            Instr::Cpy => {
                let value = bus.read(addr);
                self.compare(self.y, value);
            }

            // Increments and decrements
            Instr::Inc => {
                let value = bus.read(addr).wrapping_add(1);
                bus.write(addr, value);
                self.status.set_zn(value);
            }
            Instr::Dec => {
                let value = bus.read(addr).wrapping_sub(1);
                bus.write(addr, value);
                self.status.set_zn(value);
            }
            Instr::Inx => {
                self.x = self.x.wrapping_add(1);
                self.status.set_zn(self.x);
            }
            Instr::Iny => {
                self.y = self.y.wrapping_add(1);
                self.status.set_zn(self.y);
            }
            Instr::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.status.set_zn(self.x);
            }
            Instr::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.status.set_zn(self.y);
            }

            // Shifts and rotates
            Instr::Asl => self.rmw(bus, mode, addr, |status, value| {
                status.set_flag(Status::C, value & 0x80 != 0);
                value << 1
            }),
            Instr::Lsr => self.rmw(bus, mode, addr, |status, value| {
                status.set_flag(Status::C, value & 0x01 != 0);
                value >> 1
            }),
            Instr::Rol => self.rmw(bus, mode, addr, |status, value| {
                let carry_in = u8::from(status.contains(Status::C));
                status.set_flag(Status::C, value & 0x80 != 0);
                (value << 1) | carry_in
            }),
            Instr::Ror => self.rmw(bus, mode, addr, |status, value| {
                let carry_in = u8::from(status.contains(Status::C)) << 7;
                status.set_flag(Status::C, value & 0x01 != 0);
                (value >> 1) | carry_in
            }),

            // Jumps and subroutines
            Instr::Jmp => self.pc = addr,
            Instr::Jsr => {
                // Push the address of the last operand byte.
                self.push_u16(bus, self.pc.wrapping_sub(1));
                self.pc = addr;
            }
            Instr::Rts => {
                self.pc = self.pop_u16(bus).wrapping_add(1);
            }
            Instr::Rti => {
                self.status = Status::from_stack_byte(self.pop(bus));
                self.pc = self.pop_u16(bus);
            }

            // Branches
            Instr::Bcc => return self.branch(addr, crossed, !self.status.contains(Status::C)),
            Instr::Bcs => return self.branch(addr, crossed, self.status.contains(Status::C)),
            Instr::Beq => return self.branch(addr, crossed, self.status.contains(Status::Z)),
            Instr::Bne => return self.branch(addr, crossed, !self.status.contains(Status::Z)),
            Instr::Bmi => return self.branch(addr, crossed, self.status.contains(Status::N)),
            Instr::Bpl => return self.branch(addr, crossed, !self.status.contains(Status::N)),
            Instr::Bvc => return self.branch(addr, crossed, !self.status.contains(Status::V)),
            Instr::Bvs => return self.branch(addr, crossed, self.status.contains(Status::V)),

            // Flag operations
            Instr::Clc => self.status.remove(Status::C),
            Instr::Sec => self.status.insert(Status::C),
            Instr::Cli => self.status.remove(Status::I),
            Instr::Sei => self.status.insert(Status::I),
            Instr::Clv => self.status.remove(Status::V),
            Instr::Cld => self.status.remove(Status::D),
            Instr::Sed => self.status.insert(Status::D),

            // System
            Instr::Brk => {
                // The byte after BRK is padding; the pushed return
                // address skips it.
                self.push_u16(bus, self.pc.wrapping_add(1));
                self.push(bus, self.status.to_stack_byte(true));
                self.status |= Status::I;
                self.pc = bus.read_u16(vectors::IRQ);
            }
            Instr::Nop => {}
        }
        0
    }

    /// Shared add for ADC/SBC (SBC adds the one's complement).
    fn add(&mut self, value: u8) {
        let a = u16::from(self.a);
        let v = u16::from(value);
        let c = u16::from(self.status.contains(Status::C));

        let result = a + v + c;
        let result8 = result as u8;

        self.status.set_flag(Status::C, result > 0xFF);
        // Signed overflow: both operands share a sign the result lacks.
        self.status
            .set_flag(Status::V, (!(a ^ v) & (a ^ result)) & 0x80 != 0);
        self.a = result8;
        self.status.set_zn(result8);
    }

    fn compare(&mut self, register: u8, value: u8) {
        let result = register.wrapping_sub(value);
        self.status.set_flag(Status::C, register >= value);
        self.status.set_zn(result);
    }

    /// Read-modify-write dispatch for the accumulator and memory forms
    /// of the shift/rotate instructions.
    fn rmw(
        &mut self,
        bus: &mut impl Bus,
        mode: AddrMode,
        addr: u16,
        f: impl FnOnce(&mut Status, u8) -> u8,
    ) {
        if mode == AddrMode::Acc {
            self.a = f(&mut self.status, self.a);
            self.status.set_zn(self.a);
        } else {
            let value = f(&mut self.status, bus.read(addr));
            bus.write(addr, value);
            self.status.set_zn(value);
        }
    }

    /// Take a branch if the condition holds: +1 cycle taken, +1 more
    /// when the target is on a different page than the next opcode.
    fn branch(&mut self, target: u16, crossed: bool, condition: bool) -> u8 {
        if condition {
            self.pc = target;
            1 + u8::from(crossed)
        } else {
            0
        }
    }

    fn fetch(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    fn fetch_u16(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = u16::from(self.fetch(bus));
        let hi = u16::from(self.fetch(bus));
        (hi << 8) | lo
    }

    /// 16-bit read from the zero page, wrapping the pointer within it.
    fn read_u16_zp(&mut self, bus: &mut impl Bus, ptr: u8) -> u16 {
        let lo = u16::from(bus.read(u16::from(ptr)));
        let hi = u16::from(bus.read(u16::from(ptr.wrapping_add(1))));
        (hi << 8) | lo
    }

    fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(0x0100 | u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop(&mut self, bus: &mut impl Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | u16::from(self.sp))
    }

    fn push_u16(&mut self, bus: &mut impl Bus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, value as u8);
    }

    fn pop_u16(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = u16::from(self.pop(bus));
        let hi = u16::from(self.pop(bus));
        (hi << 8) | lo
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
