//! MOS 6502 CPU emulator for the NES (the 2A03 core).
//!
//! This crate provides an instruction-stepped emulation of the 6502 as
//! found in the NES. It supports:
//!
//! - All 151 official opcodes with documented cycle counts
//! - Page-crossing and branch-taken penalty cycles
//! - NMI/IRQ/BRK interrupt handling through the standard vectors
//! - The JMP (indirect) page-wrap bug
//!
//! Decimal mode is accepted by CLD/SED but, as on the real 2A03,
//! ignored by ADC/SBC. Unofficial opcodes execute as two-cycle NOPs.
//!
//! # Architecture
//!
//! Memory access goes through the [`Bus`] trait, so the CPU can be
//! wired to any memory subsystem.
//!
//! # Example
//!
//! ```no_run
//! use famicore_cpu::{Bus, Cpu};
//!
//! struct SimpleBus {
//!     memory: [u8; 65536],
//! }
//!
//! impl Bus for SimpleBus {
//!     fn read(&mut self, addr: u16) -> u8 {
//!         self.memory[addr as usize]
//!     }
//!
//!     fn write(&mut self, addr: u16, value: u8) {
//!         self.memory[addr as usize] = value;
//!     }
//! }
//!
//! let mut bus = SimpleBus { memory: [0; 65536] };
//! let mut cpu = Cpu::new();
//! cpu.reset(&mut bus);
//! let cycles = cpu.step(&mut bus);
//! ```

mod addressing;
mod cpu;
mod opcodes;
mod status;

pub use addressing::AddrMode;
pub use cpu::{Bus, Cpu};
pub use opcodes::{Instr, OPCODES, Opcode};
pub use status::Status;

/// Interrupt vector addresses.
pub mod vectors {
    /// NMI (Non-Maskable Interrupt) vector address.
    pub const NMI: u16 = 0xFFFA;
    /// Reset vector address.
    pub const RESET: u16 = 0xFFFC;
    /// IRQ/BRK vector address.
    pub const IRQ: u16 = 0xFFFE;
}
