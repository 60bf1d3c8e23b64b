//! Mapper 4: MMC3.
//!
//! The most widely used NES mapper (Super Mario Bros. 3, the later Mega
//! Man games, Kirby's Adventure). Eight bank registers cover four 8KB
//! PRG windows and six CHR windows (two 2KB, four 1KB), with mode bits
//! that swap the PRG layout and invert CHR A12. A scanline counter
//! clocked by PPU A12 rising edges drives the IRQ line games use for
//! raster splits.
//!
//! Register map (address bit 0 distinguishes the pairs):
//! - $8000 even: bank select / $8001 odd: bank data
//! - $A000 even: mirroring
//! - $C000 even: IRQ latch / $C001 odd: IRQ reload
//! - $E000 even: IRQ disable (and acknowledge) / $E001 odd: IRQ enable

use crate::mapper::Mirroring;

const PRG_BANK_SIZE: usize = 8 * 1024;
const CHR_BANK_SIZE: usize = 1024;

/// MMC3 register state.
#[derive(Debug, Clone)]
pub struct Mmc3 {
    /// Bank register index to update on the next $8001 write (0-7).
    bank_select: u8,
    /// R0-R5 are CHR banks, R6-R7 are PRG banks.
    bank_regs: [u8; 8],
    /// PRG mode: false = $8000 switchable, true = $C000 switchable.
    prg_swap: bool,
    /// CHR mode: A12 inversion of the 2KB/1KB window layout.
    chr_inversion: bool,
    /// Register-controlled mirroring (H or V only).
    mirroring: Mirroring,

    /// IRQ counter reload value.
    irq_latch: u8,
    /// Current IRQ counter value.
    irq_counter: u8,
    /// Reload the counter on the next A12 clock.
    irq_reload: bool,
    /// IRQ generation enabled.
    irq_enabled: bool,
    /// IRQ line is asserted.
    irq_pending: bool,
}

impl Mmc3 {
    /// Create an MMC3 in its power-on configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bank_select: 0,
            bank_regs: [0, 2, 4, 5, 6, 7, 0, 1],
            prg_swap: false,
            chr_inversion: false,
            mirroring: Mirroring::Vertical,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
        }
    }

    /// Handle a PRG-area register write.
    pub fn write(&mut self, addr: u16, value: u8) {
        let even = addr & 1 == 0;
        match addr & 0xE000 {
            0x8000 => {
                if even {
                    self.bank_select = value & 0x07;
                    self.prg_swap = value & 0x40 != 0;
                    self.chr_inversion = value & 0x80 != 0;
                } else {
                    self.bank_regs[self.bank_select as usize] = value;
                }
            }
            0xA000 => {
                if even {
                    self.mirroring = if value & 1 != 0 {
                        Mirroring::Horizontal
                    } else {
                        Mirroring::Vertical
                    };
                }
                // Odd writes are PRG-RAM protection, not modeled.
            }
            0xC000 => {
                if even {
                    self.irq_latch = value;
                } else {
                    // Reload: the counter picks up the latch on the
                    // next A12 clock.
                    self.irq_counter = 0;
                    self.irq_reload = true;
                }
            }
            0xE000 => {
                if even {
                    self.irq_enabled = false;
                    self.irq_pending = false;
                } else {
                    self.irq_enabled = true;
                }
            }
            _ => {}
        }
    }

    /// Register-controlled mirroring.
    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Clock the scanline counter (PPU A12 rising edge).
    pub fn clock_irq(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }

        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }

    /// Whether the IRQ line is asserted.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    pub(crate) fn prg_offset(&self, addr: u16, prg_len: usize) -> usize {
        let banks = (prg_len / PRG_BANK_SIZE).max(1);
        let bank = match addr & 0xE000 {
            0x8000 => {
                if self.prg_swap {
                    banks.saturating_sub(2)
                } else {
                    self.bank_regs[6] as usize
                }
            }
            0xA000 => self.bank_regs[7] as usize,
            0xC000 => {
                if self.prg_swap {
                    self.bank_regs[6] as usize
                } else {
                    banks.saturating_sub(2)
                }
            }
            _ => banks.saturating_sub(1),
        };
        (bank % banks) * PRG_BANK_SIZE + (addr & 0x1FFF) as usize
    }

    pub(crate) fn chr_offset(&self, addr: u16) -> usize {
        // With A12 inverted, the 2KB windows move to $1000-$1FFF.
        let addr = if self.chr_inversion {
            addr ^ 0x1000
        } else {
            addr
        } & 0x1FFF;

        let (bank, offset) = match addr {
            0x0000..=0x07FF => ((self.bank_regs[0] & 0xFE) as usize, (addr & 0x07FF) as usize),
            0x0800..=0x0FFF => ((self.bank_regs[1] & 0xFE) as usize, (addr & 0x07FF) as usize),
            0x1000..=0x13FF => (self.bank_regs[2] as usize, (addr & 0x03FF) as usize),
            0x1400..=0x17FF => (self.bank_regs[3] as usize, (addr & 0x03FF) as usize),
            0x1800..=0x1BFF => (self.bank_regs[4] as usize, (addr & 0x03FF) as usize),
            _ => (self.bank_regs[5] as usize, (addr & 0x03FF) as usize),
        };
        bank * CHR_BANK_SIZE + offset
    }
}

impl Default for Mmc3 {
    fn default() -> Self {
        Self::new()
    }
}
