//! Tagged-variant mapper dispatch.
//!
//! Every supported board is one variant of [`Mapper`], carrying its
//! register state inline. The cartridge owns the PRG/CHR storage; the
//! mapper only translates addresses into offsets and reacts to PRG-area
//! register writes. This keeps ownership in one place and makes the
//! dispatch a plain `match` instead of a vtable call.

use crate::cnrom::Cnrom;
use crate::mmc1::Mmc1;
use crate::mmc3::Mmc3;
use crate::rom::RomError;
use crate::uxrom::Uxrom;

/// Nametable mirroring mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mirroring {
    /// Horizontal mirroring (vertical arrangement).
    #[default]
    Horizontal,
    /// Vertical mirroring (horizontal arrangement).
    Vertical,
    /// Single-screen, lower bank.
    SingleScreenLower,
    /// Single-screen, upper bank.
    SingleScreenUpper,
    /// Four-screen (uses extra VRAM on the cart).
    FourScreen,
}

/// Cartridge mapper hardware.
///
/// Address translation methods take the backing store length so the
/// variants never need to hold the data themselves.
#[derive(Debug, Clone)]
pub enum Mapper {
    /// Mapper 0: no banking at all.
    Nrom,
    /// Mapper 1: serial-shift-register controlled PRG/CHR banking.
    Mmc1(Mmc1),
    /// Mapper 2: 16KB PRG bank switching, last bank fixed.
    Uxrom(Uxrom),
    /// Mapper 3: 8KB CHR bank switching.
    Cnrom(Cnrom),
    /// Mapper 4: fine-grained PRG/CHR banking plus scanline IRQ.
    Mmc3(Mmc3),
}

impl Mapper {
    /// Build the mapper for an iNES mapper number.
    ///
    /// # Errors
    ///
    /// Returns [`RomError::UnsupportedMapper`] for numbers outside
    /// {0, 1, 2, 3, 4}. The caller decides whether that fails the load;
    /// here it always does, which keeps loading deterministic.
    pub fn from_id(id: u16) -> Result<Self, RomError> {
        match id {
            0 => Ok(Self::Nrom),
            1 => Ok(Self::Mmc1(Mmc1::new())),
            2 => Ok(Self::Uxrom(Uxrom::new())),
            3 => Ok(Self::Cnrom(Cnrom::new())),
            4 => Ok(Self::Mmc3(Mmc3::new())),
            n => {
                log::warn!("unsupported mapper {n}, refusing to load");
                Err(RomError::UnsupportedMapper(n))
            }
        }
    }

    /// iNES mapper number.
    #[must_use]
    pub fn id(&self) -> u16 {
        match self {
            Self::Nrom => 0,
            Self::Mmc1(_) => 1,
            Self::Uxrom(_) => 2,
            Self::Cnrom(_) => 3,
            Self::Mmc3(_) => 4,
        }
    }

    /// Conventional board name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nrom => "NROM",
            Self::Mmc1(_) => "MMC1",
            Self::Uxrom(_) => "UxROM",
            Self::Cnrom(_) => "CNROM",
            Self::Mmc3(_) => "MMC3",
        }
    }

    /// Translate a CPU address in $8000-$FFFF to a PRG-ROM offset.
    pub(crate) fn prg_offset(&self, addr: u16, prg_len: usize) -> usize {
        let offset = match self {
            // 16KB PRG mirrors into both halves; 32KB lies flat.
            Self::Nrom | Self::Cnrom(_) => (addr as usize - 0x8000) % prg_len.max(1),
            Self::Mmc1(m) => m.prg_offset(addr, prg_len),
            Self::Uxrom(m) => m.prg_offset(addr, prg_len),
            Self::Mmc3(m) => m.prg_offset(addr, prg_len),
        };
        offset % prg_len.max(1)
    }

    /// Translate a PPU address in $0000-$1FFF to a CHR offset.
    pub(crate) fn chr_offset(&self, addr: u16, chr_len: usize) -> usize {
        let offset = match self {
            Self::Nrom | Self::Uxrom(_) => (addr & 0x1FFF) as usize,
            Self::Mmc1(m) => m.chr_offset(addr),
            Self::Cnrom(m) => m.chr_offset(addr),
            Self::Mmc3(m) => m.chr_offset(addr),
        };
        offset % chr_len.max(1)
    }

    /// Handle a write in the PRG-ROM area ($8000-$FFFF).
    ///
    /// For discrete boards this selects a bank; for MMC1 it feeds the
    /// shift register; for NROM it is ignored.
    pub(crate) fn prg_write(&mut self, addr: u16, value: u8) {
        match self {
            Self::Nrom => {}
            Self::Mmc1(m) => m.write(addr, value),
            Self::Uxrom(m) => m.write(value),
            Self::Cnrom(m) => m.write(value),
            Self::Mmc3(m) => m.write(addr, value),
        }
    }

    /// Current mirroring, given the board-wired default.
    ///
    /// MMC1 and MMC3 control mirroring through registers; the others
    /// use the solder-pad configuration from the header. Four-screen
    /// wiring always wins.
    pub(crate) fn mirroring(&self, wired: Mirroring) -> Mirroring {
        if wired == Mirroring::FourScreen {
            return Mirroring::FourScreen;
        }
        match self {
            Self::Mmc1(m) => m.mirroring(),
            Self::Mmc3(m) => m.mirroring(),
            _ => wired,
        }
    }

    /// Clock the mapper on a PPU A12 rising edge (MMC3 IRQ counter).
    pub(crate) fn tick_a12(&mut self) {
        if let Self::Mmc3(m) = self {
            m.clock_irq();
        }
    }

    /// Whether the mapper is asserting its IRQ line.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        match self {
            Self::Mmc3(m) => m.irq_pending(),
            _ => false,
        }
    }
}
