//! Cartridge: the unit the rest of the system talks to.
//!
//! Owns PRG-ROM, CHR (ROM or RAM), 8KB of SRAM, and the [`Mapper`].
//! The CPU side sees $6000-$FFFF through [`Cartridge::prg_read`] /
//! [`Cartridge::prg_write`]; the PPU side sees the pattern tables
//! ($0000-$1FFF) through [`Cartridge::chr_read`] /
//! [`Cartridge::chr_write`].

use crate::mapper::{Mapper, Mirroring};
use crate::rom::{Rom, RomError};

const SRAM_SIZE: usize = 8 * 1024;
const CHR_RAM_SIZE: usize = 8 * 1024;

/// A loaded cartridge.
#[derive(Debug, Clone)]
pub struct Cartridge {
    /// PRG-ROM data (multiple of 16KB).
    prg_rom: Vec<u8>,
    /// CHR data: ROM from the image, or 8KB of RAM when the header
    /// declares no CHR banks.
    chr: Vec<u8>,
    /// True when `chr` is RAM and therefore writable.
    chr_is_ram: bool,
    /// 8KB work/battery RAM at $6000-$7FFF.
    sram: Vec<u8>,
    /// Battery-backed SRAM flag from the header.
    has_battery: bool,
    /// Mirroring wired on the board (mapper registers may override).
    wired_mirroring: Mirroring,
    /// Mapper hardware.
    mapper: Mapper,
    /// Previous PPU A12 level, for MMC3 IRQ edge detection.
    last_a12: bool,
}

impl Cartridge {
    /// Build a cartridge from a parsed ROM.
    ///
    /// # Errors
    ///
    /// Returns [`RomError::UnsupportedMapper`] if the image wants a
    /// mapper outside {0, 1, 2, 3, 4}.
    pub fn new(rom: Rom) -> Result<Self, RomError> {
        let mapper = Mapper::from_id(rom.header.mapper_number)?;
        let chr_is_ram = rom.chr_rom.is_empty();
        let chr = if chr_is_ram {
            vec![0; CHR_RAM_SIZE]
        } else {
            rom.chr_rom
        };

        Ok(Self {
            prg_rom: rom.prg_rom,
            chr,
            chr_is_ram,
            sram: vec![0; SRAM_SIZE],
            has_battery: rom.header.has_battery,
            wired_mirroring: rom.header.mirroring,
            mapper,
            last_a12: false,
        })
    }

    /// Parse iNES bytes and build a cartridge in one step.
    ///
    /// # Errors
    ///
    /// Returns any [`RomError`] from parsing or mapper construction.
    pub fn from_ines(data: &[u8]) -> Result<Self, RomError> {
        Self::new(Rom::load(data)?)
    }

    /// Read from the CPU side ($6000-$FFFF).
    ///
    /// Addresses below $6000 are not the cartridge's to answer; the
    /// bus handles them as open bus.
    #[must_use]
    pub fn prg_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.sram[(addr & 0x1FFF) as usize],
            0x8000..=0xFFFF => {
                let offset = self.mapper.prg_offset(addr, self.prg_rom.len());
                self.prg_rom[offset]
            }
            _ => 0,
        }
    }

    /// Write from the CPU side ($6000-$FFFF).
    ///
    /// PRG-area writes go to the mapper registers; ROM itself is never
    /// modified.
    pub fn prg_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => self.sram[(addr & 0x1FFF) as usize] = value,
            0x8000..=0xFFFF => self.mapper.prg_write(addr, value),
            _ => {}
        }
    }

    /// Read from the PPU side ($0000-$1FFF).
    ///
    /// Takes `&mut self` because pattern fetches clock the MMC3 IRQ
    /// counter via A12 edge detection.
    pub fn chr_read(&mut self, addr: u16) -> u8 {
        self.watch_a12(addr);
        let offset = self.mapper.chr_offset(addr, self.chr.len());
        self.chr[offset]
    }

    /// Write from the PPU side ($0000-$1FFF). Ignored for CHR-ROM.
    pub fn chr_write(&mut self, addr: u16, value: u8) {
        self.watch_a12(addr);
        if self.chr_is_ram {
            let offset = self.mapper.chr_offset(addr, self.chr.len());
            self.chr[offset] = value;
        } else {
            log::debug!("ignored write of {value:02X} to CHR-ROM at ${addr:04X}");
        }
    }

    /// Current nametable mirroring.
    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring(self.wired_mirroring)
    }

    /// Whether the mapper is asserting its IRQ line.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.mapper.irq_pending()
    }

    /// iNES mapper number.
    #[must_use]
    pub fn mapper_id(&self) -> u16 {
        self.mapper.id()
    }

    /// Conventional board name of the mapper.
    #[must_use]
    pub fn mapper_name(&self) -> &'static str {
        self.mapper.name()
    }

    /// Whether SRAM is battery-backed and worth persisting.
    #[must_use]
    pub fn has_battery(&self) -> bool {
        self.has_battery
    }

    /// The SRAM region, for host-managed persistence.
    #[must_use]
    pub fn sram(&self) -> &[u8] {
        &self.sram
    }

    /// Restore SRAM contents from a host-managed save.
    pub fn load_sram(&mut self, data: &[u8]) {
        let len = data.len().min(self.sram.len());
        self.sram[..len].copy_from_slice(&data[..len]);
    }

    /// Clock the MMC3 IRQ counter on an A12 rising edge.
    fn watch_a12(&mut self, addr: u16) {
        let a12 = addr & 0x1000 != 0;
        if a12 && !self.last_a12 {
            self.mapper.tick_a12();
        }
        self.last_a12 = a12;
    }
}
