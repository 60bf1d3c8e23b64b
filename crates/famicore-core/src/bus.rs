//! The CPU-side system bus.
//!
//! Decodes the 16-bit CPU address space and fans accesses out to the
//! 2KB work RAM, the PPU register file, the APU register sink, the
//! controllers, and the cartridge:
//!
//! ```text
//! $0000-$1FFF  2KB internal RAM, mirrored every $0800
//! $2000-$3FFF  PPU registers, mirrored every 8 bytes
//! $4000-$4013  APU registers
//! $4014        OAM DMA trigger
//! $4015        APU status
//! $4016        Controller strobe (W) / controller 1 data (R)
//! $4017        APU frame counter (W) / controller 2 data (R)
//! $4018-$5FFF  Unmapped: open bus
//! $6000-$7FFF  Cartridge SRAM
//! $8000-$FFFF  Cartridge PRG via mapper
//! ```
//!
//! The last byte driven onto the bus is remembered and returned for
//! unmapped or write-only reads (open-bus behavior).

use famicore_cart::Cartridge;
use famicore_cpu::Bus;
use famicore_ppu::Ppu;

use crate::apu::Apu;
use crate::controller::Controller;

/// System bus connecting the CPU to everything else.
#[derive(Debug)]
pub struct NesBus {
    /// 2KB internal work RAM.
    pub ram: [u8; 2048],
    /// Picture processing unit.
    pub ppu: Ppu,
    /// APU register sink.
    pub apu: Apu,
    /// The loaded cartridge.
    pub cart: Cartridge,
    /// Controllers 1 and 2.
    pub controllers: [Controller; 2],
    /// Page latched by a $4014 write, consumed by the orchestrator.
    dma_page: Option<u8>,
    /// Last value driven on the data bus.
    open_bus: u8,
}

impl NesBus {
    /// Build a bus around a loaded cartridge.
    #[must_use]
    pub fn new(cart: Cartridge) -> Self {
        Self {
            ram: [0; 2048],
            ppu: Ppu::new(),
            apu: Apu::new(),
            cart,
            controllers: [Controller::new(), Controller::new()],
            dma_page: None,
            open_bus: 0,
        }
    }

    /// Reset RAM and every attached component.
    pub fn reset(&mut self) {
        self.ram.fill(0);
        self.ppu.reset();
        self.apu.reset();
        self.controllers[0].reset();
        self.controllers[1].reset();
        self.dma_page = None;
        self.open_bus = 0;
    }

    /// Take a pending OAM DMA request, if any.
    pub fn take_dma_page(&mut self) -> Option<u8> {
        self.dma_page.take()
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        let value = match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.ppu.read_register(addr, &mut self.cart),
            0x4015 => self.apu.read_status(),
            0x4016 => self.controllers[0].read() | (self.open_bus & 0xE0),
            0x4017 => self.controllers[1].read() | (self.open_bus & 0xE0),
            // Write-only APU/IO registers and the unmapped hole.
            0x4000..=0x4014 | 0x4018..=0x5FFF => self.open_bus,
            0x6000..=0xFFFF => self.cart.prg_read(addr),
        };
        self.open_bus = value;
        value
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.open_bus = value;
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = value,
            0x2000..=0x3FFF => self.ppu.write_register(addr, value, &mut self.cart),
            0x4014 => self.dma_page = Some(value),
            0x4016 => {
                self.controllers[0].write_strobe(value);
                self.controllers[1].write_strobe(value);
            }
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write(addr, value),
            0x4018..=0x5FFF => {} // unmapped
            0x6000..=0xFFFF => self.cart.prg_write(addr, value),
        }
    }
}
