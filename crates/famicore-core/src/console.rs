//! The console: ownership root and frame orchestrator.
//!
//! Owns the CPU and the bus (which in turn owns PPU, APU, cartridge,
//! and controllers) and advances simulated time: each CPU instruction
//! is followed by three PPU dots per cycle, with the PPU's NMI line
//! polled after every dot and the mapper IRQ line after every
//! instruction.

use famicore_cart::RomError;
use famicore_cpu::{Bus, Cpu};
use famicore_ppu::{FRAME_HEIGHT, FRAME_WIDTH};

use crate::bus::NesBus;
use crate::controller::Button;
use crate::palette::palette_rgb;

/// RGBA framebuffer size in bytes.
pub const FRAMEBUFFER_SIZE: usize = FRAME_WIDTH * FRAME_HEIGHT * 4;

/// Instruction cap per frame. A frame is ~29,780 CPU cycles, so even a
/// stream of 2-cycle instructions stays far below this.
const FRAME_WATCHDOG_STEPS: u32 = 100_000;

/// Errors surfaced when building a console.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConsoleError {
    /// The ROM image failed to load.
    #[error("ROM error: {0}")]
    Rom(#[from] RomError),
}

/// A complete NES.
#[derive(Debug)]
pub struct Console {
    cpu: Cpu,
    bus: NesBus,
    /// RGBA output, one frame behind the PPU's palette indices.
    framebuffer: Vec<u8>,
    /// Frames completed since power-on.
    frame_count: u64,
}

impl Console {
    /// Build a console from iNES file bytes and run the reset
    /// sequence.
    ///
    /// # Errors
    ///
    /// Returns a [`ConsoleError`] when the image is malformed or wants
    /// an unsupported mapper. No partially-built console escapes.
    pub fn new(rom_data: &[u8]) -> Result<Self, ConsoleError> {
        let cart = famicore_cart::Cartridge::from_ines(rom_data)?;
        let mut console = Self {
            cpu: Cpu::new(),
            bus: NesBus::new(cart),
            framebuffer: vec![0; FRAMEBUFFER_SIZE],
            frame_count: 0,
        };
        console.cpu.reset(&mut console.bus);
        Ok(console)
    }

    /// Reset the whole machine (cartridge state persists, as on real
    /// hardware where the reset button does not clear mapper RAM).
    pub fn reset(&mut self) {
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
    }

    /// Run one CPU instruction (or one DMA transfer) and keep the PPU
    /// in lock-step. Returns the CPU cycles consumed.
    pub fn step(&mut self) -> u32 {
        let cycles = if let Some(page) = self.bus.take_dma_page() {
            self.run_oam_dma(page)
        } else {
            u32::from(self.cpu.step(&mut self.bus))
        };

        for _ in 0..cycles * 3 {
            self.bus.ppu.step(&mut self.bus.cart);
            if self.bus.ppu.nmi_line() {
                self.bus.ppu.acknowledge_nmi();
                self.cpu.nmi();
            }
        }

        if self.bus.cart.irq_pending() {
            self.cpu.irq();
        }

        cycles
    }

    /// Run until the PPU finishes the current frame, then convert the
    /// framebuffer to RGBA.
    pub fn run_frame(&mut self) {
        let frame = self.bus.ppu.frame();
        let mut steps = 0u32;

        while self.bus.ppu.frame() == frame {
            self.step();
            steps += 1;
            if steps >= FRAME_WATCHDOG_STEPS {
                log::warn!("frame watchdog tripped after {steps} instructions");
                break;
            }
        }

        self.present();
        self.frame_count += 1;
    }

    /// OAM DMA: copy 256 bytes from CPU page `page` into OAM at the
    /// current OAM address. The reads go through the full bus decode,
    /// PPU side effects included, so pathological source pages behave
    /// as the hardware would.
    fn run_oam_dma(&mut self, page: u8) -> u32 {
        let base = u16::from(page) << 8;
        for offset in 0..=255u16 {
            let value = self.bus.read(base | offset);
            self.bus.ppu.write_oam(value);
        }

        // One dummy cycle plus 256 read/write pairs; one more when the
        // transfer starts on an odd CPU cycle.
        let cycles: u32 = if self.cpu.cycles % 2 == 1 { 514 } else { 513 };
        self.cpu.cycles += u64::from(cycles);
        cycles
    }

    /// Convert the PPU's palette indices into the RGBA output buffer
    /// (R, G, B, A byte order, A = 255).
    fn present(&mut self) {
        let indices = self.bus.ppu.frame_buffer();
        for (pixel, &index) in indices.iter().enumerate() {
            let (r, g, b) = palette_rgb(index);
            let offset = pixel * 4;
            self.framebuffer[offset] = r;
            self.framebuffer[offset + 1] = g;
            self.framebuffer[offset + 2] = b;
            self.framebuffer[offset + 3] = 255;
        }
    }

    /// Press or release a button on controller `port` (0 or 1).
    pub fn set_button(&mut self, port: usize, button: Button, pressed: bool) {
        if let Some(controller) = self.bus.controllers.get_mut(port) {
            controller.set_button(button, pressed);
        }
    }

    /// The 256x240 RGBA framebuffer produced by the last `run_frame`.
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    /// Drain audio samples. The APU is a register sink, so this is
    /// always empty; the entry point exists for host symmetry.
    pub fn take_audio_samples(&mut self) -> Vec<f32> {
        self.bus.apu.take_samples()
    }

    /// Frames completed since power-on.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Total CPU cycles executed.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles
    }

    /// Cartridge SRAM, for host-managed persistence.
    #[must_use]
    pub fn sram(&self) -> &[u8] {
        self.bus.cart.sram()
    }

    /// Restore cartridge SRAM from a host-managed save.
    pub fn load_sram(&mut self, data: &[u8]) {
        self.bus.cart.load_sram(data);
    }

    /// Whether the cartridge battery-backs its SRAM.
    #[must_use]
    pub fn has_battery(&self) -> bool {
        self.bus.cart.has_battery()
    }

    /// iNES mapper number of the loaded cartridge.
    #[must_use]
    pub fn mapper_id(&self) -> u16 {
        self.bus.cart.mapper_id()
    }

    /// Board name of the loaded cartridge's mapper.
    #[must_use]
    pub fn mapper_name(&self) -> &'static str {
        self.bus.cart.mapper_name()
    }

    /// CPU access for tests and debuggers.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Bus access for tests and debuggers.
    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    /// Mutable bus access for tests and debuggers.
    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.bus
    }
}
