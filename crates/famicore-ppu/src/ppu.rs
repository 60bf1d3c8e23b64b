//! The dot-stepped PPU core.
//!
//! One call to [`Ppu::step`] advances exactly one dot of the 341x262
//! NTSC timing grid:
//!
//! ```text
//! Scanline 0-239  visible (background fetch, sprite pipeline, pixels)
//! Scanline 240    post-render idle
//! Scanline 241-260 VBlank (flag set at 241 dot 1, NMI if enabled)
//! Scanline 261    pre-render (flags cleared at dot 1, copy_y 280-304)
//! ```
//!
//! CHR and live mirroring come through the [`PpuBus`] trait; everything
//! else (nametable RAM, palette, OAM, scroll unit, shifters) is owned
//! by the PPU itself. The produced framebuffer holds 6-bit palette
//! indices; RGBA conversion is the integration layer's business.

use famicore_cart::{Cartridge, Mirroring};

use crate::background::Background;
use crate::ctrl::Ctrl;
use crate::mask::Mask;
use crate::oam::{Oam, SpriteAttr};
use crate::scroll::Scroll;
use crate::sprite::{SpriteLine, SpriteSlots};
use crate::status::Status;
use crate::vram::Vram;

/// Frame width in pixels.
pub const FRAME_WIDTH: usize = 256;
/// Frame height in pixels.
pub const FRAME_HEIGHT: usize = 240;
/// Frame size in pixels.
pub const FRAME_SIZE: usize = FRAME_WIDTH * FRAME_HEIGHT;

/// Dots per scanline (0-340).
pub const DOTS_PER_SCANLINE: u16 = 341;
/// Scanlines per frame (0-261).
pub const SCANLINES_PER_FRAME: u16 = 262;
/// First VBlank scanline.
pub const VBLANK_SCANLINE: u16 = 241;
/// The pre-render scanline.
pub const PRE_RENDER_SCANLINE: u16 = 261;

/// PPU-side memory interface: pattern tables and live mirroring.
///
/// Implemented for [`Cartridge`]; tests substitute flat CHR-RAM.
pub trait PpuBus {
    /// Read a pattern table byte ($0000-$1FFF).
    fn chr_read(&mut self, addr: u16) -> u8;

    /// Write a pattern table byte (CHR-RAM carts only).
    fn chr_write(&mut self, addr: u16, value: u8);

    /// Current nametable mirroring.
    fn mirroring(&self) -> Mirroring;
}

impl PpuBus for Cartridge {
    fn chr_read(&mut self, addr: u16) -> u8 {
        Cartridge::chr_read(self, addr)
    }

    fn chr_write(&mut self, addr: u16, value: u8) {
        Cartridge::chr_write(self, addr, value);
    }

    fn mirroring(&self) -> Mirroring {
        Cartridge::mirroring(self)
    }
}

/// The 2C02 PPU.
#[derive(Debug)]
pub struct Ppu {
    // CPU-visible registers
    ctrl: Ctrl,
    mask: Mask,
    status: Status,

    // Internal scroll unit (loopy v/t/x/w)
    scroll: Scroll,

    // Memory
    vram: Vram,
    oam: Oam,

    // Rendering pipelines
    background: Background,
    sprite_line: SpriteLine,
    slots: SpriteSlots,

    // Timing
    dot: u16,
    scanline: u16,
    frame: u64,

    // $2007 read buffer
    buffered: u8,
    // Last value placed on the PPU data bus (fills status bits 0-4)
    open_bus: u8,
    // Level NMI output, polled and deasserted by the orchestrator
    nmi_line: bool,

    // Palette-index framebuffer
    frame_buffer: Vec<u8>,
}

impl Ppu {
    /// Create a PPU at power-on.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ctrl: Ctrl::empty(),
            mask: Mask::empty(),
            status: Status::empty(),
            scroll: Scroll::new(),
            vram: Vram::new(),
            oam: Oam::new(),
            background: Background::new(),
            sprite_line: SpriteLine::default(),
            slots: SpriteSlots::new(),
            dot: 0,
            scanline: 0,
            frame: 0,
            buffered: 0,
            open_bus: 0,
            nmi_line: false,
            frame_buffer: vec![0; FRAME_SIZE],
        }
    }

    /// Reset to power-up state.
    pub fn reset(&mut self) {
        self.ctrl = Ctrl::empty();
        self.mask = Mask::empty();
        self.status = Status::empty();
        self.scroll = Scroll::new();
        self.vram.reset();
        self.oam.reset();
        self.background.reset();
        self.sprite_line = SpriteLine::default();
        self.slots.clear();
        self.dot = 0;
        self.scanline = 0;
        self.frame = 0;
        self.buffered = 0;
        self.open_bus = 0;
        self.nmi_line = false;
        self.frame_buffer.fill(0);
    }

    /// Advance one dot.
    pub fn step(&mut self, bus: &mut impl PpuBus) {
        let rendering = self.mask.rendering_enabled();
        let on_fetch_line = self.scanline < 240 || self.scanline == PRE_RENDER_SCANLINE;

        if rendering && on_fetch_line {
            self.run_background(bus);
            self.run_sprites(bus);
        }

        // VBlank edges fire regardless of rendering state.
        if self.scanline == VBLANK_SCANLINE && self.dot == 1 {
            self.status.insert(Status::VBLANK);
            if self.ctrl.nmi_enabled() {
                self.nmi_line = true;
            }
        }
        if self.scanline == PRE_RENDER_SCANLINE && self.dot == 1 {
            self.status
                .remove(Status::VBLANK | Status::SPRITE_ZERO_HIT | Status::SPRITE_OVERFLOW);
            self.nmi_line = false;
        }

        self.dot += 1;
        if self.dot == DOTS_PER_SCANLINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline == SCANLINES_PER_FRAME {
                self.scanline = 0;
                self.frame += 1;
            }
        }
    }

    /// Background fetch cadence, pixel output, and scroll updates for
    /// the current dot.
    fn run_background(&mut self, bus: &mut impl PpuBus) {
        let dot = self.dot;
        let in_fetch = (1..=256).contains(&dot) || (321..=336).contains(&dot);

        if in_fetch {
            if self.scanline < 240 && dot <= 256 {
                self.render_pixel();
            }
            self.background.shift();

            match dot % 8 {
                1 => {
                    let value = self
                        .vram
                        .read_nametable(self.scroll.nametable_addr(), bus.mirroring());
                    self.background.set_nametable_byte(value);
                }
                3 => {
                    let value = self
                        .vram
                        .read_nametable(self.scroll.attribute_addr(), bus.mirroring());
                    self.background
                        .set_attribute_bits(value >> self.scroll.attribute_shift());
                }
                5 => {
                    let addr = self.bg_pattern_addr();
                    self.background.set_pattern_low(bus.chr_read(addr));
                }
                7 => {
                    let addr = self.bg_pattern_addr() + 8;
                    self.background.set_pattern_high(bus.chr_read(addr));
                }
                0 => {
                    self.background.reload_shifters();
                    self.scroll.increment_x();
                }
                _ => {}
            }

            if dot == 256 {
                self.scroll.increment_y();
            }
        }

        if dot == 257 {
            self.scroll.copy_x();
        }
        if self.scanline == PRE_RENDER_SCANLINE && (280..=304).contains(&dot) {
            self.scroll.copy_y();
        }
    }

    /// Sprite evaluation, pattern fetch, and slot clocking for the
    /// current dot.
    fn run_sprites(&mut self, bus: &mut impl PpuBus) {
        let dot = self.dot;

        if self.scanline == PRE_RENDER_SCANLINE {
            // Nothing was evaluated for scanline 0; make sure line
            // 239's sprites do not leak into the next frame.
            if dot == 257 {
                self.slots.clear();
            }
            return;
        }

        // The pixel for this dot was sampled in render_pixel; advance
        // the counters afterwards.
        if (1..=256).contains(&dot) {
            self.slots.tick();
        }

        if dot == 257 {
            self.sprite_line =
                SpriteLine::evaluate(&self.oam, self.scanline, self.ctrl.sprite_height());
            if self.sprite_line.overflow() {
                self.status.insert(Status::SPRITE_OVERFLOW);
            }
            self.slots.load_line(&self.sprite_line);
        }

        if (257..=320).contains(&dot) && (dot - 257) % 8 == 7 {
            let slot = ((dot - 257) / 8) as usize;
            self.fetch_sprite_pattern(bus, slot);
        }
    }

    /// Pattern address of the background tile being fetched.
    fn bg_pattern_addr(&self) -> u16 {
        self.ctrl.bg_table_addr()
            + u16::from(self.background.nametable_byte()) * 16
            + u16::from(self.scroll.fine_y())
    }

    /// Fetch and install both pattern bytes for one sprite slot
    /// (dots 257-320, 8 dots per slot).
    fn fetch_sprite_pattern(&mut self, bus: &mut impl PpuBus, slot: usize) {
        let Some(sprite) = self.sprite_line.sprite(slot) else {
            return;
        };

        let height = self.ctrl.sprite_height();
        let mut row = self.scanline - u16::from(sprite.y);
        if sprite.attr.contains(SpriteAttr::FLIP_V) {
            row = height - 1 - row;
        }

        let addr = if height == 16 {
            // Bit 0 of the tile index picks the pattern table; the
            // bottom half of the sprite is the next tile up.
            let table = u16::from(sprite.tile & 0x01) * 0x1000;
            let mut tile = u16::from(sprite.tile & 0xFE);
            if row >= 8 {
                tile += 1;
                row -= 8;
            }
            table + tile * 16 + row
        } else {
            self.ctrl.sprite_table_addr() + u16::from(sprite.tile) * 16 + row
        };

        let mut lo = bus.chr_read(addr);
        let mut hi = bus.chr_read(addr + 8);
        if sprite.attr.contains(SpriteAttr::FLIP_H) {
            lo = lo.reverse_bits();
            hi = hi.reverse_bits();
        }
        self.slots.set_pattern(slot, lo, hi);
    }

    /// Emit the pixel for the current dot (visible scanlines, dots
    /// 1-256).
    fn render_pixel(&mut self) {
        let x = self.dot - 1;
        let y = self.scanline;

        let (bg_px, bg_palette) = if self.mask.bg_visible_at(x) {
            self.background.pixel(self.scroll.fine_x())
        } else {
            (0, 0)
        };

        let sprite_px = if self.mask.sprites_visible_at(x) {
            self.slots.pixel()
        } else {
            None
        };

        // Sprite 0 hit: opaque sprite-0 pixel over an opaque background
        // pixel. The enable and left-8 gates are already applied to
        // both pixels above; x=255 never hits.
        if let Some(sp) = sprite_px {
            if sp.sprite_zero && bg_px != 0 && x != 255 {
                self.status.insert(Status::SPRITE_ZERO_HIT);
            }
        }

        let palette_addr = match sprite_px {
            None => {
                if bg_px == 0 {
                    0x3F00
                } else {
                    0x3F00 + u16::from(bg_palette) * 4 + u16::from(bg_px)
                }
            }
            Some(sp) => {
                if bg_px == 0 || !sp.behind_background {
                    0x3F00 + u16::from(sp.palette) * 4 + u16::from(sp.value)
                } else {
                    0x3F00 + u16::from(bg_palette) * 4 + u16::from(bg_px)
                }
            }
        };

        let color = self.vram.read_palette(palette_addr) & 0x3F;
        self.frame_buffer[y as usize * FRAME_WIDTH + x as usize] = color;
    }

    // ------------------------------------------------------------------
    // CPU-visible register file ($2000-$2007 after mirroring)
    // ------------------------------------------------------------------

    /// Read a PPU register.
    pub fn read_register(&mut self, addr: u16, bus: &mut impl PpuBus) -> u8 {
        match addr & 0x07 {
            // Write-only registers return the data-bus latch.
            0 | 1 | 3 | 5 | 6 => self.open_bus,

            2 => {
                let result = (self.status.bits() & 0xE0) | (self.open_bus & 0x1F);
                self.status.remove(Status::VBLANK);
                self.scroll.reset_latch();
                self.open_bus = result;
                result
            }

            4 => {
                let value = self.oam.read();
                self.open_bus = value;
                value
            }

            7 => {
                let addr = self.scroll.vram_addr() & 0x3FFF;
                let result = if addr >= 0x3F00 {
                    // Palette reads bypass the buffer; the buffer still
                    // refills from the nametable underneath.
                    self.buffered = self.vram.read_nametable(addr - 0x1000, bus.mirroring());
                    self.vram.read_palette(addr)
                } else {
                    let result = self.buffered;
                    self.buffered = self.internal_read(bus, addr);
                    result
                };
                self.scroll.increment_vram(self.ctrl.vram_increment());
                self.open_bus = result;
                result
            }

            _ => unreachable!(),
        }
    }

    /// Write a PPU register.
    pub fn write_register(&mut self, addr: u16, value: u8, bus: &mut impl PpuBus) {
        self.open_bus = value;

        match addr & 0x07 {
            0 => {
                let was_enabled = self.ctrl.nmi_enabled();
                self.ctrl = Ctrl::from_bits_truncate(value);
                self.scroll.write_ctrl(value);
                // Turning NMI on mid-VBlank raises the line at once.
                if !was_enabled && self.ctrl.nmi_enabled() && self.status.in_vblank() {
                    self.nmi_line = true;
                }
            }
            1 => self.mask = Mask::from_bits_truncate(value),
            2 => {} // read-only
            3 => self.oam.set_addr(value),
            4 => self.oam.write(value),
            5 | 6 => {
                if self.in_visible_rendering() {
                    log::debug!(
                        "mid-scanline ${:04X} write at scanline {} dot {}",
                        0x2000 + (addr & 0x07),
                        self.scanline,
                        self.dot
                    );
                }
                if addr & 0x07 == 5 {
                    self.scroll.write_scroll(value);
                } else {
                    self.scroll.write_addr(value);
                }
            }
            7 => {
                let addr = self.scroll.vram_addr() & 0x3FFF;
                if self.in_visible_rendering() {
                    log::warn!(
                        "$2007 write to ${addr:04X} while rendering; v is live and will be disturbed"
                    );
                }
                self.internal_write(bus, addr, value);
                self.scroll.increment_vram(self.ctrl.vram_increment());
            }
            _ => unreachable!(),
        }
    }

    /// OAM DMA write: one byte at the current OAM address.
    #[inline]
    pub fn write_oam(&mut self, value: u8) {
        self.oam.write(value);
    }

    /// Whether a register access lands mid-scanline while rendering.
    /// Games do this deliberately for split-screen effects; it is the
    /// first thing to look at when a raster trick misbehaves.
    fn in_visible_rendering(&self) -> bool {
        self.mask.rendering_enabled() && self.scanline < 240 && self.dot > 0
    }

    /// VRAM-space read ($0000-$3FFF).
    fn internal_read(&mut self, bus: &mut impl PpuBus, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => bus.chr_read(addr),
            0x2000..=0x3EFF => self.vram.read_nametable(addr, bus.mirroring()),
            0x3F00..=0x3FFF => self.vram.read_palette(addr),
            _ => 0,
        }
    }

    /// VRAM-space write ($0000-$3FFF).
    fn internal_write(&mut self, bus: &mut impl PpuBus, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => bus.chr_write(addr, value),
            0x2000..=0x3EFF => self.vram.write_nametable(addr, value, bus.mirroring()),
            0x3F00..=0x3FFF => self.vram.write_palette(addr, value),
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Orchestrator-facing state
    // ------------------------------------------------------------------

    /// The level NMI output.
    #[inline]
    #[must_use]
    pub fn nmi_line(&self) -> bool {
        self.nmi_line
    }

    /// Deassert the NMI output after delivering it to the CPU.
    #[inline]
    pub fn acknowledge_nmi(&mut self) {
        self.nmi_line = false;
    }

    /// Frame counter; increments when the pre-render line wraps.
    #[inline]
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Current dot within the scanline (0-340).
    #[inline]
    #[must_use]
    pub fn dot(&self) -> u16 {
        self.dot
    }

    /// Current scanline (0-261).
    #[inline]
    #[must_use]
    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    /// The palette-index framebuffer (one byte per pixel, 0-63).
    #[inline]
    #[must_use]
    pub fn frame_buffer(&self) -> &[u8] {
        &self.frame_buffer
    }

    /// Driven status bits, for tests and debugging.
    #[inline]
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}
