//! PPUCTRL ($2000) register.

use bitflags::bitflags;

bitflags! {
    /// PPU control register.
    ///
    /// ```text
    /// 7  bit  0
    /// ---- ----
    /// VPHB SINN
    /// |||| ||++- Base nametable address (added to t by the scroll unit)
    /// |||| |+--- VRAM address increment (0: +1, 1: +32)
    /// |||| +---- Sprite pattern table for 8x8 sprites
    /// |||+------ Background pattern table
    /// ||+------- Sprite size (0: 8x8, 1: 8x16)
    /// |+-------- PPU master/slave (unused here)
    /// +--------- Generate NMI at the start of VBlank
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Ctrl: u8 {
        /// Nametable select, low bit.
        const NAMETABLE_X = 1 << 0;
        /// Nametable select, high bit.
        const NAMETABLE_Y = 1 << 1;
        /// VRAM increment: set = 32 (down a column), clear = 1.
        const VRAM_INCREMENT = 1 << 2;
        /// Sprite pattern table at $1000 (8x8 only).
        const SPRITE_TABLE = 1 << 3;
        /// Background pattern table at $1000.
        const BG_TABLE = 1 << 4;
        /// 8x16 sprites.
        const SPRITE_SIZE = 1 << 5;
        /// Master/slave select (no effect on a stock NES).
        const MASTER_SLAVE = 1 << 6;
        /// NMI on VBlank.
        const NMI_ENABLE = 1 << 7;
    }
}

impl Ctrl {
    /// Amount added to `v` after a $2007 access.
    #[inline]
    #[must_use]
    pub fn vram_increment(self) -> u16 {
        if self.contains(Self::VRAM_INCREMENT) { 32 } else { 1 }
    }

    /// Background pattern table base address.
    #[inline]
    #[must_use]
    pub fn bg_table_addr(self) -> u16 {
        if self.contains(Self::BG_TABLE) { 0x1000 } else { 0x0000 }
    }

    /// Sprite pattern table base address (ignored for 8x16 sprites).
    #[inline]
    #[must_use]
    pub fn sprite_table_addr(self) -> u16 {
        if self.contains(Self::SPRITE_TABLE) { 0x1000 } else { 0x0000 }
    }

    /// Sprite height in pixels.
    #[inline]
    #[must_use]
    pub fn sprite_height(self) -> u16 {
        if self.contains(Self::SPRITE_SIZE) { 16 } else { 8 }
    }

    /// Whether VBlank raises NMI.
    #[inline]
    #[must_use]
    pub fn nmi_enabled(self) -> bool {
        self.contains(Self::NMI_ENABLE)
    }
}
