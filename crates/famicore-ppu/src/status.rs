//! PPUSTATUS ($2002) register.
//!
//! Only the top three bits are driven by the PPU; the low five bits of
//! a $2002 read come from the decaying data-bus latch.

use bitflags::bitflags;

bitflags! {
    /// PPU status register (driven bits only).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status: u8 {
        /// Sprite overflow: more than 8 sprites on a scanline.
        const SPRITE_OVERFLOW = 1 << 5;
        /// Sprite 0 hit: opaque sprite-0 pixel over opaque background.
        const SPRITE_ZERO_HIT = 1 << 6;
        /// Currently in VBlank.
        const VBLANK = 1 << 7;
    }
}

impl Status {
    /// VBlank flag is set.
    #[inline]
    #[must_use]
    pub fn in_vblank(self) -> bool {
        self.contains(Self::VBLANK)
    }
}
