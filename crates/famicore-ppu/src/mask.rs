//! PPUMASK ($2001) register.

use bitflags::bitflags;

bitflags! {
    /// PPU mask register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Mask: u8 {
        /// Grayscale output.
        const GRAYSCALE = 1 << 0;
        /// Show background in the leftmost 8 pixels.
        const BG_LEFT = 1 << 1;
        /// Show sprites in the leftmost 8 pixels.
        const SPRITE_LEFT = 1 << 2;
        /// Enable background rendering.
        const SHOW_BG = 1 << 3;
        /// Enable sprite rendering.
        const SHOW_SPRITES = 1 << 4;
        /// Emphasize red.
        const EMPHASIZE_RED = 1 << 5;
        /// Emphasize green.
        const EMPHASIZE_GREEN = 1 << 6;
        /// Emphasize blue.
        const EMPHASIZE_BLUE = 1 << 7;
    }
}

impl Mask {
    /// Rendering is enabled when either layer is shown. Scroll and
    /// fetch machinery only runs in this state.
    #[inline]
    #[must_use]
    pub fn rendering_enabled(self) -> bool {
        self.intersects(Self::SHOW_BG.union(Self::SHOW_SPRITES))
    }

    /// Background pixels are produced at `x` (left-8 gating).
    #[inline]
    #[must_use]
    pub fn bg_visible_at(self, x: u16) -> bool {
        self.contains(Self::SHOW_BG) && (x >= 8 || self.contains(Self::BG_LEFT))
    }

    /// Sprite pixels are produced at `x` (left-8 gating).
    #[inline]
    #[must_use]
    pub fn sprites_visible_at(self, x: u16) -> bool {
        self.contains(Self::SHOW_SPRITES) && (x >= 8 || self.contains(Self::SPRITE_LEFT))
    }
}
