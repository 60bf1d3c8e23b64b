//! Background tile fetch pipeline and shift registers.
//!
//! Four bytes are latched over each 8-dot fetch cycle (nametable,
//! attribute, pattern low, pattern high) and reloaded into the low
//! halves of four 16-bit shift registers at the tile boundary. The
//! attribute bits are broadcast to 8-bit masks so all four registers
//! shift in lock-step and a single bit position (15 - fine X) selects
//! the output pixel.

/// Background pipeline state.
#[derive(Debug, Clone, Default)]
pub struct Background {
    /// Latched nametable byte (tile index).
    nt_byte: u8,
    /// Latched 2-bit attribute for the fetched tile.
    at_bits: u8,
    /// Latched pattern low byte.
    pattern_lo: u8,
    /// Latched pattern high byte.
    pattern_hi: u8,

    /// Pattern shift register, low bitplane.
    shift_pattern_lo: u16,
    /// Pattern shift register, high bitplane.
    shift_pattern_hi: u16,
    /// Attribute shift register, low bit (broadcast per tile).
    shift_attr_lo: u16,
    /// Attribute shift register, high bit (broadcast per tile).
    shift_attr_hi: u16,
}

impl Background {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the nametable byte (dot mod 8 == 1).
    #[inline]
    pub fn set_nametable_byte(&mut self, value: u8) {
        self.nt_byte = value;
    }

    /// Latched tile index, used to form the pattern address.
    #[inline]
    #[must_use]
    pub fn nametable_byte(&self) -> u8 {
        self.nt_byte
    }

    /// Latch the tile's 2 attribute bits, already extracted from the
    /// attribute byte (dot mod 8 == 3).
    #[inline]
    pub fn set_attribute_bits(&mut self, value: u8) {
        self.at_bits = value & 0x03;
    }

    /// Latch the pattern low byte (dot mod 8 == 5).
    #[inline]
    pub fn set_pattern_low(&mut self, value: u8) {
        self.pattern_lo = value;
    }

    /// Latch the pattern high byte (dot mod 8 == 7).
    #[inline]
    pub fn set_pattern_high(&mut self, value: u8) {
        self.pattern_hi = value;
    }

    /// Reload the low halves of all four shifters from the latches
    /// (dot mod 8 == 0).
    #[inline]
    pub fn reload_shifters(&mut self) {
        self.shift_pattern_lo = (self.shift_pattern_lo & 0xFF00) | u16::from(self.pattern_lo);
        self.shift_pattern_hi = (self.shift_pattern_hi & 0xFF00) | u16::from(self.pattern_hi);
        self.shift_attr_lo =
            (self.shift_attr_lo & 0xFF00) | if self.at_bits & 1 != 0 { 0xFF } else { 0x00 };
        self.shift_attr_hi =
            (self.shift_attr_hi & 0xFF00) | if self.at_bits & 2 != 0 { 0xFF } else { 0x00 };
    }

    /// Shift all four registers left by one.
    #[inline]
    pub fn shift(&mut self) {
        self.shift_pattern_lo <<= 1;
        self.shift_pattern_hi <<= 1;
        self.shift_attr_lo <<= 1;
        self.shift_attr_hi <<= 1;
    }

    /// Sample the output pixel: 2-bit pattern value and 2-bit palette
    /// group, taken from bit `15 - fine_x` of each register.
    #[inline]
    #[must_use]
    pub fn pixel(&self, fine_x: u8) -> (u8, u8) {
        let select = 0x8000u16 >> fine_x;

        let px = u8::from(self.shift_pattern_lo & select != 0)
            | (u8::from(self.shift_pattern_hi & select != 0) << 1);
        let palette = u8::from(self.shift_attr_lo & select != 0)
            | (u8::from(self.shift_attr_hi & select != 0) << 1);

        (px, palette)
    }

    /// Reset to power-up state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_fills_low_half() {
        let mut bg = Background::new();
        bg.set_pattern_low(0xAB);
        bg.set_pattern_high(0xCD);
        bg.set_attribute_bits(0x03);
        bg.reload_shifters();

        assert_eq!(bg.shift_pattern_lo, 0x00AB);
        assert_eq!(bg.shift_pattern_hi, 0x00CD);
        assert_eq!(bg.shift_attr_lo, 0x00FF);
        assert_eq!(bg.shift_attr_hi, 0x00FF);
    }

    #[test]
    fn test_pixel_selection_after_shifts() {
        let mut bg = Background::new();
        bg.set_pattern_low(0b1000_0000);
        bg.set_pattern_high(0b0000_0000);
        bg.set_attribute_bits(0x01);
        bg.reload_shifters();

        // Shift the loaded tile into the high half.
        for _ in 0..8 {
            bg.shift();
        }

        let (px, palette) = bg.pixel(0);
        assert_eq!(px, 0b01);
        assert_eq!(palette, 0b01);

        // Fine X of 1 looks one pixel ahead (a zero bit here).
        let (px, _) = bg.pixel(1);
        assert_eq!(px, 0);
    }

    #[test]
    fn test_two_tiles_straddle() {
        let mut bg = Background::new();

        // First tile: all-opaque low plane.
        bg.set_pattern_low(0xFF);
        bg.set_pattern_high(0x00);
        bg.set_attribute_bits(0);
        bg.reload_shifters();
        for _ in 0..8 {
            bg.shift();
        }
        // Second tile: transparent.
        bg.set_pattern_low(0x00);
        bg.set_pattern_high(0x00);
        bg.reload_shifters();

        // Bit 15 belongs to the first tile, bit 7 to the second.
        assert_eq!(bg.pixel(0).0, 1);
        for _ in 0..8 {
            bg.shift();
        }
        assert_eq!(bg.pixel(0).0, 0);
    }
}
