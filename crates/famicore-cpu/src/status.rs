//! CPU Status Register (P register) flags.
//!
//! ```text
//! 7  6  5  4  3  2  1  0
//! N  V  U  B  D  I  Z  C
//! │  │  │  │  │  │  │  └─ Carry
//! │  │  │  │  │  │  └──── Zero
//! │  │  │  │  │  └─────── Interrupt Disable
//! │  │  │  │  └────────── Decimal Mode (settable but ignored by the 2A03)
//! │  │  │  └───────────── Break (stack image only: 1 from PHP/BRK, 0 from IRQ/NMI)
//! │  │  └──────────────── Unused (always 1)
//! │  └─────────────────── Overflow
//! └────────────────────── Negative
//! ```

use bitflags::bitflags;

bitflags! {
    /// CPU status register flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Status: u8 {
        /// Carry flag.
        const C = 1 << 0;
        /// Zero flag.
        const Z = 1 << 1;
        /// Interrupt disable flag. Gates IRQ but never NMI.
        const I = 1 << 2;
        /// Decimal mode flag. CLD/SED toggle it; ADC/SBC ignore it.
        const D = 1 << 3;
        /// Break flag. Only meaningful in the stack image.
        const B = 1 << 4;
        /// Unused flag. Always reads as 1.
        const U = 1 << 5;
        /// Overflow flag.
        const V = 1 << 6;
        /// Negative flag (bit 7 of the last result).
        const N = 1 << 7;
    }
}

impl Status {
    /// Status after reset: I and U set ($24).
    pub const RESET: Self = Self::I.union(Self::U);

    /// Sets or clears the Zero and Negative flags from a result byte.
    #[inline]
    pub fn set_zn(&mut self, value: u8) {
        self.set_flag(Self::Z, value == 0);
        self.set_flag(Self::N, value & 0x80 != 0);
    }

    /// Sets or clears a flag.
    #[inline]
    pub fn set_flag(&mut self, flag: Self, value: bool) {
        if value {
            *self |= flag;
        } else {
            *self &= !flag;
        }
    }

    /// The byte pushed to the stack. U is always set; B reflects
    /// whether the push came from PHP/BRK rather than an interrupt.
    #[inline]
    #[must_use]
    pub const fn to_stack_byte(self, brk: bool) -> u8 {
        let mut value = self.bits() | Self::U.bits();
        if brk {
            value |= Self::B.bits();
        }
        value
    }

    /// Restore from a byte pulled off the stack: B is discarded, U is
    /// forced on.
    #[inline]
    #[must_use]
    pub fn from_stack_byte(value: u8) -> Self {
        Self::from_bits_truncate((value & !Self::B.bits()) | Self::U.bits())
    }
}
