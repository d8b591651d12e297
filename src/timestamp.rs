//! 13-bit BLE-MIDI timestamps.
//!
//! Every MIDI message carried over GATT is tagged with a millisecond timestamp. The wire format
//! splits it across two bytes: the packet header carries bits 12..7, and a timestamp byte in
//! front of the message carries bits 6..0. Thirteen bits of milliseconds wrap around every 8.192
//! seconds, so the value orders events within a short window rather than providing absolute
//! time. Senders keep it monotonic within a session; receivers re-derive wraps from the low bits
//! running backwards.

use core::fmt;

/// A 13-bit millisecond timestamp attached to each MIDI message.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Timestamp(u16);

impl Timestamp {
    /// The timestamp at tick 0.
    pub const ZERO: Self = Timestamp(0);

    /// Number of ticks after which timestamps wrap back to 0.
    pub const PERIOD: u16 = 1 << 13;

    /// Creates a timestamp from a raw tick count, keeping only the low 13 bits.
    pub const fn from_raw(raw: u16) -> Self {
        Timestamp(raw & (Self::PERIOD - 1))
    }

    /// Creates a timestamp from a millisecond clock reading, keeping only the low 13 bits.
    ///
    /// This is the conversion an application performs when stamping outbound events from its
    /// local clock.
    pub fn from_millis(millis: u32) -> Self {
        Timestamp(millis as u16 & (Self::PERIOD - 1))
    }

    /// Returns the raw 13-bit tick count (0..=8191).
    pub const fn raw(&self) -> u16 {
        self.0
    }

    /// Adds `ticks` milliseconds to `self`, wrapping at the 13-bit boundary.
    pub fn wrapping_add(&self, ticks: u16) -> Self {
        Timestamp(self.0.wrapping_add(ticks) & (Self::PERIOD - 1))
    }

    /// Splits `self` into the header bits (12..7) and the timestamp byte bits (6..0).
    pub(crate) fn split(&self) -> (u8, u8) {
        (((self.0 >> 7) & 0x3F) as u8, (self.0 & 0x7F) as u8)
    }

    /// Recombines the header bits (12..7) and timestamp byte bits (6..0) of a received message.
    pub(crate) fn combine(high: u8, low: u8) -> Self {
        Timestamp((u16::from(high & 0x3F) << 7) | u16::from(low & 0x7F))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_to_13_bits() {
        assert_eq!(Timestamp::from_raw(0xFFFF).raw(), Timestamp::PERIOD - 1);
        assert_eq!(Timestamp::from_millis(u32::from(Timestamp::PERIOD)).raw(), 0);
        assert_eq!(Timestamp::from_millis(8193), Timestamp::from_raw(1));
    }

    #[test]
    fn wraps_at_period() {
        let late = Timestamp::from_raw(Timestamp::PERIOD - 1);
        assert_eq!(late.wrapping_add(1), Timestamp::ZERO);
        assert_eq!(late.wrapping_add(3).raw(), 2);
    }

    #[test]
    fn split_and_combine_round_trip() {
        let ts = Timestamp::from_raw(0x1ABC);
        let (high, low) = ts.split();
        assert_eq!(high, 0x35);
        assert_eq!(low, 0x3C);
        assert_eq!(Timestamp::combine(high, low), ts);
    }
}
