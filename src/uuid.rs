//! BLE UUIDs (16 or 128 bits).
//!
//! Bluetooth assigns UUIDs to identify services, characteristics and descriptors. Standardized
//! types use 16-bit aliases; vendor-defined types like the MIDI service use the full 128 bits.
//!
//! A 16-bit alias can be converted to its full 128-bit counterpart by placing it in bytes 2 and 3
//! of the Bluetooth Base UUID `00000000-0000-1000-8000-00805F9B34FB`, so `0x2902` becomes
//! `00002902-0000-1000-8000-00805F9B34FB`.
//!
//! UUIDs are stored here in the order they are printed (big-endian). The attribute protocol
//! transmits them least significant byte first, which the [`ToBytes`]/[`FromBytes`] impls take
//! care of.

use crate::{bytes::*, Error};
use core::fmt;

const BASE_UUID: [u8; 16] = [
    0x00, 0x00, 0x00, 0x00, /*-*/ 0x00, 0x00, /*-*/ 0x10, 0x00, /*-*/ 0x80, 0x00,
    /*-*/ 0x00, 0x80, 0x5F, 0x9B, 0x34, 0xFB,
];

/// A 16-bit UUID alias.
///
/// Can be converted to its 128-bit equivalent via `.into()`.
#[derive(PartialEq, Eq, Copy, Clone)]
pub struct Uuid16(pub u16);

/// A full 128-bit UUID.
#[derive(PartialEq, Eq, Copy, Clone)]
pub struct Uuid128([u8; 16]);

impl Uuid128 {
    /// Creates a 128-bit UUID from 16 raw bytes, given in the order they are printed
    /// (big-endian).
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl From<Uuid16> for Uuid128 {
    fn from(uuid: Uuid16) -> Self {
        let mut bytes = BASE_UUID;
        bytes[2..4].copy_from_slice(&uuid.0.to_be_bytes());
        Uuid128(bytes)
    }
}

impl ToBytes for Uuid16 {
    fn to_bytes(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error> {
        writer.write_slice(&self.0.to_le_bytes())
    }
}

impl ToBytes for Uuid128 {
    fn to_bytes(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error> {
        let mut bytes = self.0;
        bytes.reverse();
        writer.write_slice(&bytes)
    }
}

impl FromBytes<'_> for Uuid16 {
    fn from_bytes(bytes: &mut ByteReader<'_>) -> Result<Self, Error> {
        let array = bytes.read_array()?;
        Ok(Uuid16(u16::from_le_bytes(array)))
    }
}

impl FromBytes<'_> for Uuid128 {
    fn from_bytes(bytes: &mut ByteReader<'_>) -> Result<Self, Error> {
        let mut array: [u8; 16] = bytes.read_array()?;
        array.reverse();
        Ok(Uuid128(array))
    }
}

impl fmt::Debug for Uuid16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uuid16({:04x})", self.0)
    }
}

impl fmt::Debug for Uuid128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [_0, _1, _2, _3, _4, _5, _6, _7, _8, _9, _10, _11, _12, _13, _14, _15] = self.0;
        let a = u32::from_be_bytes([_0, _1, _2, _3]);
        let b = u16::from_be_bytes([_4, _5]);
        let c = u16::from_be_bytes([_6, _7]);
        let d = u16::from_be_bytes([_8, _9]);
        let e = u64::from_be_bytes([0, 0, _10, _11, _12, _13, _14, _15]);
        write!(f, "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}", a, b, c, d, e)
    }
}
