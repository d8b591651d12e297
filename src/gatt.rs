//! GATT building blocks of the MIDI service.
//!
//! The host stack owns the attribute table and the ATT transactions on it; this module provides
//! what registering the service needs: the BLE-MIDI UUIDs, attribute declaration values in wire
//! order, and the client configuration word that gates notifications.
//!
//! The layout is the one every BLE-MIDI peer expects:
//!
//! * Primary service `03B80E5A-EDE8-4B33-A751-6CE34EC4C700`.
//! * One MIDI I/O characteristic `7772E5DB-3868-4112-A1A9-F2669D106BF3`, readable, writable
//!   with and without response, and notifiable.
//! * A Client Characteristic Configuration descriptor on that characteristic.

use crate::bytes::{ByteWriter, ToBytes};
use crate::uuid::{Uuid128, Uuid16};
use crate::Error;
use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};
use core::fmt;

/// UUID of the BLE-MIDI primary service.
pub const MIDI_SERVICE_UUID: Uuid128 = Uuid128::from_bytes([
    0x03, 0xB8, 0x0E, 0x5A, 0xED, 0xE8, 0x4B, 0x33, 0xA7, 0x51, 0x6C, 0xE3, 0x4E, 0xC4, 0xC7,
    0x00,
]);

/// UUID of the MIDI I/O characteristic inside the service.
pub const MIDI_IO_UUID: Uuid128 = Uuid128::from_bytes([
    0x77, 0x72, 0xE5, 0xDB, 0x38, 0x68, 0x41, 0x12, 0xA1, 0xA9, 0xF2, 0x66, 0x9D, 0x10, 0x6B,
    0xF3,
]);

/// Attribute type of a primary service declaration.
pub const PRIMARY_SERVICE: Uuid16 = Uuid16(0x2800);

/// Attribute type of a characteristic declaration.
pub const CHARACTERISTIC: Uuid16 = Uuid16(0x2803);

/// Attribute type of the Client Characteristic Configuration descriptor.
pub const CLIENT_CHARACTERISTIC_CONFIGURATION: Uuid16 = Uuid16(0x2902);

bitflags! {
    /// Characteristic properties, the first byte of a characteristic declaration.
    pub struct Properties: u8 {
        const BROADCAST    = 0x01;
        const READ         = 0x02;
        const WRITE_NO_RSP = 0x04;
        const WRITE        = 0x08;
        const NOTIFY       = 0x10;
        const INDICATE     = 0x20;
        const AUTH_WRITES  = 0x40;
        const EXTENDED     = 0x80;
    }
}

/// Properties of the MIDI I/O characteristic.
pub const MIDI_IO_PROPERTIES: Properties = Properties::from_bits_truncate(
    Properties::READ.bits()
        | Properties::WRITE_NO_RSP.bits()
        | Properties::WRITE.bits()
        | Properties::NOTIFY.bits(),
);

/// Handle of an attribute in the host stack's table (`0x0000` is invalid).
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct AttHandle(u16);

impl AttHandle {
    pub fn from_raw(raw: u16) -> Self {
        AttHandle(raw)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Debug for AttHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttHandle({:#06X})", self.0)
    }
}

/// Value of the service declaration attribute (type [`PRIMARY_SERVICE`]).
#[derive(Debug, Copy, Clone)]
pub struct ServiceDeclaration {
    pub uuid: Uuid128,
}

impl ServiceDeclaration {
    /// Encoded size of the declaration value in bytes.
    pub const SIZE: usize = 16;

    /// The declaration of the BLE-MIDI service.
    pub fn midi() -> Self {
        ServiceDeclaration {
            uuid: MIDI_SERVICE_UUID,
        }
    }
}

impl ToBytes for ServiceDeclaration {
    fn to_bytes(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error> {
        self.uuid.to_bytes(writer)
    }
}

/// Value of a characteristic declaration attribute (type [`CHARACTERISTIC`]).
#[derive(Debug, Copy, Clone)]
pub struct CharacteristicDeclaration {
    pub properties: Properties,
    /// Handle of the attribute holding the characteristic's value.
    pub value_handle: AttHandle,
    pub uuid: Uuid128,
}

impl CharacteristicDeclaration {
    /// Encoded size of the declaration value in bytes.
    pub const SIZE: usize = 19;

    /// The declaration of the MIDI I/O characteristic.
    pub fn midi_io(value_handle: AttHandle) -> Self {
        CharacteristicDeclaration {
            properties: MIDI_IO_PROPERTIES,
            value_handle,
            uuid: MIDI_IO_UUID,
        }
    }
}

impl ToBytes for CharacteristicDeclaration {
    fn to_bytes(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error> {
        writer.write_u8(self.properties.bits())?;
        writer.write_u16_le(self.value_handle.as_u16())?;
        self.uuid.to_bytes(writer)
    }
}

/// Value of the Client Characteristic Configuration descriptor.
///
/// The peer writes this 16-bit word to opt in to server-initiated updates; bit 0 enables
/// notifications, bit 1 indications.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub struct ClientConfig(u16);

impl ClientConfig {
    /// Parses a descriptor write.
    ///
    /// The value is little-endian and must be at least 2 bytes; peers may append reserved bytes,
    /// which are ignored.
    pub fn parse(raw: &[u8]) -> Result<Self, Error> {
        if raw.len() < 2 {
            return Err(Error::Eof);
        }
        Ok(ClientConfig(LittleEndian::read_u16(raw)))
    }

    /// Returns the raw configuration word.
    pub fn to_u16(&self) -> u16 {
        self.0
    }

    /// Returns whether the peer asked for notifications.
    pub fn notifications(&self) -> bool {
        self.0 & 0x0001 != 0
    }

    /// Returns whether the peer asked for indications.
    pub fn indications(&self) -> bool {
        self.0 & 0x0002 != 0
    }
}

impl ToBytes for ClientConfig {
    fn to_bytes(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error> {
        writer.write_u16_le(self.0)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("notifications", &self.notifications())
            .field("indications", &self.indications())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_print_canonically() {
        assert_eq!(
            format!("{:?}", MIDI_SERVICE_UUID),
            "03b80e5a-ede8-4b33-a751-6ce34ec4c700"
        );
        assert_eq!(
            format!("{:?}", MIDI_IO_UUID),
            "7772e5db-3868-4112-a1a9-f2669d106bf3"
        );
    }

    #[test]
    fn service_declaration_wire_value() {
        let mut buf = [0; ServiceDeclaration::SIZE];
        let mut writer = ByteWriter::new(&mut buf);
        ServiceDeclaration::midi().to_bytes(&mut writer).unwrap();
        assert_eq!(writer.space_left(), 0);
        assert_eq!(
            buf,
            [
                0x00, 0xC7, 0xC4, 0x4E, 0xE3, 0x6C, 0x51, 0xA7, 0x33, 0x4B, 0xE8, 0xED, 0x5A,
                0x0E, 0xB8, 0x03
            ]
        );
    }

    #[test]
    fn characteristic_declaration_wire_value() {
        let decl = CharacteristicDeclaration::midi_io(AttHandle::from_raw(0x002A));
        let mut buf = [0; CharacteristicDeclaration::SIZE];
        let mut writer = ByteWriter::new(&mut buf);
        decl.to_bytes(&mut writer).unwrap();
        assert_eq!(writer.space_left(), 0);
        assert_eq!(buf[0], 0x1E);
        assert_eq!(&buf[1..3], &[0x2A, 0x00]);
        assert_eq!(
            &buf[3..],
            &[
                0xF3, 0x6B, 0x10, 0x9D, 0x66, 0xF2, 0xA9, 0xA1, 0x12, 0x41, 0x68, 0x38, 0xDB,
                0xE5, 0x72, 0x77
            ]
        );
    }

    #[test]
    fn client_config_parsing() {
        let config = ClientConfig::parse(&[0x01, 0x00]).unwrap();
        assert!(config.notifications());
        assert!(!config.indications());

        let config = ClientConfig::parse(&[0x02, 0x00]).unwrap();
        assert!(!config.notifications());
        assert!(config.indications());

        assert_eq!(ClientConfig::parse(&[0x01]).unwrap_err(), Error::Eof);
        assert!(!ClientConfig::default().notifications());
    }

    #[test]
    fn client_config_writes_little_endian() {
        let config = ClientConfig::parse(&[0x03, 0x00]).unwrap();
        let mut buf = [0; 2];
        let mut writer = ByteWriter::new(&mut buf);
        config.to_bytes(&mut writer).unwrap();
        assert_eq!(buf, [0x03, 0x00]);
        assert_eq!(config.to_u16(), 0x0003);
    }

    #[test]
    fn midi_io_properties_cover_read_write_notify() {
        assert_eq!(MIDI_IO_PROPERTIES.bits(), 0x1E);
        assert!(MIDI_IO_PROPERTIES.contains(Properties::WRITE_NO_RSP));
        assert!(!MIDI_IO_PROPERTIES.contains(Properties::INDICATE));
    }
}
