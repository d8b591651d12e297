//! MIDI message model.
//!
//! The decoder turns BLE-MIDI payloads into [`MidiEvent`]s; the encoder turns them back into
//! payloads. Note On, Note Off and Control Change get their own [`MessageKind`] variants since
//! they are what MIDI controllers emit almost exclusively; everything else is carried as
//! [`MessageKind::Other`] with the raw status byte, so no inbound message is lost.

use crate::timestamp::Timestamp;
use crate::utils::Hex;
use core::fmt;

/// A MIDI channel number (0..=15), the low nibble of a status byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Channel(u8);

impl Channel {
    /// Creates a channel from a raw byte, keeping only the low 4 bits.
    ///
    /// Passing a full status byte extracts its channel nibble.
    pub const fn new(raw: u8) -> Self {
        Channel(raw & 0x0F)
    }

    /// Returns the channel number (0..=15).
    pub const fn raw(&self) -> u8 {
        self.0
    }
}

/// Classifies a MIDI message by its status byte.
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// Key released (status `0x8n`).
    NoteOff,
    /// Key pressed (status `0x9n`).
    NoteOn,
    /// Controller value changed (status `0xBn`).
    ControlChange,
    /// Any other message, carrying its raw status byte.
    Other(u8),
}

impl MessageKind {
    /// Classifies a raw status byte.
    pub fn from_status(status: u8) -> Self {
        match status & 0xF0 {
            0x80 => MessageKind::NoteOff,
            0x90 => MessageKind::NoteOn,
            0xB0 => MessageKind::ControlChange,
            _ => MessageKind::Other(status),
        }
    }

    /// Returns the number of data bytes (0..=2) that follow this kind of status byte.
    ///
    /// SysEx payloads are unbounded and not representable in a [`MidiEvent`]; `0xF0` reports 0
    /// here and the decoder drops the payload bytes separately.
    pub fn data_len(&self) -> usize {
        match self {
            MessageKind::NoteOff | MessageKind::NoteOn | MessageKind::ControlChange => 2,
            MessageKind::Other(status) => match status & 0xF0 {
                // note off/on, poly aftertouch, control change, pitch bend
                0x80 | 0x90 | 0xA0 | 0xB0 | 0xE0 => 2,
                // program change, channel aftertouch
                0xC0 | 0xD0 => 1,
                0xF0 => match status {
                    // MTC quarter frame, song select
                    0xF1 | 0xF3 => 1,
                    // song position pointer
                    0xF2 => 2,
                    // SysEx delimiters, tune request, real-time
                    _ => 0,
                },
                _ => 0,
            },
        }
    }

    fn status_nibble(&self) -> u8 {
        match self {
            MessageKind::NoteOff => 0x80,
            MessageKind::NoteOn => 0x90,
            MessageKind::ControlChange => 0xB0,
            MessageKind::Other(status) => status & 0xF0,
        }
    }
}

impl fmt::Debug for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::NoteOff => f.write_str("NoteOff"),
            MessageKind::NoteOn => f.write_str("NoteOn"),
            MessageKind::ControlChange => f.write_str("ControlChange"),
            MessageKind::Other(status) => f.debug_tuple("Other").field(&Hex(*status)).finish(),
        }
    }
}

/// Returns whether `status` is a System Real-Time status byte (`0xF8..=0xFF`).
///
/// Real-time messages may interleave anywhere in a stream, even between the data bytes of
/// another message, and do not disturb running status.
pub fn is_system_realtime(status: u8) -> bool {
    status >= 0xF8
}

/// A decoded MIDI message plus its 13-bit timestamp.
///
/// Events are constructed by the decoder (or by the constructors below for outbound use),
/// consumed right away, and never persisted. Internally an event stores its wire status byte;
/// [`kind`][Self::kind] and [`channel`][Self::channel] are views of it, and data bytes beyond
/// the message's arity are cleared. Value equality is therefore exactly wire equality.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct MidiEvent {
    status: u8,
    data: [u8; 2],
    timestamp: Timestamp,
}

impl MidiEvent {
    /// Creates an event from its parts.
    ///
    /// `kind` and `channel` are folded into a single status byte and re-derived from it by the
    /// accessors, so a hand-built [`MessageKind::Other`] whose upper nibble is a Note On/Off or
    /// Control Change nibble comes back as that named kind. Data bytes are masked to 7 bits and
    /// cleared beyond the arity of the resulting status.
    pub fn new(kind: MessageKind, channel: Channel, data1: u8, data2: u8, timestamp: Timestamp) -> Self {
        Self::from_raw(
            kind.status_nibble() | channel.raw(),
            data1,
            data2,
            timestamp,
        )
    }

    /// Builds an event from a raw status byte and its data bytes.
    pub fn from_raw(status: u8, data1: u8, data2: u8, timestamp: Timestamp) -> Self {
        let mut data = [data1 & 0x7F, data2 & 0x7F];
        let len = MessageKind::from_status(status).data_len();
        if len < 2 {
            data[1] = 0;
        }
        if len < 1 {
            data[0] = 0;
        }
        MidiEvent {
            status,
            data,
            timestamp,
        }
    }

    /// Creates a Note On event.
    pub fn note_on(channel: Channel, note: u8, velocity: u8, timestamp: Timestamp) -> Self {
        Self::new(MessageKind::NoteOn, channel, note, velocity, timestamp)
    }

    /// Creates a Note Off event.
    pub fn note_off(channel: Channel, note: u8, velocity: u8, timestamp: Timestamp) -> Self {
        Self::new(MessageKind::NoteOff, channel, note, velocity, timestamp)
    }

    /// Creates a Control Change event.
    pub fn control_change(channel: Channel, controller: u8, value: u8, timestamp: Timestamp) -> Self {
        Self::new(MessageKind::ControlChange, channel, controller, value, timestamp)
    }

    /// Returns the kind of message.
    pub fn kind(&self) -> MessageKind {
        MessageKind::from_status(self.status)
    }

    /// Returns the channel the message addresses (for System messages, the low nibble of the
    /// status byte).
    pub fn channel(&self) -> Channel {
        Channel::new(self.status)
    }

    /// Returns the first data byte (note number, controller number), or 0 when the message
    /// carries none.
    pub fn data1(&self) -> u8 {
        self.data[0]
    }

    /// Returns the second data byte (velocity, controller value), or 0 when the message carries
    /// fewer than two.
    pub fn data2(&self) -> u8 {
        self.data[1]
    }

    /// Returns the data bytes this event carries on the wire.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.kind().data_len()]
    }

    /// Returns the timestamp reconstructed from (or destined for) the wire.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Returns a copy of `self` carrying `timestamp` instead.
    pub fn with_timestamp(self, timestamp: Timestamp) -> Self {
        MidiEvent { timestamp, ..self }
    }

    /// Returns the status byte encoding this event's kind and channel.
    pub fn status_byte(&self) -> u8 {
        self.status
    }
}

impl fmt::Debug for MidiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MidiEvent")
            .field("kind", &self.kind())
            .field("channel", &self.channel().raw())
            .field("data", &self.data())
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

impl fmt::Display for MidiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            MessageKind::NoteOn => write!(
                f,
                "note on: note {} velocity {} (channel {})",
                self.data[0],
                self.data[1],
                self.channel().raw()
            ),
            MessageKind::NoteOff => write!(
                f,
                "note off: note {} velocity {} (channel {})",
                self.data[0],
                self.data[1],
                self.channel().raw()
            ),
            MessageKind::ControlChange => write!(
                f,
                "control change: controller {} value {} (channel {})",
                self.data[0],
                self.data[1],
                self.channel().raw()
            ),
            MessageKind::Other(..) => {
                write!(f, "status {:#04x}", self.status)?;
                for (i, byte) in self.data().iter().enumerate() {
                    write!(f, " data{} {}", i + 1, byte)?;
                }
                Ok(())
            }
        }
    }
}
