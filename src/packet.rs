//! BLE-MIDI packet decoding and encoding.
//!
//! A packet is the payload of one GATT write or notification. It opens with a header byte and
//! then carries one or more timestamped MIDI messages:
//!
//! ```notrust
//! byte 0            byte 1            byte 2            bytes 3..
//! +-----------------+-----------------+-----------------+------- - - -
//! |1 0 h h h h h h  |1 l l l l l l l  |1 s s s s s s s  | data ...
//! +-----------------+-----------------+-----------------+------- - - -
//!  header            timestamp         status
//!  h = ts bits 12..7  l = ts bits 6..0
//! ```
//!
//! MIDI data bytes have their high bit clear; header, timestamp and status bytes all have it
//! set. Timestamp and status bytes can hold the same values, so they are told apart by position
//! alone: after the header and after every complete message the next high-bit byte is a
//! timestamp, and only a byte directly following a timestamp byte is a status. A message may
//! omit its status byte to reuse the previous one (running status), with or without a fresh
//! timestamp byte in front of its data. A timestamp byte lower than its predecessor means the
//! 13-bit clock moved past a multiple of 128 ticks, which bumps the reconstructed high bits.

use crate::bytes::{ByteReader, ByteWriter};
use crate::midi::{is_system_realtime, MessageKind, MidiEvent};
use crate::timestamp::Timestamp;
use crate::utils::HexSlice;
use crate::Error;
use core::fmt;

/// An inbound packet whose header has been checked.
pub struct Packet<'a> {
    ts_high: u8,
    body: &'a [u8],
}

impl<'a> Packet<'a> {
    /// Parses the header byte of `payload`.
    ///
    /// Returns [`Error::MissingHeader`] when byte 0 does not have its high bit set, and
    /// [`Error::Eof`] when the payload is empty. Message decoding happens lazily in the
    /// iterator returned by [`events`][Self::events].
    pub fn parse(payload: &'a [u8]) -> Result<Self, Error> {
        let mut bytes = ByteReader::new(payload);
        let header = bytes.read_u8()?;
        if header & 0x80 == 0 {
            return Err(Error::MissingHeader);
        }
        Ok(Packet {
            ts_high: header & 0x3F,
            body: bytes.read_rest(),
        })
    }

    /// Returns an iterator over the complete MIDI messages in the packet.
    ///
    /// Malformed bytes do not abort iteration: data without a status to attach to is skipped,
    /// and an incomplete message at the end of the packet is dropped.
    pub fn events(&self) -> Events<'a> {
        Events::over(self.body, self.ts_high)
    }
}

impl fmt::Debug for Packet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("ts_high", &self.ts_high)
            .field("body", &HexSlice(self.body))
            .finish()
    }
}

/// Iterator over the MIDI messages of a [`Packet`], in arrival order.
#[derive(Debug)]
pub struct Events<'a> {
    bytes: ByteReader<'a>,
    /// High 6 bits of the packet clock, bumped when a timestamp byte wraps.
    ts_high: u8,
    /// Low 7 bits of the most recent timestamp byte.
    ts_low: u8,
    /// Set while the previously consumed byte was a timestamp byte.
    after_timestamp: bool,
    /// Status reused by messages that omit their own (running status).
    running: Option<u8>,
    /// Status of the message currently collecting data bytes.
    current: Option<u8>,
    /// Clock value latched when the current message started.
    current_ts: Timestamp,
    data: [u8; 2],
    have: usize,
}

impl<'a> Events<'a> {
    fn over(body: &'a [u8], ts_high: u8) -> Self {
        Events {
            bytes: ByteReader::new(body),
            ts_high,
            ts_low: 0,
            after_timestamp: false,
            running: None,
            current: None,
            current_ts: Timestamp::ZERO,
            data: [0; 2],
            have: 0,
        }
    }

    /// Returns an iterator that yields nothing.
    pub(crate) fn empty() -> Self {
        Events::over(&[], 0)
    }

    fn clock(&self) -> Timestamp {
        Timestamp::combine(self.ts_high, self.ts_low)
    }
}

impl Iterator for Events<'_> {
    type Item = MidiEvent;

    fn next(&mut self) -> Option<MidiEvent> {
        loop {
            let byte = match self.bytes.read_u8() {
                Ok(byte) => byte,
                // end of packet; an incomplete trailing message is dropped
                Err(_) => return None,
            };

            if byte & 0x80 == 0 {
                // data byte
                self.after_timestamp = false;
                let status = match (self.current, self.running) {
                    (Some(status), _) => status,
                    (None, Some(status)) => {
                        // running status, this data byte opens a new message
                        self.current = Some(status);
                        self.current_ts = self.clock();
                        self.have = 0;
                        status
                    }
                    // nothing to attach to (eg. a SysEx payload), skip
                    (None, None) => continue,
                };
                self.data[self.have] = byte;
                self.have += 1;
                if self.have == MessageKind::from_status(status).data_len() {
                    self.current = None;
                    return Some(MidiEvent::from_raw(
                        status,
                        self.data[0],
                        self.data[1],
                        self.current_ts,
                    ));
                }
            } else if !self.after_timestamp {
                // timestamp byte
                let low = byte & 0x7F;
                if low < self.ts_low {
                    self.ts_high = (self.ts_high + 1) & 0x3F;
                }
                self.ts_low = low;
                self.after_timestamp = true;
            } else {
                // status byte
                self.after_timestamp = false;
                if is_system_realtime(byte) {
                    // real-time interleaves anywhere and leaves running status and a
                    // half-collected message untouched
                    return Some(MidiEvent::from_raw(byte, 0, 0, self.clock()));
                }
                // any other status aborts a half-collected message
                self.current = None;
                self.running = if byte < 0xF0 { Some(byte) } else { None };
                if MessageKind::from_status(byte).data_len() == 0 {
                    return Some(MidiEvent::from_raw(byte, 0, 0, self.clock()));
                }
                self.current = Some(byte);
                self.current_ts = self.clock();
                self.have = 0;
            }
        }
    }
}

/// Builds an outbound packet, appending events with running-status compression.
pub struct PacketBuf<'a> {
    writer: ByteWriter<'a>,
    capacity: usize,
    prev: Option<Prev>,
}

#[derive(Copy, Clone)]
struct Prev {
    ts_high: u8,
    ts_low: u8,
    status: u8,
}

impl<'a> PacketBuf<'a> {
    /// Creates an empty packet writing into `buf`.
    ///
    /// Nothing is written until the first [`push`][Self::push], which also writes the header.
    pub fn new(buf: &'a mut [u8]) -> Self {
        PacketBuf {
            capacity: buf.len(),
            writer: ByteWriter::new(buf),
            prev: None,
        }
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.capacity - self.writer.space_left()
    }

    /// Returns whether no event has been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.prev.is_none()
    }

    /// Appends `event` to the packet.
    ///
    /// Later pushes omit the status byte while it matches the previous message (running
    /// status) and the timestamp byte while the clock is unchanged.
    ///
    /// Mid-packet timestamp bytes carry only the low 7 clock bits and the high bits advance
    /// exactly when the low bits decrease, so a pushed timestamp must be reachable that way
    /// from its predecessor: not backwards, and less than 128 ticks past the previous multiple
    /// of 128. Anything else fails with [`Error::InvalidValue`]; such streams need a new
    /// packet per timestamp. A push that does not fit the buffer fails with [`Error::Eof`],
    /// leaving the packet unchanged.
    pub fn push(&mut self, event: &MidiEvent) -> Result<(), Error> {
        let (ts_high, ts_low) = event.timestamp().split();
        let status = event.status_byte();
        let data = event.data();

        match self.prev {
            None => {
                if self.writer.space_left() < 3 + data.len() {
                    return Err(Error::Eof);
                }
                self.writer.write_u8(0x80 | ts_high)?;
                self.writer.write_u8(0x80 | ts_low)?;
                self.writer.write_u8(status)?;
                self.writer.write_slice(data)?;
            }
            Some(prev) => {
                let bumped_high = (prev.ts_high + 1) & 0x3F;
                let reachable = (ts_high == prev.ts_high && ts_low >= prev.ts_low)
                    || (ts_high == bumped_high && ts_low < prev.ts_low);
                if !reachable {
                    return Err(Error::InvalidValue);
                }

                let running = status == prev.status && status < 0xF0;
                let need_timestamp =
                    !running || ts_low != prev.ts_low || ts_high != prev.ts_high;
                let needed = data.len() + usize::from(need_timestamp) + usize::from(!running);
                if self.writer.space_left() < needed {
                    return Err(Error::Eof);
                }
                if need_timestamp {
                    self.writer.write_u8(0x80 | ts_low)?;
                }
                if !running {
                    self.writer.write_u8(status)?;
                }
                self.writer.write_slice(data)?;
            }
        }

        self.prev = Some(Prev {
            ts_high,
            ts_low,
            status,
        });
        Ok(())
    }
}

impl fmt::Debug for PacketBuf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketBuf")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Encodes a single event as a complete packet, returning the number of bytes written.
///
/// This is the usual payload of one notification. The output always starts with the header and
/// a timestamp byte. The buffer must hold 3 bytes plus the event's data bytes, or the call
/// fails with [`Error::Eof`].
pub fn encode(event: &MidiEvent, buf: &mut [u8]) -> Result<usize, Error> {
    let mut packet = PacketBuf::new(buf);
    packet.push(event)?;
    Ok(packet.len())
}
