//! A BLE-MIDI service core: the MIDI-over-GATT packet codec plus the state around it.
//!
//! The radio, attribute table and connection management belong to a host Bluetooth stack; this
//! crate implements what such a stack cannot know about MIDI:
//!
//! * [`packet`] encodes and decodes the BLE-MIDI payloads carried by characteristic writes and
//!   notifications, including running status and timestamp reconstruction.
//! * [`midi`] is the event model those payloads decode into.
//! * [`gatt`] holds the BLE-MIDI UUIDs and attribute declaration values the host stack needs to
//!   register the service.
//! * [`session`] consumes the host stack's connection events and gates outbound notifications
//!   on connection and subscription state.
//! * [`mailbox`] hands the latest event to a consumer that polls for it.
//!
//! Nothing here allocates; packet buffers are borrowed from the caller or fixed-size.
//!
//! # Example
//!
//! ```
//! use bluemidi::gatt::AttHandle;
//! use bluemidi::mailbox::Mailbox;
//! use bluemidi::session::{ConnHandle, HostEvent, MidiSession};
//!
//! let mut session = MidiSession::new(AttHandle::from_raw(0x0010));
//! let mut latest = Mailbox::new();
//!
//! // reported by the host stack
//! let conn = ConnHandle::from_raw(1);
//! session.handle_event(HostEvent::Connect { conn })?;
//!
//! // the central writes one Note On to the MIDI I/O characteristic
//! let events = session.handle_event(HostEvent::Write {
//!     conn,
//!     payload: &[0x80, 0x80, 0x90, 0x3C, 0x40],
//! })?;
//! for event in events {
//!     latest.publish(event);
//! }
//!
//! let event = latest.take().unwrap();
//! assert_eq!(format!("{}", event), "note on: note 60 velocity 64 (channel 0)");
//! assert!(latest.take().is_none());
//! # Ok::<(), bluemidi::Error>(())
//! ```
//!
//! [`packet`]: packet/index.html
//! [`midi`]: midi/index.html
//! [`gatt`]: gatt/index.html
//! [`session`]: session/index.html
//! [`mailbox`]: mailbox/index.html

// We're `#[no_std]`, except when we're testing
#![cfg_attr(not(test), no_std)]
// Deny a few warnings in doctests, since rustdoc `allow`s many warnings by default
#![doc(test(attr(deny(unused_imports, unused_must_use))))]
#![warn(rust_2018_idioms)]
// The claims of this lint are dubious, disable it
#![allow(clippy::trivially_copy_pass_by_ref)]

#[macro_use]
mod log;
pub mod bytes;
mod error;
pub mod gatt;
pub mod mailbox;
pub mod midi;
pub mod packet;
pub mod session;
pub mod timestamp;
mod utils;
pub mod uuid;

pub use self::error::Error;
