//! Connection state and event dispatch for one MIDI session.
//!
//! The host stack owns connections, MTU negotiation and the attribute table; it reports what
//! happens on them as [`HostEvent`]s. [`MidiSession`] consumes those, keeps the little state
//! the service needs (the active connection, its MTU and client configuration) and hands
//! decoded MIDI back to the application. Outbound, [`notify`][MidiSession::notify] packs an
//! event into a notification for the host stack to transmit, refusing while there is no
//! subscribed peer.
//!
//! Only one connection is tracked. A new one replaces the old, and events carrying any other
//! handle are logged and ignored.

use crate::gatt::{AttHandle, ClientConfig};
use crate::midi::MidiEvent;
use crate::packet::{Events, Packet, PacketBuf};
use crate::utils::HexSlice;
use crate::Error;
use core::fmt;
use heapless::Vec;

/// MTU every connection starts out with until the peer negotiates a larger one.
pub const DEFAULT_ATT_MTU: u16 = 23;

/// Upper bound on a notification payload. Payloads are further limited by the connection MTU.
pub const MAX_NOTIFY_PAYLOAD: usize = 64;

/// Handle identifying a connection of the host stack.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct ConnHandle(u16);

impl ConnHandle {
    pub fn from_raw(raw: u16) -> Self {
        ConnHandle(raw)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Debug for ConnHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnHandle({:#06X})", self.0)
    }
}

/// What the host stack tells the service about its connections and characteristic accesses.
#[derive(Debug, Copy, Clone)]
pub enum HostEvent<'a> {
    /// A central connected.
    Connect { conn: ConnHandle },
    /// The connection went away, for whatever reason.
    Disconnect { conn: ConnHandle },
    /// The peer wrote the Client Characteristic Configuration descriptor.
    Subscribe { conn: ConnHandle, config: ClientConfig },
    /// The ATT MTU was renegotiated.
    MtuChanged { conn: ConnHandle, mtu: u16 },
    /// The peer read the MIDI I/O characteristic.
    Read { conn: ConnHandle },
    /// The peer wrote the MIDI I/O characteristic.
    Write { conn: ConnHandle, payload: &'a [u8] },
}

#[derive(Debug)]
struct Connection {
    handle: ConnHandle,
    mtu: u16,
    config: ClientConfig,
}

/// State of the MIDI service between host events.
#[derive(Debug)]
pub struct MidiSession {
    value_handle: AttHandle,
    conn: Option<Connection>,
}

impl MidiSession {
    /// Creates a session for a registered service whose MIDI I/O value attribute is
    /// `value_handle`.
    pub fn new(value_handle: AttHandle) -> Self {
        MidiSession {
            value_handle,
            conn: None,
        }
    }

    /// Returns whether a central is currently connected.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Returns whether the peer has subscribed to notifications.
    pub fn notifications_enabled(&self) -> bool {
        self.conn
            .as_ref()
            .map_or(false, |c| c.config.notifications())
    }

    /// Returns the MTU of the active connection.
    pub fn mtu(&self) -> Option<u16> {
        self.conn.as_ref().map(|c| c.mtu)
    }

    fn is_current(&self, conn: ConnHandle) -> bool {
        self.conn.as_ref().map_or(false, |c| c.handle == conn)
    }

    /// Feeds one host event into the session.
    ///
    /// Returns the MIDI events decoded from it. Only a characteristic write produces any;
    /// every other event updates session state and yields an empty iterator. A write that is
    /// not a BLE-MIDI packet fails with the decode error, leaving the session state untouched.
    pub fn handle_event<'a>(&mut self, event: HostEvent<'a>) -> Result<Events<'a>, Error> {
        match event {
            HostEvent::Connect { conn } => {
                if let Some(old) = &self.conn {
                    warn!("connection replaces {:?}", old.handle);
                }
                info!("connected: {:?}", conn);
                self.conn = Some(Connection {
                    handle: conn,
                    mtu: DEFAULT_ATT_MTU,
                    config: ClientConfig::default(),
                });
            }
            HostEvent::Disconnect { conn } => {
                if self.is_current(conn) {
                    info!("disconnected: {:?}", conn);
                    self.conn = None;
                } else {
                    warn!("disconnect for unknown connection {:?}", conn);
                }
            }
            HostEvent::Subscribe { conn, config } => match &mut self.conn {
                Some(c) if c.handle == conn => {
                    debug!("subscription change: {:?}", config);
                    c.config = config;
                }
                _ => warn!("subscribe for unknown connection {:?}", conn),
            },
            HostEvent::MtuChanged { conn, mtu } => match &mut self.conn {
                Some(c) if c.handle == conn => {
                    c.mtu = mtu.max(DEFAULT_ATT_MTU);
                    debug!("mtu now {}", c.mtu);
                }
                _ => warn!("mtu change for unknown connection {:?}", conn),
            },
            HostEvent::Read { conn } => {
                // the characteristic itself reads as empty, nothing to do
                trace!("characteristic read by {:?}", conn);
            }
            HostEvent::Write { conn, payload } => {
                if !self.is_current(conn) {
                    warn!("write for unknown connection {:?}", conn);
                    return Ok(Events::empty());
                }
                debug!("midi write: {:?}", HexSlice(payload));
                match Packet::parse(payload) {
                    Ok(packet) => return Ok(packet.events()),
                    Err(e) => {
                        error!("malformed midi write {:?}: {}", HexSlice(payload), e);
                        return Err(e);
                    }
                }
            }
        }
        Ok(Events::empty())
    }

    /// Encodes `event` as a notification of the MIDI I/O characteristic.
    ///
    /// Fails with [`NotifyError::NotConnected`] or [`NotifyError::NotSubscribed`] while there
    /// is no peer to deliver to; the caller should drop the event in that case. A single event
    /// always fits: the minimum MTU leaves room for 20 payload bytes and no event encodes to
    /// more than 5.
    pub fn notify(&self, event: &MidiEvent) -> Result<Notification, NotifyError> {
        self.notify_all(core::slice::from_ref(event))
    }

    /// Encodes a batch of events as one notification, packed with running-status compression.
    ///
    /// The payload is capped at the connection's MTU minus the 3-byte notification header, and
    /// at [`MAX_NOTIFY_PAYLOAD`]. A batch that does not fit the cap, or whose timestamps
    /// cannot share one packet, fails with [`NotifyError::Payload`]; the caller can split the
    /// batch over several notifications instead.
    pub fn notify_all(&self, events: &[MidiEvent]) -> Result<Notification, NotifyError> {
        let conn = self.conn.as_ref().ok_or(NotifyError::NotConnected)?;
        if !conn.config.notifications() {
            return Err(NotifyError::NotSubscribed);
        }

        let cap = usize::from(conn.mtu - 3).min(MAX_NOTIFY_PAYLOAD);
        let mut buf = [0; MAX_NOTIFY_PAYLOAD];
        let len = {
            let mut packet = PacketBuf::new(&mut buf[..cap]);
            for event in events {
                packet.push(event).map_err(NotifyError::Payload)?;
            }
            packet.len()
        };
        let payload =
            Vec::from_slice(&buf[..len]).map_err(|()| NotifyError::Payload(Error::Eof))?;
        trace!("notify {:?}: {:?}", conn.handle, HexSlice(&buf[..len]));
        Ok(Notification {
            conn: conn.handle,
            attr: self.value_handle,
            payload,
        })
    }
}

/// A ready-to-send notification, handed to the host stack for transmission.
pub struct Notification {
    /// Connection to deliver to.
    pub conn: ConnHandle,
    /// The MIDI I/O value attribute.
    pub attr: AttHandle,
    /// BLE-MIDI packet to use as the attribute value.
    pub payload: Vec<u8, MAX_NOTIFY_PAYLOAD>,
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notification")
            .field("conn", &self.conn)
            .field("attr", &self.attr)
            .field("payload", &HexSlice(&self.payload[..]))
            .finish()
    }
}

/// Reasons an outbound event cannot be turned into a notification.
#[derive(Debug, PartialEq, Eq)]
pub enum NotifyError {
    /// No central is connected.
    NotConnected,
    /// The peer has not enabled notifications on the characteristic.
    NotSubscribed,
    /// The event did not fit the notification payload.
    Payload(Error),
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::NotConnected => f.write_str("no active connection"),
            NotifyError::NotSubscribed => f.write_str("peer has not enabled notifications"),
            NotifyError::Payload(e) => write!(f, "payload error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::Channel;
    use crate::timestamp::Timestamp;

    fn session() -> MidiSession {
        MidiSession::new(AttHandle::from_raw(0x0010))
    }

    fn connected() -> (MidiSession, ConnHandle) {
        let mut s = session();
        let conn = ConnHandle::from_raw(1);
        s.handle_event(HostEvent::Connect { conn }).unwrap();
        (s, conn)
    }

    fn subscribed() -> (MidiSession, ConnHandle) {
        let (mut s, conn) = connected();
        s.handle_event(HostEvent::Subscribe {
            conn,
            config: ClientConfig::parse(&[0x01, 0x00]).unwrap(),
        })
        .unwrap();
        (s, conn)
    }

    fn note_on() -> MidiEvent {
        MidiEvent::note_on(Channel::new(0), 0x3C, 0x40, Timestamp::from_raw(1))
    }

    fn chord(size: u8) -> std::vec::Vec<MidiEvent> {
        (0..size)
            .map(|i| MidiEvent::note_on(Channel::new(0), 0x30 + i, 0x40, Timestamp::from_raw(1)))
            .collect()
    }

    #[test]
    fn notify_requires_connection_and_subscription() {
        let s = session();
        assert_eq!(s.notify(&note_on()).unwrap_err(), NotifyError::NotConnected);

        let (s, _) = connected();
        assert_eq!(
            s.notify(&note_on()).unwrap_err(),
            NotifyError::NotSubscribed
        );
    }

    #[test]
    fn notify_builds_a_packet_for_the_value_attribute() {
        let (s, conn) = subscribed();
        let notification = s.notify(&note_on()).unwrap();
        assert_eq!(notification.conn, conn);
        assert_eq!(notification.attr, AttHandle::from_raw(0x0010));
        assert_eq!(&notification.payload[..], &[0x80, 0x81, 0x90, 0x3C, 0x40]);
    }

    #[test]
    fn notify_payload_is_capped_by_the_mtu() {
        let (mut s, conn) = subscribed();

        // the default MTU of 23 leaves 20 payload bytes: 5 for the first event, 2 per
        // running-status continuation, so 8 events fit and 9 do not
        let notification = s.notify_all(&chord(8)).unwrap();
        assert_eq!(notification.payload.len(), 19);
        assert_eq!(
            s.notify_all(&chord(9)).unwrap_err(),
            NotifyError::Payload(Error::Eof)
        );

        s.handle_event(HostEvent::MtuChanged { conn, mtu: 100 }).unwrap();
        let notification = s.notify_all(&chord(9)).unwrap();
        assert_eq!(notification.payload.len(), 21);
    }

    #[test]
    fn any_single_event_fits_the_minimum_mtu() {
        let (mut s, conn) = subscribed();
        s.handle_event(HostEvent::MtuChanged { conn, mtu: 0 }).unwrap();
        let notification = s.notify(&note_on()).unwrap();
        assert_eq!(notification.payload.len(), 5);
    }

    #[test]
    fn batch_with_unpackable_timestamps_is_rejected() {
        let (s, _) = subscribed();
        let events = [
            MidiEvent::note_on(Channel::new(0), 60, 64, Timestamp::from_raw(500)),
            MidiEvent::note_on(Channel::new(0), 61, 64, Timestamp::from_raw(400)),
        ];
        assert_eq!(
            s.notify_all(&events).unwrap_err(),
            NotifyError::Payload(Error::InvalidValue)
        );
    }

    #[test]
    fn unsubscribing_stops_notifications() {
        let (mut s, conn) = subscribed();
        s.handle_event(HostEvent::Subscribe {
            conn,
            config: ClientConfig::default(),
        })
        .unwrap();
        assert_eq!(
            s.notify(&note_on()).unwrap_err(),
            NotifyError::NotSubscribed
        );
    }

    #[test]
    fn disconnect_resets_the_session() {
        let (mut s, conn) = subscribed();
        s.handle_event(HostEvent::Disconnect { conn }).unwrap();
        assert!(!s.is_connected());
        assert_eq!(s.notify(&note_on()).unwrap_err(), NotifyError::NotConnected);
    }

    #[test]
    fn events_for_other_connections_are_ignored() {
        let (mut s, _) = subscribed();
        let stale = ConnHandle::from_raw(7);

        s.handle_event(HostEvent::Disconnect { conn: stale }).unwrap();
        assert!(s.is_connected(), "stale disconnect must not reset");

        s.handle_event(HostEvent::Subscribe {
            conn: stale,
            config: ClientConfig::default(),
        })
        .unwrap();
        assert!(s.notifications_enabled(), "stale subscribe must not apply");

        let events = s
            .handle_event(HostEvent::Write {
                conn: stale,
                payload: &[0x80, 0x81, 0x90, 0x3C, 0x40],
            })
            .unwrap();
        assert_eq!(events.count(), 0);
    }

    #[test]
    fn new_connection_starts_clean() {
        let (mut s, old) = subscribed();
        let fresh = ConnHandle::from_raw(2);
        s.handle_event(HostEvent::Connect { conn: fresh }).unwrap();

        assert!(!s.notifications_enabled());
        // the old peer's disconnect races in afterwards and must not clear the new state
        s.handle_event(HostEvent::Disconnect { conn: old }).unwrap();
        assert!(s.is_connected());
    }

    #[test]
    fn writes_decode_to_midi_events() {
        let (mut s, conn) = connected();
        let events: std::vec::Vec<_> = s
            .handle_event(HostEvent::Write {
                conn,
                payload: &[0x80, 0x80, 0x90, 0x3C, 0x40, 0x3E, 0x41],
            })
            .unwrap()
            .collect();
        assert_eq!(
            events,
            [
                MidiEvent::note_on(Channel::new(0), 0x3C, 0x40, Timestamp::ZERO),
                MidiEvent::note_on(Channel::new(0), 0x3E, 0x41, Timestamp::ZERO),
            ]
        );
    }

    #[test]
    fn malformed_write_reports_and_keeps_state() {
        let (mut s, conn) = connected();
        let result = s.handle_event(HostEvent::Write {
            conn,
            payload: &[0x00, 0x90, 0x3C, 0x40],
        });
        assert_eq!(result.unwrap_err(), Error::MissingHeader);
        assert!(s.is_connected());

        let events = s
            .handle_event(HostEvent::Write {
                conn,
                payload: &[0x80, 0x81, 0x90, 0x3C, 0x40],
            })
            .unwrap();
        assert_eq!(events.count(), 1);
    }

    #[test]
    fn mtu_changes_are_floored() {
        let (mut s, conn) = connected();
        assert_eq!(s.mtu(), Some(DEFAULT_ATT_MTU));

        s.handle_event(HostEvent::MtuChanged { conn, mtu: 5 }).unwrap();
        assert_eq!(s.mtu(), Some(DEFAULT_ATT_MTU));

        s.handle_event(HostEvent::MtuChanged { conn, mtu: 185 }).unwrap();
        assert_eq!(s.mtu(), Some(185));
    }

    #[test]
    fn reads_yield_nothing() {
        let (mut s, conn) = connected();
        let events = s.handle_event(HostEvent::Read { conn }).unwrap();
        assert_eq!(events.count(), 0);
    }
}
