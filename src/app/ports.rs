//! Port traits — the hexagonal boundary between the connectivity core and
//! the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ConnectionSupervisor / CommandServer
//! ```
//!
//! Driven adapters (radio driver, TCP listener, clock, event sinks)
//! implement these traits.  The core consumes them via generics, so it never
//! touches the radio or the network stack directly and runs unchanged
//! against the mock adapters in `tests/`.

use core::net::Ipv4Addr;

use crate::error::SocketError;

use super::events::LinkEvent;

// ───────────────────────────────────────────────────────────────
// Link port (driven adapter: radio driver ↔ supervisor)
// ───────────────────────────────────────────────────────────────

/// Hardware-level link status, re-read from the driver on every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No radio present.  Fatal; there is no recovery without a hardware
    /// change.
    NoHardware,
    Disconnected,
    Connected,
}

/// Radio/link driver.  Synchronous and polling; no call blocks.
pub trait LinkPort {
    /// Current link state.
    fn status(&self) -> LinkState;

    /// Start joining `ssid`.  Progress is observed through [`status`](Self::status).
    fn begin_association(&mut self, ssid: &str, passphrase: &str);

    /// Drop any current or half-open association.
    fn disconnect(&mut self);

    /// The leased address, or `None` while unassigned.
    fn local_address(&self) -> Option<Ipv4Addr>;
}

// ───────────────────────────────────────────────────────────────
// Listener / peer ports (driven adapter: network stack ↔ server)
// ───────────────────────────────────────────────────────────────

/// A listening socket that hands out at most one waiting peer per call.
pub trait ListenerPort {
    type Peer: PeerPort;

    /// Bind and start listening.  Called once.
    fn start_listening(&mut self, port: u16) -> Result<(), SocketError>;

    /// Next waiting peer, or `None` immediately if nobody is waiting.
    fn accept_waiting_peer(&mut self) -> Option<Self::Peer>;
}

/// One accepted peer connection.
pub trait PeerPort {
    /// Bound every subsequent read to `timeout_ms` from now.
    fn set_read_deadline(&mut self, timeout_ms: u32);

    /// Read bytes into `buf` until a `\n` (not stored), the deadline, EOF,
    /// or `buf` is full.  Returns the number of bytes stored.  A deadline
    /// expiring is not an error: whatever arrived so far is returned.
    ///
    /// When `buf` fills before the newline, the next call continues with
    /// the following bytes of the same line.
    fn read_line(&mut self, buf: &mut [u8]) -> Result<usize, SocketError>;

    /// Write all of `data`.
    fn write(&mut self, data: &[u8]) -> Result<(), SocketError>;

    /// Close the connection once the response is out.  Unread input is
    /// discarded without resetting the connection, so the peer still
    /// receives everything written.
    fn close(self);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock plus the delay used by the busy-wait loops.
pub trait ClockPort {
    /// Milliseconds since boot.  Never goes backwards.
    fn now_ms(&self) -> u64;

    /// Suspend the caller for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Park the system in a safe idle state forever.
    ///
    /// Reached only on an unrecoverable environment fault.
    fn halt(&mut self) -> ! {
        loop {
            self.delay_ms(1000);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: core → diagnostics)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`LinkEvent`]s through this port.  Adapters
/// decide where they go (serial log, test recorder, ...).
pub trait EventSink {
    fn emit(&mut self, event: &LinkEvent);
}

/// Sink that drops every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &LinkEvent) {}
}
