//! Diagnostic events emitted by the connectivity core via
//! [`EventSink`](super::ports::EventSink).

use core::net::Ipv4Addr;

use crate::config::Ssid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// An association request is about to be issued.
    Associating { ssid: Ssid },
    /// Link is up and an address was leased.
    Associated { address: Ipv4Addr },
    /// The wait window elapsed without link.
    LinkTimeout,
    /// Link came up but no address was leased in time.
    NoAddress,
    /// A poll found the link down.
    LinkDown,
    /// Next repair attempt is not allowed before `at_ms`.
    RetryScheduled { at_ms: u64 },
    /// The command listener is accepting peers.
    ListenerStarted { port: u16 },
    /// The command listener could not be started.
    ListenerFailed { port: u16 },
    /// A peer sent a non-empty command of `len` bytes.
    CommandReceived { len: usize },
    /// A peer sent nothing usable before its read deadline.
    EmptyRequest,
    /// The radio is missing; the system is about to halt.
    HardwareMissing,
}
