//! Uplink service — the hexagonal core handed to the driving loop.
//!
//! [`Uplink`] owns one [`ConnectionSupervisor`], one [`CommandServer`], the
//! clock and the event sink.  It is constructed once at startup and lives
//! for the whole process; there is no global instance.
//!
//! ```text
//!   LinkPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                │            Uplink            │
//! ListenerPort ◀─│  Supervisor · CommandServer  │◀── ClockPort
//!                └──────────────────────────────┘
//! ```
//!
//! Driving loop contract: call [`begin`](Uplink::begin) once, then
//! [`poll`](Uplink::poll) forever.  Never call `poll` re-entrantly.

use core::net::Ipv4Addr;

use crate::config::NetConfig;

use super::ports::{ClockPort, EventSink, LinkPort, LinkState, ListenerPort};
use super::server::{Command, CommandServer};
use super::supervisor::ConnectionSupervisor;

pub struct Uplink<L, S, C, E> {
    supervisor: ConnectionSupervisor<L>,
    server: CommandServer<S>,
    clock: C,
    sink: E,
    read_timeout_ms: u32,
}

impl<L, S, C, E> Uplink<L, S, C, E>
where
    L: LinkPort,
    S: ListenerPort,
    C: ClockPort,
    E: EventSink,
{
    pub fn new(config: &NetConfig, link: L, listener: S, clock: C, sink: E) -> Self {
        Self {
            supervisor: ConnectionSupervisor::new(config, link),
            server: CommandServer::new(listener),
            clock,
            sink,
            read_timeout_ms: config.read_timeout_ms,
        }
    }

    /// Block until the first association succeeds, then start listening.
    pub fn begin(&mut self) -> bool {
        self.supervisor
            .begin(&mut self.server, &mut self.clock, &mut self.sink)
    }

    /// One poll cycle with the configured read timeout.
    pub fn poll(&mut self) -> Option<Command> {
        self.poll_with_timeout(self.read_timeout_ms)
    }

    /// One poll cycle: repair the link if needed, then service at most one
    /// peer if the link is up.
    pub fn poll_with_timeout(&mut self, read_timeout_ms: u32) -> Option<Command> {
        let now = self.clock.now_ms();
        self.supervisor
            .check_and_repair(now, &mut self.clock, &mut self.sink);

        if self.supervisor.link_state() != LinkState::Connected {
            return None;
        }
        self.server.poll_once(read_timeout_ms, &mut self.sink)
    }

    pub fn last_known_address(&self) -> Option<Ipv4Addr> {
        self.supervisor.last_known_address()
    }

    pub fn read_timeout_ms(&self) -> u32 {
        self.read_timeout_ms
    }

    pub fn supervisor(&self) -> &ConnectionSupervisor<L> {
        &self.supervisor
    }

    pub fn supervisor_mut(&mut self) -> &mut ConnectionSupervisor<L> {
        &mut self.supervisor
    }

    pub fn server(&self) -> &CommandServer<S> {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut CommandServer<S> {
        &mut self.server
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }
}
