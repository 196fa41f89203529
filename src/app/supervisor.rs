//! Connection supervisor — association, link-loss repair, listener latch.
//!
//! Two retry regimes share one bounded association routine:
//!
//! - [`begin`](ConnectionSupervisor::begin) blocks at startup, retrying
//!   without limit until the first association succeeds.
//! - [`check_and_repair`](ConnectionSupervisor::check_and_repair) runs every
//!   poll cycle and makes at most one bounded attempt per retry interval, so
//!   a dead access point never stalls the rest of the application.
//!
//! All waits are busy-waits on the injected [`ClockPort`].

use core::net::Ipv4Addr;

use log::{error, info, warn};

use crate::config::{NetConfig, Passphrase, Ssid};
use crate::error::AssociationError;

use super::events::LinkEvent;
use super::ports::{ClockPort, EventSink, LinkPort, LinkState, ListenerPort};
use super::server::CommandServer;

/// Floor applied when the configured retry interval is zero.
pub const MIN_RETRY_INTERVAL_MS: u32 = 2000;
/// Link wait window for each attempt inside [`ConnectionSupervisor::begin`].
pub const INITIAL_WINDOW_MS: u32 = 15_000;
/// Link wait window for the steady-state repair attempt.
pub const REPAIR_WINDOW_MS: u32 = 5000;
/// Link state polling cadence while associating.
pub const LINK_POLL_INTERVAL_MS: u32 = 250;
/// Ceiling on waiting for an address lease once the link is up.
pub const ADDRESS_WAIT_CEILING_MS: u32 = 4000;
/// Address polling cadence while waiting for a lease.
pub const ADDRESS_POLL_INTERVAL_MS: u32 = 200;

/// Owns the link driver and every piece of mutable association state.
pub struct ConnectionSupervisor<L> {
    link: L,
    ssid: Ssid,
    passphrase: Passphrase,
    port: u16,
    retry_interval_ms: u32,
    next_retry_at: u64,
    last_known_address: Option<Ipv4Addr>,
    server_started: bool,
}

impl<L: LinkPort> ConnectionSupervisor<L> {
    pub fn new(config: &NetConfig, link: L) -> Self {
        let retry_interval_ms = if config.retry_interval_ms == 0 {
            MIN_RETRY_INTERVAL_MS
        } else {
            config.retry_interval_ms
        };
        Self {
            link,
            ssid: config.ssid.clone(),
            passphrase: config.passphrase.clone(),
            port: config.port,
            retry_interval_ms,
            next_retry_at: 0,
            last_known_address: None,
            server_started: false,
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Retry interval after the zero-floor clamp.
    pub fn retry_interval_ms(&self) -> u32 {
        self.retry_interval_ms
    }

    pub fn next_retry_at(&self) -> u64 {
        self.next_retry_at
    }

    /// Address from the most recent successful association.  Stale but
    /// last-good: failures never clear it.
    pub fn last_known_address(&self) -> Option<Ipv4Addr> {
        self.last_known_address
    }

    /// Address the driver reports right now.
    pub fn current_address(&self) -> Option<Ipv4Addr> {
        self.link.local_address().filter(|a| !a.is_unspecified())
    }

    pub fn link_state(&self) -> LinkState {
        self.link.status()
    }

    pub fn is_linked(&self) -> bool {
        self.link.status() == LinkState::Connected
    }

    pub fn server_started(&self) -> bool {
        self.server_started
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    // ── Association ───────────────────────────────────────────

    /// One bounded association attempt.  `true` only when the link is up
    /// and an address was leased.
    ///
    /// Halts the system (never returns) if the radio is missing.
    pub fn attempt_association<C, E>(&mut self, window_ms: u32, clock: &mut C, sink: &mut E) -> bool
    where
        C: ClockPort,
        E: EventSink,
    {
        self.try_association(window_ms, clock, sink).is_ok()
    }

    /// Like [`attempt_association`](Self::attempt_association) but reports
    /// which failure mode occurred.
    pub fn try_association<C, E>(
        &mut self,
        window_ms: u32,
        clock: &mut C,
        sink: &mut E,
    ) -> Result<Ipv4Addr, AssociationError>
    where
        C: ClockPort,
        E: EventSink,
    {
        let status = self.link.status();
        if status == LinkState::NoHardware {
            halt_without_hardware(clock, sink);
        }

        let start = clock.now_ms();
        if status != LinkState::Connected {
            self.link.disconnect();
        }
        sink.emit(&LinkEvent::Associating { ssid: self.ssid.clone() });
        self.link.begin_association(&self.ssid, &self.passphrase);

        if !wait_until(clock, start, window_ms, LINK_POLL_INTERVAL_MS, || {
            self.link.status() == LinkState::Connected
        }) {
            warn!("WiFi: no link to '{}' within {} ms", self.ssid, window_ms);
            sink.emit(&LinkEvent::LinkTimeout);
            return Err(AssociationError::LinkTimeout);
        }

        // Link-up does not imply a completed lease.
        let lease_start = clock.now_ms();
        let mut address = self.current_address();
        if address.is_none() {
            wait_until(clock, lease_start, ADDRESS_WAIT_CEILING_MS, ADDRESS_POLL_INTERVAL_MS, || {
                address = self.link.local_address().filter(|a| !a.is_unspecified());
                address.is_some()
            });
        }

        match address {
            Some(address) => {
                self.last_known_address = Some(address);
                info!("WiFi: connected, address {}", address);
                sink.emit(&LinkEvent::Associated { address });
                Ok(address)
            }
            None => {
                warn!("WiFi: connected to AP but no address yet");
                sink.emit(&LinkEvent::NoAddress);
                Err(AssociationError::NoAddress)
            }
        }
    }

    /// Blocking startup: associate (retrying forever), then start the
    /// listener once.  Returns whether the listener is running.
    pub fn begin<S, C, E>(&mut self, server: &mut CommandServer<S>, clock: &mut C, sink: &mut E) -> bool
    where
        S: ListenerPort,
        C: ClockPort,
        E: EventSink,
    {
        info!("WiFi: connecting to '{}'", self.ssid);
        while !self.attempt_association(INITIAL_WINDOW_MS, clock, sink) {
            info!("WiFi: retrying in {} ms", self.retry_interval_ms);
            clock.delay_ms(self.retry_interval_ms);
        }

        if !self.server_started {
            match server.start(self.port) {
                Ok(()) => {
                    self.server_started = true;
                    sink.emit(&LinkEvent::ListenerStarted { port: self.port });
                }
                Err(e) => {
                    error!("Server: could not listen on port {} ({})", self.port, e);
                    sink.emit(&LinkEvent::ListenerFailed { port: self.port });
                    return false;
                }
            }
        }
        info!("Server: listening on port {}", self.port);
        true
    }

    /// Non-blocking repair, called every poll cycle with the current time.
    ///
    /// While the link is down, at most one bounded attempt is made per
    /// retry interval, whatever its outcome.
    pub fn check_and_repair<C, E>(&mut self, now: u64, clock: &mut C, sink: &mut E)
    where
        C: ClockPort,
        E: EventSink,
    {
        if self.link.status() == LinkState::Connected || now < self.next_retry_at {
            return;
        }

        warn!("WiFi: link down, retrying");
        sink.emit(&LinkEvent::LinkDown);
        // Failure is absorbed; the next interval retries.
        let _ = self.attempt_association(REPAIR_WINDOW_MS, clock, sink);

        self.next_retry_at = now + u64::from(self.retry_interval_ms);
        sink.emit(&LinkEvent::RetryScheduled { at_ms: self.next_retry_at });
    }
}

/// Poll `done` every `cadence_ms` until it holds or `window_ms` has elapsed
/// since `start`.  Delays are trimmed to the remaining window so the final
/// check never lands past it.
fn wait_until<C, F>(clock: &mut C, start: u64, window_ms: u32, cadence_ms: u32, mut done: F) -> bool
where
    C: ClockPort,
    F: FnMut() -> bool,
{
    let window = u64::from(window_ms);
    loop {
        if done() {
            return true;
        }
        let elapsed = clock.now_ms().saturating_sub(start);
        if elapsed >= window {
            return false;
        }
        let remaining = (window - elapsed).min(u64::from(cadence_ms));
        clock.delay_ms(remaining as u32);
    }
}

fn halt_without_hardware<C, E>(clock: &mut C, sink: &mut E) -> !
where
    C: ClockPort,
    E: EventSink,
{
    error!("WiFi: radio module not found, halting");
    sink.emit(&LinkEvent::HardwareMissing);
    clock.halt()
}
