//! TCP listener adapter.
//!
//! Implements [`ListenerPort`] and [`PeerPort`] on `std::net`, which the
//! ESP-IDF target provides through lwIP and the host provides natively, so
//! the same code serves both.
//!
//! ## Connection model
//!
//! 1. `start_listening()` binds `0.0.0.0:<port>` in non-blocking mode.
//! 2. `accept_waiting_peer()` returns at once when the backlog is empty.
//! 3. The accepted stream is switched back to blocking reads bounded by
//!    the peer's deadline.
//! 4. `close()` shuts the write half down so the peer sees EOF right
//!    after the response, then drains unread input until the peer's EOF
//!    so the final drop does not reset the connection.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::app::ports::{ListenerPort, PeerPort};
use crate::error::SocketError;

/// Idle gap after which `close` stops waiting for more input to discard.
const DRAIN_QUIET_MS: u64 = 100;

pub struct TcpListenerAdapter {
    listener: Option<TcpListener>,
}

impl TcpListenerAdapter {
    pub fn new() -> Self {
        Self { listener: None }
    }

    /// The bound address, once listening.  Useful when port `0` was
    /// requested.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref()?.local_addr().ok()
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }
}

impl Default for TcpListenerAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerPort for TcpListenerAdapter {
    type Peer = TcpPeer;

    fn start_listening(&mut self, port: u16) -> Result<(), SocketError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).map_err(|e| {
            warn!("TCP: bind {} failed: {}", addr, e);
            SocketError::Bind
        })?;
        listener.set_nonblocking(true).map_err(|_| SocketError::Bind)?;
        info!("TCP: listening on {}", addr);
        self.listener = Some(listener);
        Ok(())
    }

    fn accept_waiting_peer(&mut self) -> Option<TcpPeer> {
        let listener = self.listener.as_ref()?;
        match listener.accept() {
            Ok((stream, addr)) => {
                // Some platforms hand out accepted sockets in the listener's
                // non-blocking mode.
                if let Err(e) = stream.set_nonblocking(false) {
                    warn!("TCP: could not configure peer {}: {}", addr, e);
                    return None;
                }
                info!("TCP: peer connected from {}", addr);
                Some(TcpPeer::new(stream))
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("TCP: accept error: {}", e);
                None
            }
        }
    }
}

/// One accepted TCP connection.
pub struct TcpPeer {
    stream: TcpStream,
    deadline: Option<Instant>,
}

impl TcpPeer {
    fn new(stream: TcpStream) -> Self {
        Self { stream, deadline: None }
    }

    /// Read and discard input until the peer's EOF or until it stays quiet
    /// for [`DRAIN_QUIET_MS`], never past the read deadline (or the quiet
    /// period, if that is later).  Dropping a socket with unread input makes
    /// the stack answer with RST, which can destroy the response in flight.
    fn drain(&mut self) -> usize {
        let quiet = Duration::from_millis(DRAIN_QUIET_MS);
        let floor = Instant::now() + quiet;
        let until = self.deadline.map_or(floor, |d| d.max(floor));
        let mut scratch = [0u8; 128];
        let mut discarded = 0;
        loop {
            let remaining = until.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            if self.stream.set_read_timeout(Some(remaining.min(quiet))).is_err() {
                break;
            }
            match self.stream.read(&mut scratch) {
                Ok(0) => break,
                Ok(n) => discarded += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(_) => break,
            }
        }
        discarded
    }
}

impl PeerPort for TcpPeer {
    fn set_read_deadline(&mut self, timeout_ms: u32) {
        self.deadline = Some(Instant::now() + Duration::from_millis(u64::from(timeout_ms)));
    }

    fn read_line(&mut self, buf: &mut [u8]) -> Result<usize, SocketError> {
        let mut filled = 0;
        while filled < buf.len() {
            let timeout = match self.deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        break;
                    }
                    Some(remaining)
                }
                None => None,
            };
            self.stream
                .set_read_timeout(timeout)
                .map_err(|_| SocketError::Io)?;

            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => {
                    if let Some(pos) = buf[filled..filled + n].iter().position(|&b| b == b'\n') {
                        return Ok(filled + pos);
                    }
                    filled += n;
                }
                Err(ref e)
                    if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
                {
                    break;
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("TCP: read error: {}", e);
                    return Err(SocketError::Io);
                }
            }
        }
        Ok(filled)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), SocketError> {
        self.stream.write_all(data).map_err(|e| {
            if e.kind() == io::ErrorKind::BrokenPipe {
                SocketError::Closed
            } else {
                SocketError::Io
            }
        })?;
        self.stream.flush().map_err(|_| SocketError::Io)
    }

    fn close(mut self) {
        let _ = self.stream.shutdown(Shutdown::Write);
        let discarded = self.drain();
        if discarded > 0 {
            info!("TCP: discarded {} unread bytes", discarded);
        }
        info!("TCP: peer closed");
    }
}
