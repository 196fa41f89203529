//! Single-line command server.
//!
//! Wire protocol, one exchange per connection:
//!
//! ```text
//!   peer → server   "<command>\n"            (surrounding whitespace ignored)
//!   server → peer   "Received: <command>"    non-empty command
//!                   "EMPTY"                  empty line, whitespace or timeout
//!   server closes the connection
//! ```
//!
//! At most one waiting peer is serviced per [`poll_once`](CommandServer::poll_once);
//! later peers stay queued in the listener's backlog until the next cycle.

use log::{info, warn};

use crate::error::SocketError;

use super::events::LinkEvent;
use super::ports::{EventSink, ListenerPort, PeerPort};

/// Longest command surfaced to the application, in bytes.
pub const MAX_COMMAND_LEN: usize = 128;
/// Bytes read from a peer before the rest of its line is discarded.
pub const MAX_LINE_LEN: usize = 256;

pub const ACK_PREFIX: &str = "Received: ";
pub const EMPTY_RESPONSE: &str = "EMPTY";

/// A trimmed, non-empty command line.
pub type Command = heapless::String<MAX_COMMAND_LEN>;

const RESPONSE_CAPACITY: usize = ACK_PREFIX.len() + MAX_COMMAND_LEN;

type Response = heapless::String<RESPONSE_CAPACITY>;

pub struct CommandServer<S> {
    listener: S,
}

impl<S: ListenerPort> CommandServer<S> {
    pub fn new(listener: S) -> Self {
        Self { listener }
    }

    pub fn listener(&self) -> &S {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut S {
        &mut self.listener
    }

    /// Start listening on `port`.
    pub fn start(&mut self, port: u16) -> Result<(), SocketError> {
        self.listener.start_listening(port)
    }

    /// Service at most one waiting peer.
    ///
    /// Returns immediately with `None` when nobody is waiting.  Otherwise
    /// blocks for at most `timeout_ms` reading the peer's line, answers,
    /// and closes the peer before returning.
    pub fn poll_once<E: EventSink>(&mut self, timeout_ms: u32, sink: &mut E) -> Option<Command> {
        let mut peer = self.listener.accept_waiting_peer()?;
        peer.set_read_deadline(timeout_ms);

        let mut buf = [0u8; MAX_LINE_LEN];
        let line = read_request(&mut peer, &mut buf);
        let command = parse_command(line);

        let written = match &command {
            Some(cmd) => {
                info!("Server: received '{}'", cmd);
                sink.emit(&LinkEvent::CommandReceived { len: cmd.len() });
                peer.write(acknowledgement(cmd).as_bytes())
            }
            None => {
                info!("Server: message empty or timed out");
                sink.emit(&LinkEvent::EmptyRequest);
                peer.write(EMPTY_RESPONSE.as_bytes())
            }
        };
        if let Err(e) = written {
            warn!("Server: response not delivered ({})", e);
        }

        peer.close();
        command
    }
}

/// Read the first line from `peer` into `buf`.
///
/// A full buffer of leading whitespace is discarded and reading resumes, so
/// padding longer than the buffer does not hide the command behind it.  When
/// the line is cut at the buffer size, a multi-byte character split by the
/// cut is dropped rather than invalidating the whole line.
fn read_request<'b, P: PeerPort>(peer: &mut P, buf: &'b mut [u8]) -> &'b [u8] {
    let len = loop {
        let len = match peer.read_line(buf) {
            Ok(n) => n,
            Err(e) => {
                warn!("Server: read failed ({})", e);
                0
            }
        };
        if len < buf.len() || !buf.iter().all(u8::is_ascii_whitespace) {
            break len;
        }
    };
    let line = &buf[..len];
    if len < buf.len() {
        return line;
    }
    match core::str::from_utf8(line) {
        // Incomplete trailing sequence, not an invalid one.
        Err(e) if e.error_len().is_none() => &line[..e.valid_up_to()],
        _ => line,
    }
}

/// Trim a raw request line into a command.  Empty, whitespace-only and
/// non-UTF-8 lines yield `None`.
pub fn parse_command(raw: &[u8]) -> Option<Command> {
    let text = match core::str::from_utf8(raw) {
        Ok(text) => text,
        Err(_) => {
            warn!("Server: request is not valid UTF-8");
            return None;
        }
    };
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let mut end = text.len().min(MAX_COMMAND_LEN);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    if end < text.len() {
        warn!("Server: command truncated to {} bytes", end);
    }
    Command::try_from(&text[..end]).ok()
}

fn acknowledgement(command: &str) -> Response {
    let mut response = Response::new();
    // Capacity covers the prefix plus the longest command.
    let _ = response.push_str(ACK_PREFIX);
    let _ = response.push_str(command);
    response
}
