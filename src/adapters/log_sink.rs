//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing connectivity events to the logger
//! (UART / USB-CDC on ESP-IDF, stderr on the host).

use log::{error, info, warn};

use crate::app::events::LinkEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`LinkEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &LinkEvent) {
        match event {
            LinkEvent::Associating { ssid } => info!("LINK | associating ssid='{}'", ssid),
            LinkEvent::Associated { address } => info!("LINK | up address={}", address),
            LinkEvent::LinkTimeout => warn!("LINK | timeout waiting for link"),
            LinkEvent::NoAddress => warn!("LINK | up without address"),
            LinkEvent::LinkDown => warn!("LINK | down"),
            LinkEvent::RetryScheduled { at_ms } => info!("LINK | next retry at {} ms", at_ms),
            LinkEvent::ListenerStarted { port } => info!("SERVER | listening port={}", port),
            LinkEvent::ListenerFailed { port } => error!("SERVER | listen failed port={}", port),
            LinkEvent::CommandReceived { len } => info!("SERVER | command len={}", len),
            LinkEvent::EmptyRequest => info!("SERVER | empty request"),
            LinkEvent::HardwareMissing => error!("LINK | no radio hardware, halted"),
        }
    }
}
