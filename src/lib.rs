//! Uplink firmware library.
//!
//! WiFi connectivity supervisor plus a one-command-per-connection TCP
//! server.  Exposes the pure-logic core for integration testing; all
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each adapter.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;

pub use app::ports::{ClockPort, EventSink, LinkPort, LinkState, ListenerPort, PeerPort};
pub use app::server::{Command, CommandServer};
pub use app::service::Uplink;
pub use app::supervisor::ConnectionSupervisor;
pub use config::NetConfig;
