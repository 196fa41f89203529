//! Application layer — the connectivity core behind port traits.

pub mod events;
pub mod ports;
pub mod server;
pub mod service;
pub mod supervisor;
