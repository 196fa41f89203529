//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements             | Connects to              |
//! |------------|------------------------|--------------------------|
//! | `log_sink` | EventSink              | Serial log output        |
//! | `tcp`      | ListenerPort, PeerPort | lwIP / host TCP sockets  |
//! | `time`     | ClockPort              | ESP32 system timer       |
//! | `wifi`     | LinkPort               | ESP-IDF WiFi STA         |

pub mod log_sink;
pub mod tcp;
pub mod time;
pub mod wifi;
