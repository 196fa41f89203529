//! Error types for the uplink firmware.
//!
//! One small enum per failure domain: configuration, association and the
//! command socket.  All variants are `Copy` so they can be passed around the
//! polling loop without allocation.  The binary wraps them in `anyhow` at
//! its boundary.

use core::fmt;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key was not supplied.  Carries the key name.
    Missing(&'static str),
    /// A key was supplied but failed validation.  Carries the key name.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "{key} not defined in configuration"),
            Self::Invalid(key) => write!(f, "{key} has an invalid value"),
        }
    }
}

impl core::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Association errors
// ---------------------------------------------------------------------------

/// Why a bounded association attempt did not produce a usable address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationError {
    /// The wait window elapsed before the link came up.
    LinkTimeout,
    /// The link came up but no address was leased within the ceiling.
    NoAddress,
}

impl fmt::Display for AssociationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkTimeout => write!(f, "link did not come up in time"),
            Self::NoAddress => write!(f, "connected to AP but no address leased"),
        }
    }
}

impl core::error::Error for AssociationError {}

// ---------------------------------------------------------------------------
// Socket errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketError {
    /// The listener could not be bound to its port.
    Bind,
    /// A read or write on the peer connection failed.
    Io,
    /// The peer closed the connection.
    Closed,
}

impl fmt::Display for SocketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind => write!(f, "could not bind listener"),
            Self::Io => write!(f, "peer I/O error"),
            Self::Closed => write!(f, "peer closed connection"),
        }
    }
}

impl core::error::Error for SocketError {}
