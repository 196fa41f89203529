//! Network configuration.
//!
//! Credentials and timing for the connectivity supervisor.  Loaded once at
//! startup and immutable thereafter.  Three sources are supported:
//!
//! - build-time environment captured with `option_env!` ([`NetConfig::builtin`]),
//! - any key lookup, e.g. the process environment ([`NetConfig::from_lookup`]),
//! - a JSON document ([`NetConfig::from_json`]).
//!
//! Every source goes through the same validation.  Missing credentials are an
//! error, never silently defaulted.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const KEY_SSID: &str = "UPLINK_SSID";
pub const KEY_PASS: &str = "UPLINK_PASS";
pub const KEY_RETRY_MS: &str = "UPLINK_RETRY_MS";
pub const KEY_PORT: &str = "UPLINK_PORT";
pub const KEY_READ_TIMEOUT_MS: &str = "UPLINK_READ_TIMEOUT_MS";

/// Listening port used when none is configured.
pub const DEFAULT_PORT: u16 = 9000;
/// Peer read timeout used when none is configured (milliseconds).
pub const DEFAULT_READ_TIMEOUT_MS: u32 = 3000;

pub type Ssid = heapless::String<32>;
pub type Passphrase = heapless::String<64>;

/// Immutable connectivity configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetConfig {
    /// Network name (1-32 printable ASCII bytes).
    pub ssid: Ssid,
    /// WPA2 passphrase (8-64 bytes), or empty for an open network.
    pub passphrase: Passphrase,
    /// Delay between association attempts (milliseconds).  Zero is accepted
    /// and clamped by the supervisor.
    pub retry_interval_ms: u32,
    /// TCP port the command server listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long a connected peer may take to send its line (milliseconds).
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u32,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_read_timeout_ms() -> u32 {
    DEFAULT_READ_TIMEOUT_MS
}

impl NetConfig {
    /// Configuration baked into the binary at build time.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| builtin_value(key).map(str::to_owned))
    }

    /// Build from an arbitrary key lookup.
    ///
    /// Required keys: [`KEY_SSID`], [`KEY_PASS`], [`KEY_RETRY_MS`].
    /// Optional keys fall back to [`DEFAULT_PORT`] and
    /// [`DEFAULT_READ_TIMEOUT_MS`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let ssid = lookup(KEY_SSID).ok_or(ConfigError::Missing(KEY_SSID))?;
        let passphrase = lookup(KEY_PASS).ok_or(ConfigError::Missing(KEY_PASS))?;
        let retry = lookup(KEY_RETRY_MS).ok_or(ConfigError::Missing(KEY_RETRY_MS))?;

        let retry_interval_ms = parse_number(KEY_RETRY_MS, &retry)?;
        let port = match lookup(KEY_PORT) {
            Some(v) => parse_number(KEY_PORT, &v)?,
            None => DEFAULT_PORT,
        };
        let read_timeout_ms = match lookup(KEY_READ_TIMEOUT_MS) {
            Some(v) => parse_number(KEY_READ_TIMEOUT_MS, &v)?,
            None => DEFAULT_READ_TIMEOUT_MS,
        };

        let config = Self {
            ssid: Ssid::try_from(ssid.as_str()).map_err(|_| ConfigError::Invalid(KEY_SSID))?,
            passphrase: Passphrase::try_from(passphrase.as_str())
                .map_err(|_| ConfigError::Invalid(KEY_PASS))?,
            retry_interval_ms,
            port,
            read_timeout_ms,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    ///
    /// `port` and `read_timeout_ms` are optional; everything else is required.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            log::warn!("config: JSON rejected ({})", e);
            ConfigError::Invalid("json")
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ssid(&self.ssid)?;
        validate_passphrase(&self.passphrase)?;
        if self.port == 0 {
            return Err(ConfigError::Invalid(KEY_PORT));
        }
        Ok(())
    }
}

fn builtin_value(key: &str) -> Option<&'static str> {
    match key {
        KEY_SSID => option_env!("UPLINK_SSID"),
        KEY_PASS => option_env!("UPLINK_PASS"),
        KEY_RETRY_MS => option_env!("UPLINK_RETRY_MS"),
        KEY_PORT => option_env!("UPLINK_PORT"),
        KEY_READ_TIMEOUT_MS => option_env!("UPLINK_READ_TIMEOUT_MS"),
        _ => None,
    }
}

fn parse_number<T: core::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid(key))
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConfigError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConfigError::Invalid(KEY_SSID));
    }
    Ok(())
}

fn validate_passphrase(passphrase: &str) -> Result<(), ConfigError> {
    if passphrase.is_empty() {
        return Ok(());
    }
    if passphrase.len() < 8 || passphrase.len() > 64 {
        return Err(ConfigError::Invalid(KEY_PASS));
    }
    Ok(())
}
