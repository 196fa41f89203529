//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`] — the hexagonal boundary for the radio driver.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation that comes up a fixed time after each
//!   association request and leases `127.0.0.1`.

use core::net::Ipv4Addr;

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{LinkPort, LinkState};

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

/// Simulated time from association request to link-up.
#[cfg(not(target_os = "espidf"))]
const SIM_LINK_LATENCY_MS: u64 = 300;
/// Simulated time from link-up to address lease.
#[cfg(not(target_os = "espidf"))]
const SIM_LEASE_LATENCY_MS: u64 = 200;

pub struct WifiAdapter {
    #[cfg(target_os = "espidf")]
    wifi: Option<EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    associating_since: Option<std::time::Instant>,
}

impl WifiAdapter {
    /// Wrap an initialised driver.  `None` means the radio could not be
    /// brought up, which reports [`LinkState::NoHardware`].
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: Option<EspWifi<'static>>) -> Self {
        Self { wifi }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self { associating_since: None }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_status(&self) -> LinkState {
        match &self.wifi {
            None => LinkState::NoHardware,
            Some(wifi) if wifi.is_connected().unwrap_or(false) => LinkState::Connected,
            Some(_) => LinkState::Disconnected,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_status(&self) -> LinkState {
        match self.associating_since {
            Some(t) if t.elapsed().as_millis() as u64 >= SIM_LINK_LATENCY_MS => LinkState::Connected,
            _ => LinkState::Disconnected,
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_begin(&mut self, ssid: &str, passphrase: &str) {
        let Some(wifi) = self.wifi.as_mut() else {
            return;
        };
        let auth_method = if passphrase.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let client = ClientConfiguration {
            ssid: ssid.try_into().unwrap_or_default(),
            password: passphrase.try_into().unwrap_or_default(),
            auth_method,
            ..Default::default()
        };
        if let Err(e) = wifi.set_configuration(&Configuration::Client(client)) {
            warn!("WiFi(espidf): set_configuration failed ({})", e);
            return;
        }
        if !wifi.is_started().unwrap_or(false) {
            if let Err(e) = wifi.start() {
                warn!("WiFi(espidf): start failed ({})", e);
                return;
            }
        }
        if let Err(e) = wifi.connect() {
            warn!("WiFi(espidf): connect request failed ({})", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_begin(&mut self, ssid: &str, _passphrase: &str) {
        info!("WiFi(sim): associating with '{}'", ssid);
        self.associating_since = Some(std::time::Instant::now());
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Some(wifi) = self.wifi.as_mut() {
            if wifi.is_started().unwrap_or(false) {
                let _ = wifi.disconnect();
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.associating_since = None;
    }

    #[cfg(target_os = "espidf")]
    fn platform_address(&self) -> Option<Ipv4Addr> {
        let wifi = self.wifi.as_ref()?;
        wifi.sta_netif().get_ip_info().ok().map(|info| info.ip)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_address(&self) -> Option<Ipv4Addr> {
        let since = self.associating_since?;
        let leased_after = SIM_LINK_LATENCY_MS + SIM_LEASE_LATENCY_MS;
        (since.elapsed().as_millis() as u64 >= leased_after).then_some(Ipv4Addr::LOCALHOST)
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort
// ───────────────────────────────────────────────────────────────

impl LinkPort for WifiAdapter {
    fn status(&self) -> LinkState {
        self.platform_status()
    }

    fn begin_association(&mut self, ssid: &str, passphrase: &str) {
        self.platform_begin(ssid, passphrase);
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        info!("WiFi: disconnected");
    }

    fn local_address(&self) -> Option<Ipv4Addr> {
        self.platform_address().filter(|a| !a.is_unspecified())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
