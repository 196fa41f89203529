//! Uplink firmware — main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                    │
//! │                                                            │
//! │  WifiAdapter    TcpListenerAdapter   SystemClock           │
//! │  (LinkPort)     (ListenerPort)       (ClockPort)           │
//! │  LogEventSink                                              │
//! │  (EventSink)                                               │
//! │                                                            │
//! │  ──────────────── Port Trait Boundary ─────────────────    │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │           Uplink (pure logic, polled)                │  │
//! │  │  ConnectionSupervisor · CommandServer                │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{Context, Result};
use log::info;

use uplink::adapters::log_sink::LogEventSink;
use uplink::adapters::tcp::TcpListenerAdapter;
use uplink::adapters::time::SystemClock;
use uplink::adapters::wifi::WifiAdapter;
use uplink::{NetConfig, Uplink};

/// Pause between poll cycles.
const POLL_INTERVAL_MS: u64 = 10;

fn main() -> Result<()> {
    // ── 1. Platform bootstrap ─────────────────────────────────
    init_logging()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Uplink v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration (fails startup on missing credentials) ─
    let config = load_config()?;
    info!(
        "Config: ssid='{}' port={} retry={}ms read_timeout={}ms",
        config.ssid, config.port, config.retry_interval_ms, config.read_timeout_ms
    );

    // ── 3. Adapters + service ─────────────────────────────────
    let wifi = build_wifi()?;
    let mut uplink = Uplink::new(
        &config,
        wifi,
        TcpListenerAdapter::new(),
        SystemClock::new(),
        LogEventSink::new(),
    );

    // ── 4. Blocking startup ───────────────────────────────────
    if !uplink.begin() {
        anyhow::bail!("command listener could not be started on port {}", config.port);
    }
    if let Some(address) = uplink.last_known_address() {
        info!("Reachable at {}:{}", address, config.port);
    }

    // ── 5. Poll loop ──────────────────────────────────────────
    loop {
        if let Some(command) = uplink.poll() {
            info!("Command: '{}'", command);
        }
        std::thread::sleep(std::time::Duration::from_millis(POLL_INTERVAL_MS));
    }
}

#[cfg(target_os = "espidf")]
fn init_logging() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("logger init failed: {e}"))
}

#[cfg(target_os = "espidf")]
fn load_config() -> Result<NetConfig> {
    NetConfig::builtin().context("build-time network configuration")
}

/// Host runs read `UPLINK_CONFIG` (a JSON file) if set, then the process
/// environment, then the values baked in at build time.
#[cfg(not(target_os = "espidf"))]
fn load_config() -> Result<NetConfig> {
    if let Ok(path) = std::env::var("UPLINK_CONFIG") {
        let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
        return NetConfig::from_json(&json).with_context(|| format!("parsing {path}"));
    }
    if std::env::var_os(uplink::config::KEY_SSID).is_some() {
        return NetConfig::from_lookup(|key| std::env::var(key).ok())
            .context("network configuration from environment");
    }
    NetConfig::builtin().context("build-time network configuration")
}

#[cfg(target_os = "espidf")]
fn build_wifi() -> Result<WifiAdapter> {
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::EspWifi;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // A driver that fails to come up is reported as missing hardware and
    // halts inside the supervisor.
    let wifi = match EspWifi::new(peripherals.modem, sysloop, Some(nvs)) {
        Ok(wifi) => Some(wifi),
        Err(e) => {
            log::error!("WiFi driver init failed: {}", e);
            None
        }
    };
    Ok(WifiAdapter::new(wifi))
}

#[cfg(not(target_os = "espidf"))]
fn build_wifi() -> Result<WifiAdapter> {
    Ok(WifiAdapter::new())
}
