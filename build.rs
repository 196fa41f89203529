fn main() {
    // Credentials are captured with `option_env!` in src/config.rs; rebuild
    // whenever any of them change so a stale binary never carries old ones.
    for key in [
        "UPLINK_SSID",
        "UPLINK_PASS",
        "UPLINK_RETRY_MS",
        "UPLINK_PORT",
        "UPLINK_READ_TIMEOUT_MS",
    ] {
        println!("cargo:rerun-if-env-changed={key}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
