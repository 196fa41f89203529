//! Fuzz target: `NetConfig::from_json`
//!
//! Arbitrary JSON documents must either be rejected or produce a config
//! that passes its own validation.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use uplink::NetConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = NetConfig::from_json(text) {
        assert!(config.validate().is_ok());
        assert!(config.port != 0);
    }
});
