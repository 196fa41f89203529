//! Fuzz target: `parse_command`
//!
//! Feeds arbitrary request lines, including invalid UTF-8 and multi-byte
//! characters straddling the length limit, and checks that a surfaced
//! command is never empty, never padded, and never over-long.
//!
//! cargo fuzz run fuzz_line_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use uplink::app::server::{MAX_COMMAND_LEN, parse_command};

fuzz_target!(|data: &[u8]| {
    if let Some(cmd) = parse_command(data) {
        assert!(!cmd.is_empty(), "empty command surfaced");
        assert!(cmd.len() <= MAX_COMMAND_LEN, "command exceeds limit");
        assert_eq!(cmd.trim(), cmd.as_str(), "command not trimmed");
    }
});
