//! Fuzz test for encapsulation configuration parsing
//!
//! Tests that arbitrary TOML input doesn't cause panics or crashes when
//! parsed as an encapsulation configuration.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rftap_core::EncapsulationConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(config) = toml::from_str::<EncapsulationConfig>(s) {
            let _ = config.validate();
        }
    }
});
