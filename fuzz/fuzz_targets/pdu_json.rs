//! Fuzz target for JSON PDU validation
//!
//! Arbitrary JSON must be accepted or rejected without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rftap_core::{EncapsulationConfig, Encoder};

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        for selector in 0..4 {
            let encoder = Encoder::new(EncapsulationConfig::from_selector(selector, 1, "fuzz"));
            let _ = encoder.encode_json(&value);
        }
    }
});
