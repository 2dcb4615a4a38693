//! Fuzz target for the header encoder
//!
//! Arbitrary metadata, payload and link type source must always produce a
//! word-aligned header whose length word locates the payload.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rftap_core::{EncapsulationConfig, FieldPolicy, MetaValue, Metadata, encode};

#[derive(Debug, Arbitrary)]
enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

#[derive(Debug, Arbitrary)]
struct Input {
    selector: i32,
    link_type: i32,
    dissector: String,
    fail_fast: bool,
    entries: Vec<(u8, Value)>,
    payload: Vec<u8>,
}

const KEYS: [&str; 10] = [
    "dlt", "freq", "nomfreq", "freqofs", "power", "noise", "snr", "qual", "dissector", "other",
];

fuzz_target!(|input: Input| {
    let policy = if input.fail_fast {
        FieldPolicy::FailFast
    } else {
        FieldPolicy::SkipAndReport
    };
    let config =
        EncapsulationConfig::from_selector(input.selector, input.link_type, &input.dissector)
            .with_field_policy(policy);

    let meta: Metadata = input
        .entries
        .into_iter()
        .map(|(k, v)| {
            let value = match v {
                Value::Null => MetaValue::Null,
                Value::Bool(b) => MetaValue::Bool(b),
                Value::Integer(i) => MetaValue::Integer(i),
                Value::Float(f) => MetaValue::Float(f),
                Value::Text(s) => MetaValue::Text(s),
                Value::Bytes(b) => MetaValue::Bytes(b),
            };
            (KEYS[usize::from(k) % KEYS.len()], value)
        })
        .collect();

    if let Ok(out) = encode(&meta, &input.payload, &config) {
        assert_eq!(out.header_len() % 4, 0);
        let words = u16::from_le_bytes([out.bytes()[4], out.bytes()[5]]);
        assert_eq!(usize::from(words) * 4, out.header_len());
        assert_eq!(out.payload(), &input.payload[..]);
    }
});
