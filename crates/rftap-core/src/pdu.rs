//! Host PDUs: a metadata mapping paired with a byte vector.
//!
//! PDUs arrive as JSON, either `{"meta": {...}, "data": ...}` or a
//! two-element array `[meta, data]`. Data is an array of byte values or a
//! hex string. The metadata is passed through unchanged to the output PDU.

use serde_json::{Value, json};

use crate::encoder::{Encapsulated, Encoder};
use crate::error::EncodeError;
use crate::metadata::{Metadata, json_kind};

/// A validated PDU
#[derive(Debug, Clone, PartialEq)]
pub struct Pdu {
    meta: Value,
    metadata: Metadata,
    data: Vec<u8>,
}

impl Pdu {
    /// Build a PDU from typed parts
    pub fn new(metadata: Metadata, data: Vec<u8>) -> Self {
        Self {
            meta: metadata.to_json(),
            metadata,
            data,
        }
    }

    /// Validate the shape of a JSON PDU
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::MalformedPdu`] if the value is not a pair,
    /// [`EncodeError::MalformedMetadata`] if the metadata is not a mapping and
    /// [`EncodeError::MalformedPayload`] if the data is not a byte vector.
    pub fn from_json(value: &Value) -> Result<Self, EncodeError> {
        let (meta, data) = match value {
            Value::Object(map) if map.contains_key("data") => (map.get("meta"), &map["data"]),
            Value::Array(items) if items.len() == 2 => (Some(&items[0]), &items[1]),
            other => {
                return Err(EncodeError::MalformedPdu {
                    found: json_kind(other),
                });
            }
        };

        let meta = meta.cloned().unwrap_or(Value::Null);
        Ok(Self {
            metadata: Metadata::from_json(&meta)?,
            data: parse_data(data)?,
            meta,
        })
    }

    /// Parsed metadata
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Payload bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

fn parse_data(value: &Value) -> Result<Vec<u8>, EncodeError> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| EncodeError::MalformedPayload {
                        reason: format!("element {i} is not a byte: {item}"),
                    })
            })
            .collect(),
        Value::String(s) => hex::decode(s).map_err(|e| EncodeError::MalformedPayload {
            reason: format!("invalid hex: {e}"),
        }),
        other => Err(EncodeError::MalformedPayload {
            reason: format!("expected a byte vector, got {}", json_kind(other)),
        }),
    }
}

/// An encapsulated PDU, carrying the original metadata
#[derive(Debug, Clone, PartialEq)]
pub struct EncapsulatedPdu {
    meta: Value,
    encapsulated: Encapsulated,
}

impl EncapsulatedPdu {
    /// Metadata as received
    pub fn meta(&self) -> &Value {
        &self.meta
    }

    /// Encoding result
    pub fn encapsulated(&self) -> &Encapsulated {
        &self.encapsulated
    }

    /// JSON form with hex-encoded data
    pub fn to_json(&self) -> Value {
        json!({
            "meta": self.meta,
            "data": hex::encode(self.encapsulated.bytes()),
        })
    }
}

impl Encoder {
    /// Encapsulate a validated PDU
    ///
    /// # Errors
    ///
    /// See [`crate::encode`].
    pub fn encode_pdu(&self, pdu: &Pdu) -> Result<EncapsulatedPdu, EncodeError> {
        let encapsulated = self.encode(&pdu.metadata, &pdu.data)?;
        Ok(EncapsulatedPdu {
            meta: pdu.meta.clone(),
            encapsulated,
        })
    }

    /// Validate and encapsulate a JSON PDU
    ///
    /// # Errors
    ///
    /// Returns a malformed-input error from [`Pdu::from_json`] or an encoding
    /// error.
    pub fn encode_json(&self, value: &Value) -> Result<EncapsulatedPdu, EncodeError> {
        self.encode_pdu(&Pdu::from_json(value)?)
    }
}
