//! # RFtap Core
//!
//! Encapsulates arbitrary payloads behind an RFtap metadata header, so that
//! captures of radio-layer frames can carry frequency, signal levels and the
//! protocol (link type or dissector name) of what is inside.
//!
//! This crate provides:
//! - The header layout and fixed field table
//! - A stateless encoder with per-field diagnostics
//! - Metadata values and host PDU shape validation
//! - Error types and handling
//!
//! ## Wire format
//!
//! ```text
//! offset 0   magic    "RFta"
//! offset 4   length   u16, header size in 32-bit words
//! offset 6   flags    u16, one bit per fixed field present
//! offset 8   fixed fields in ascending bit order
//!            dissector-name block (tag 16, len, 0xFF, name, zero pad)
//!            payload, unchanged
//! ```
//!
//! ## Example
//!
//! ```
//! use rftap_core::{EncapsulationConfig, LinkTypeSource, Metadata, encode};
//!
//! let config = EncapsulationConfig::new(LinkTypeSource::DissectorMetadata);
//! let meta = Metadata::new().with("dissector", "rds");
//! let out = encode(&meta, &[1, 2, 3], &config).unwrap();
//!
//! assert_eq!(out.header_len(), 16);
//! assert_eq!(out.payload(), &[1, 2, 3]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod config;
pub mod encoder;
pub mod error;
pub mod header;
pub mod metadata;
pub mod pdu;

pub use config::{EncapsulationConfig, FieldPolicy, LinkTypeSource};
pub use encoder::{Encapsulated, Encoder, encode};
pub use error::{ConfigError, EncodeError, FieldError};
pub use header::{FIXED_FIELDS, FIXED_HEADER_SIZE, HeaderFlags, MAGIC, MAX_HEADER_SIZE};
pub use metadata::{MetaValue, Metadata};
pub use pdu::{EncapsulatedPdu, Pdu};
