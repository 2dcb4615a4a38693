//! Error types for RFtap encapsulation.

use thiserror::Error;

/// Fatal encoding errors
///
/// Any of these aborts the `encode` call and no output is produced.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// PDU metadata is neither a mapping nor null
    #[error("malformed metadata: expected a mapping, got {found}")]
    MalformedMetadata {
        /// Kind of value that was received
        found: &'static str,
    },

    /// PDU payload is not a byte vector
    #[error("malformed payload: {reason}")]
    MalformedPayload {
        /// Why the payload was rejected
        reason: String,
    },

    /// PDU is not a (metadata, payload) pair
    #[error("malformed PDU: expected a (metadata, payload) pair, got {found}")]
    MalformedPdu {
        /// Kind of value that was received
        found: &'static str,
    },

    /// A field could not be encoded and the policy is fail-fast
    #[error("field error: {0}")]
    Field(#[from] FieldError),

    /// Header did not end on a 4-byte boundary. This is an encoder bug.
    #[error("internal error: header length {len} is not a multiple of 4")]
    Misaligned {
        /// Header length in bytes
        len: usize,
    },
}

/// Non-fatal, per-field errors
///
/// Under the default policy the field is left out of the header and the
/// error is returned next to the encoded bytes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// The configured source requires a metadata key that is absent
    #[error("{field} is expected in metadata, but it is missing")]
    Missing {
        /// Metadata key
        field: &'static str,
    },

    /// The value has the wrong type for the field
    #[error("{field} must be {expected}, got {found}")]
    WrongType {
        /// Metadata key
        field: &'static str,
        /// Accepted value kind
        expected: &'static str,
        /// Received value kind
        found: &'static str,
    },

    /// Integer value does not fit the wire width
    #[error("{field} value {value} does not fit in the header field")]
    OutOfRange {
        /// Metadata key
        field: &'static str,
        /// Offending value
        value: i64,
    },

    /// Finite number too large in magnitude for a 32-bit float field
    #[error("{field} value {value} overflows a 32-bit float")]
    FloatOutOfRange {
        /// Metadata key
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// Dissector name does not fit the one-byte length
    #[error("dissector name is {len} bytes, at most {max} are allowed")]
    NameTooLong {
        /// Name length in bytes
        len: usize,
        /// Maximum encodable length
        max: usize,
    },
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Fixed link type cannot be represented as an unsigned 32-bit DLT
    #[error("fixed link type must be non-negative, got {0}")]
    NegativeLinkType(i32),

    /// Fixed dissector name does not fit the one-byte length
    #[error("fixed dissector name is {len} bytes, at most {max} are allowed")]
    DissectorNameTooLong {
        /// Name length in bytes
        len: usize,
        /// Maximum encodable length
        max: usize,
    },
}
