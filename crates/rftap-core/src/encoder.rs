//! RFtap header encoder.
//!
//! Builds the header in a single pass: prologue with placeholder length and
//! flags, fixed fields in ascending bit order, the optional dissector-name
//! block, then backpatches length and flags and appends the payload.

use crate::config::{EncapsulationConfig, FieldPolicy, LinkTypeSource};
use crate::error::{EncodeError, FieldError};
use crate::header::{
    DISSECTOR_KEY, DISSECTOR_TAG, FIELD_PLACEHOLDER, FIXED_FIELDS, FLAGS_OFFSET, FieldSource,
    FieldSpec, FieldWidth, HEADER_ALIGN, HeaderFlags, LENGTH_OFFSET, MAGIC, MAX_DISSECTOR_NAME_LEN,
    MAX_HEADER_SIZE, TAG_TERMINATOR, tagged_padding,
};
use crate::metadata::{MetaValue, Metadata};

/// A packed fixed-field value
#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldValue {
    U32(u32),
    F64(f64),
    F32(f32),
}

impl FieldValue {
    fn write_le(self, buf: &mut Vec<u8>) {
        match self {
            Self::U32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Self::F64(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Self::F32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        }
    }
}

/// Encapsulated message with the field errors collected while encoding it
#[derive(Debug, Clone, PartialEq)]
pub struct Encapsulated {
    bytes: Vec<u8>,
    header_len: usize,
    flags: HeaderFlags,
    diagnostics: Vec<FieldError>,
}

impl Encapsulated {
    /// Header followed by payload
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Header bytes only
    pub fn header(&self) -> &[u8] {
        &self.bytes[..self.header_len]
    }

    /// Payload bytes, unchanged from the input
    pub fn payload(&self) -> &[u8] {
        &self.bytes[self.header_len..]
    }

    /// Header length in bytes
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Presence flags written to the header
    pub fn flags(&self) -> HeaderFlags {
        self.flags
    }

    /// Fields that were left out, in encounter order
    pub fn diagnostics(&self) -> &[FieldError] {
        &self.diagnostics
    }

    /// Check if every applicable field was encoded
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Take the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Take the encoded bytes and the collected field errors
    pub fn into_parts(self) -> (Vec<u8>, Vec<FieldError>) {
        (self.bytes, self.diagnostics)
    }
}

/// RFtap encoder bound to one configuration
///
/// Encoding never mutates the encoder, so one instance can be shared across
/// threads.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    config: EncapsulationConfig,
}

impl Encoder {
    /// Create an encoder
    pub fn new(config: EncapsulationConfig) -> Self {
        Self { config }
    }

    /// Encoder configuration
    pub fn config(&self) -> &EncapsulationConfig {
        &self.config
    }

    /// Encapsulate `payload` with a header describing `metadata`
    ///
    /// # Errors
    ///
    /// See [`encode`].
    pub fn encode(&self, metadata: &Metadata, payload: &[u8]) -> Result<Encapsulated, EncodeError> {
        encode(metadata, payload, &self.config)
    }
}

/// Encapsulate `payload` with a header describing `metadata`
///
/// Fields that are absent, of the wrong type or out of range are left out of
/// the header. Under [`FieldPolicy::SkipAndReport`] they are returned in
/// [`Encapsulated::diagnostics`].
///
/// # Errors
///
/// Returns [`EncodeError::Field`] on the first field error under
/// [`FieldPolicy::FailFast`], and [`EncodeError::Misaligned`] if the header
/// does not end on a word boundary.
pub fn encode(
    metadata: &Metadata,
    payload: &[u8],
    config: &EncapsulationConfig,
) -> Result<Encapsulated, EncodeError> {
    let mut diagnostics = Vec::new();
    let mut flags = HeaderFlags::new();

    let mut buf = Vec::with_capacity(MAX_HEADER_SIZE + payload.len());
    buf.extend_from_slice(&MAGIC);
    buf.extend_from_slice(&FIELD_PLACEHOLDER); // length
    buf.extend_from_slice(&FIELD_PLACEHOLDER); // flags

    for spec in &FIXED_FIELDS {
        match resolve_field(spec, metadata, config.source()) {
            Ok(Some(value)) => {
                tracing::trace!("{} = {:?}", spec.key, value);
                value.write_le(&mut buf);
                flags.insert(spec.mask());
            }
            Ok(None) => {}
            Err(e) => record(&mut diagnostics, e, config.field_policy())?,
        }
    }

    match resolve_dissector(metadata, config.source()) {
        Ok(Some(name)) => write_dissector(&mut buf, name),
        Ok(None) => {}
        Err(e) => record(&mut diagnostics, e, config.field_policy())?,
    }

    let header_len = buf.len();
    if header_len % HEADER_ALIGN != 0 {
        return Err(EncodeError::Misaligned { len: header_len });
    }

    // Bounded by MAX_HEADER_SIZE, fits in u16
    let words = (header_len / HEADER_ALIGN) as u16;
    buf[LENGTH_OFFSET..LENGTH_OFFSET + 2].copy_from_slice(&words.to_le_bytes());
    buf[FLAGS_OFFSET..FLAGS_OFFSET + 2].copy_from_slice(&flags.as_u16().to_le_bytes());

    buf.extend_from_slice(payload);

    tracing::debug!(
        "Encapsulated {} payload bytes (header {} bytes, flags 0x{:04x}, {} field errors)",
        payload.len(),
        header_len,
        flags.as_u16(),
        diagnostics.len()
    );

    Ok(Encapsulated {
        bytes: buf,
        header_len,
        flags,
        diagnostics,
    })
}

/// Apply the field policy to one field error
fn record(
    diagnostics: &mut Vec<FieldError>,
    err: FieldError,
    policy: FieldPolicy,
) -> Result<(), EncodeError> {
    match policy {
        FieldPolicy::SkipAndReport => {
            tracing::warn!("Skipping RFtap field: {}", err);
            diagnostics.push(err);
            Ok(())
        }
        FieldPolicy::FailFast => Err(EncodeError::Field(err)),
    }
}

fn resolve_field(
    spec: &FieldSpec,
    metadata: &Metadata,
    source: &LinkTypeSource,
) -> Result<Option<FieldValue>, FieldError> {
    match spec.source {
        FieldSource::LinkType => match source {
            LinkTypeSource::PayloadMetadata => match metadata.get(spec.key) {
                Some(value) => pack(spec, value).map(Some),
                None => Err(FieldError::Missing { field: spec.key }),
            },
            LinkTypeSource::FixedLinkType { link_type } => u32::try_from(*link_type)
                .map(|v| Some(FieldValue::U32(v)))
                .map_err(|_| FieldError::OutOfRange {
                    field: spec.key,
                    value: i64::from(*link_type),
                }),
            _ => Ok(None),
        },
        FieldSource::Metadata => metadata
            .get(spec.key)
            .map(|value| pack(spec, value))
            .transpose(),
    }
}

/// Check a metadata value against the field type and pack it
fn pack(spec: &FieldSpec, value: &MetaValue) -> Result<FieldValue, FieldError> {
    match spec.width {
        FieldWidth::U32 => {
            let v = value.as_integer().ok_or(FieldError::WrongType {
                field: spec.key,
                expected: "an integer",
                found: value.kind(),
            })?;
            u32::try_from(v)
                .map(FieldValue::U32)
                .map_err(|_| FieldError::OutOfRange {
                    field: spec.key,
                    value: v,
                })
        }
        FieldWidth::F64 | FieldWidth::F32 => {
            let v = value.as_number().ok_or(FieldError::WrongType {
                field: spec.key,
                expected: "a number",
                found: value.kind(),
            })?;
            match spec.width {
                FieldWidth::F32 => {
                    let narrowed = v as f32;
                    // Finite doubles beyond f32::MAX would round to infinity
                    if v.is_finite() && !narrowed.is_finite() {
                        return Err(FieldError::FloatOutOfRange {
                            field: spec.key,
                            value: v,
                        });
                    }
                    Ok(FieldValue::F32(narrowed))
                }
                _ => Ok(FieldValue::F64(v)),
            }
        }
    }
}

fn resolve_dissector<'a>(
    metadata: &'a Metadata,
    source: &'a LinkTypeSource,
) -> Result<Option<&'a str>, FieldError> {
    let name = match source {
        LinkTypeSource::DissectorMetadata => {
            let value = metadata.get(DISSECTOR_KEY).ok_or(FieldError::Missing {
                field: DISSECTOR_KEY,
            })?;
            value.as_text().ok_or(FieldError::WrongType {
                field: DISSECTOR_KEY,
                expected: "text",
                found: value.kind(),
            })?
        }
        LinkTypeSource::FixedDissector { dissector } => dissector.as_str(),
        _ => return Ok(None),
    };

    if name.len() > MAX_DISSECTOR_NAME_LEN {
        return Err(FieldError::NameTooLong {
            len: name.len(),
            max: MAX_DISSECTOR_NAME_LEN,
        });
    }

    Ok(Some(name))
}

/// Append the tag-length-value dissector block, padded to a word boundary
fn write_dissector(buf: &mut Vec<u8>, name: &str) {
    let name = name.as_bytes();
    buf.extend_from_slice(&DISSECTOR_TAG.to_le_bytes());
    // Length checked against MAX_DISSECTOR_NAME_LEN
    buf.push(name.len() as u8);
    buf.push(TAG_TERMINATOR);
    buf.extend_from_slice(name);
    buf.resize(buf.len() + tagged_padding(name.len()), 0);
    tracing::trace!("dissector = {:?}", String::from_utf8_lossy(name));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::FIXED_HEADER_SIZE;

    fn header_words(out: &Encapsulated) -> u16 {
        u16::from_le_bytes([out.bytes()[4], out.bytes()[5]])
    }

    fn header_flags(out: &Encapsulated) -> u16 {
        u16::from_le_bytes([out.bytes()[6], out.bytes()[7]])
    }

    #[test]
    fn test_canonical_dissector_fixture() {
        let meta = Metadata::new().with("dissector", "rds");
        let config = EncapsulationConfig::new(LinkTypeSource::DissectorMetadata);

        let out = encode(&meta, &[1, 2, 3], &config).unwrap();

        assert_eq!(
            out.bytes(),
            &[
                0x52, 0x46, 0x74, 0x61, 0x04, 0x00, 0x00, 0x00, 0x10, 0x00, 0x03, 0xFF, 0x72,
                0x64, 0x73, 0x00, 1, 2, 3
            ]
        );
        assert!(out.is_clean());
        assert_eq!(out.header_len(), 16);
        assert_eq!(out.payload(), &[1, 2, 3]);
    }

    #[test]
    fn test_empty_metadata() {
        let out = encode(&Metadata::new(), b"payload", &EncapsulationConfig::default()).unwrap();

        assert_eq!(&out.bytes()[..4], b"RFta");
        assert_eq!(header_words(&out), 2);
        assert_eq!(header_flags(&out), 0);
        assert_eq!(out.payload(), b"payload");
        assert!(out.is_clean());
    }

    #[test]
    fn test_empty_payload() {
        let out = encode(&Metadata::new(), &[], &EncapsulationConfig::default()).unwrap();
        assert_eq!(out.bytes().len(), FIXED_HEADER_SIZE);
        assert!(out.payload().is_empty());
    }

    #[test]
    fn test_link_type_from_metadata() {
        let meta = Metadata::new().with("dlt", 147);
        let config = EncapsulationConfig::new(LinkTypeSource::PayloadMetadata);

        let out = encode(&meta, &[0xAA], &config).unwrap();

        assert_eq!(header_words(&out), 3);
        assert_eq!(header_flags(&out), HeaderFlags::LINK_TYPE);
        assert_eq!(&out.header()[8..12], &147u32.to_le_bytes());
        assert_eq!(out.payload(), &[0xAA]);
    }

    #[test]
    fn test_fixed_link_type_ignores_metadata() {
        let meta = Metadata::new().with("dlt", 1);
        let config = EncapsulationConfig::new(LinkTypeSource::FixedLinkType { link_type: 228 });

        let out = encode(&meta, &[], &config).unwrap();

        assert_eq!(&out.header()[8..12], &228u32.to_le_bytes());
        assert!(out.is_clean());
    }

    #[test]
    fn test_dlt_ignored_without_link_type_source() {
        let meta = Metadata::new().with("dlt", 1);
        let config = EncapsulationConfig::new(LinkTypeSource::DissectorMetadata)
            .with_field_policy(FieldPolicy::SkipAndReport);

        let out = encode(&meta, &[], &config).unwrap();

        assert!(!out.flags().contains(HeaderFlags::LINK_TYPE));
        // The missing dissector is the only complaint
        assert_eq!(
            out.diagnostics(),
            &[FieldError::Missing { field: "dissector" }]
        );
    }

    #[test]
    fn test_all_fixed_fields_layout() {
        let meta = Metadata::new()
            .with("qual", 0.5)
            .with("snr", 20)
            .with("noise", -90.0)
            .with("power", -70.5)
            .with("freqofs", 1250.0)
            .with("nomfreq", 433_920_000)
            .with("freq", 433_921_250.0)
            .with("dlt", 1);
        let config = EncapsulationConfig::new(LinkTypeSource::PayloadMetadata);

        let out = encode(&meta, &[], &config).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(b"RFta");
        expected.extend_from_slice(&13u16.to_le_bytes());
        expected.extend_from_slice(&0x01EFu16.to_le_bytes());
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(&433_921_250.0f64.to_le_bytes());
        expected.extend_from_slice(&433_920_000.0f64.to_le_bytes());
        expected.extend_from_slice(&1250.0f64.to_le_bytes());
        expected.extend_from_slice(&(-70.5f32).to_le_bytes());
        expected.extend_from_slice(&(-90.0f32).to_le_bytes());
        expected.extend_from_slice(&20.0f32.to_le_bytes());
        expected.extend_from_slice(&0.5f32.to_le_bytes());

        assert_eq!(out.bytes(), &expected[..]);
        assert!(!out.flags().contains(HeaderFlags::RESERVED));
    }

    #[test]
    fn test_wrong_type_is_skipped() {
        let meta = Metadata::new().with("dlt", "not-an-int").with("snr", 3.0);
        let config = EncapsulationConfig::new(LinkTypeSource::PayloadMetadata);

        let out = encode(&meta, &[9], &config).unwrap();

        assert_eq!(header_flags(&out), HeaderFlags::SNR);
        assert_eq!(header_words(&out), 3);
        assert_eq!(
            out.diagnostics(),
            &[FieldError::WrongType {
                field: "dlt",
                expected: "an integer",
                found: "text",
            }]
        );
        assert_eq!(out.payload(), &[9]);
    }

    #[test]
    fn test_float_dlt_rejected() {
        let meta = Metadata::new().with("dlt", 1.0);
        let config = EncapsulationConfig::new(LinkTypeSource::PayloadMetadata);

        let out = encode(&meta, &[], &config).unwrap();

        assert!(out.flags().is_empty());
        assert_eq!(out.diagnostics().len(), 1);
    }

    #[test]
    fn test_bool_is_not_a_number() {
        let meta = Metadata::new().with("power", true);
        let out = encode(&meta, &[], &EncapsulationConfig::default()).unwrap();

        assert!(out.flags().is_empty());
        assert!(matches!(
            out.diagnostics(),
            [FieldError::WrongType { field: "power", found: "bool", .. }]
        ));
    }

    #[test]
    fn test_missing_dlt_reported() {
        let config = EncapsulationConfig::new(LinkTypeSource::PayloadMetadata);
        let out = encode(&Metadata::new(), &[], &config).unwrap();

        assert!(out.flags().is_empty());
        assert_eq!(out.diagnostics(), &[FieldError::Missing { field: "dlt" }]);
    }

    #[test]
    fn test_dlt_out_of_range() {
        let config = EncapsulationConfig::new(LinkTypeSource::PayloadMetadata);

        let out = encode(&Metadata::new().with("dlt", -1), &[], &config).unwrap();
        assert_eq!(
            out.diagnostics(),
            &[FieldError::OutOfRange { field: "dlt", value: -1 }]
        );

        let out = encode(&Metadata::new().with("dlt", 1i64 << 32), &[], &config).unwrap();
        assert!(!out.flags().contains(HeaderFlags::LINK_TYPE));

        let out = encode(&Metadata::new().with("dlt", u32::MAX), &[], &config).unwrap();
        assert_eq!(&out.header()[8..12], &[0xFF; 4]);
    }

    #[test]
    fn test_f32_overflow_reported() {
        let meta = Metadata::new().with("power", 1e39).with("snr", 12.5);
        let out = encode(&meta, &[], &EncapsulationConfig::default()).unwrap();

        assert!(!out.flags().contains(HeaderFlags::POWER));
        assert_eq!(out.flags().as_u16(), HeaderFlags::SNR);
        assert_eq!(
            out.diagnostics(),
            &[FieldError::FloatOutOfRange { field: "power", value: 1e39 }]
        );
        assert_eq!(out.header_len(), FIXED_HEADER_SIZE + 4);

        let config = EncapsulationConfig::default().with_field_policy(FieldPolicy::FailFast);
        let err = encode(&Metadata::new().with("qual", -1e39), &[], &config).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::Field(FieldError::FloatOutOfRange { field: "qual", .. })
        ));
    }

    #[test]
    fn test_f32_infinity_passes_through() {
        let meta = Metadata::new().with("noise", f64::NEG_INFINITY).with("freq", 1e300);
        let out = encode(&meta, &[], &EncapsulationConfig::default()).unwrap();

        assert!(out.is_clean());
        assert_eq!(out.flags().as_u16(), HeaderFlags::FREQ | HeaderFlags::NOISE);
        assert_eq!(&out.header()[16..20], &f32::NEG_INFINITY.to_le_bytes());
    }

    #[test]
    fn test_negative_fixed_link_type_skipped() {
        let config = EncapsulationConfig::from_selector(2, -1, "");
        let out = encode(&Metadata::new(), &[], &config).unwrap();

        assert!(out.flags().is_empty());
        assert_eq!(
            out.diagnostics(),
            &[FieldError::OutOfRange { field: "dlt", value: -1 }]
        );
    }

    #[test]
    fn test_missing_dissector_reported() {
        let config = EncapsulationConfig::new(LinkTypeSource::DissectorMetadata);
        let out = encode(&Metadata::new(), &[7], &config).unwrap();

        assert_eq!(out.header_len(), FIXED_HEADER_SIZE);
        assert_eq!(
            out.diagnostics(),
            &[FieldError::Missing { field: "dissector" }]
        );
    }

    #[test]
    fn test_dissector_wrong_type() {
        let meta = Metadata::new().with("dissector", 5);
        let config = EncapsulationConfig::new(LinkTypeSource::DissectorMetadata);

        let out = encode(&meta, &[], &config).unwrap();

        assert_eq!(out.header_len(), FIXED_HEADER_SIZE);
        assert_eq!(out.diagnostics().len(), 1);
    }

    #[test]
    fn test_fixed_dissector_padding() {
        let cases = [("", 4), ("a", 8), ("ab", 8), ("abc", 8), ("abcd", 8), ("abcde", 12)];
        for (name, block) in cases {
            let config = EncapsulationConfig::new(LinkTypeSource::FixedDissector {
                dissector: name.to_string(),
            });
            let out = encode(&Metadata::new(), &[0xEE], &config).unwrap();

            assert_eq!(out.header_len(), FIXED_HEADER_SIZE + block, "name {name:?}");
            assert_eq!(usize::from(header_words(&out)) * 4, out.header_len());
            assert_eq!(out.header()[10], name.len() as u8);
            assert_eq!(out.header()[11], TAG_TERMINATOR);
            assert_eq!(&out.header()[12..12 + name.len()], name.as_bytes());
            assert!(out.header()[12 + name.len()..].iter().all(|&b| b == 0));
            assert_eq!(out.payload(), &[0xEE]);
        }
    }

    #[test]
    fn test_dissector_name_length_is_utf8_bytes() {
        let meta = Metadata::new().with("dissector", "é");
        let config = EncapsulationConfig::new(LinkTypeSource::DissectorMetadata);

        let out = encode(&meta, &[], &config).unwrap();

        assert_eq!(out.header()[10], 2);
        assert_eq!(out.header_len(), 16);
    }

    #[test]
    fn test_name_too_long_omits_block() {
        let meta = Metadata::new().with("dissector", "x".repeat(256)).with("snr", 1.0);
        let config = EncapsulationConfig::new(LinkTypeSource::DissectorMetadata);

        let out = encode(&meta, &[1], &config).unwrap();

        assert_eq!(out.header_len(), FIXED_HEADER_SIZE + 4);
        assert_eq!(out.flags().as_u16(), HeaderFlags::SNR);
        assert_eq!(
            out.diagnostics(),
            &[FieldError::NameTooLong { len: 256, max: 255 }]
        );
    }

    #[test]
    fn test_longest_name_fits() {
        let meta = Metadata::new().with("dissector", "x".repeat(255));
        let config = EncapsulationConfig::new(LinkTypeSource::DissectorMetadata);

        let out = encode(&meta, &[], &config).unwrap();

        assert!(out.is_clean());
        assert_eq!(out.header_len(), MAX_HEADER_SIZE - 44);
        assert_eq!(out.header()[10], 255);
    }

    #[test]
    fn test_fail_fast() {
        let meta = Metadata::new().with("freq", "fast");
        let config = EncapsulationConfig::new(LinkTypeSource::None)
            .with_field_policy(FieldPolicy::FailFast);

        let err = encode(&meta, &[], &config).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::Field(FieldError::WrongType { field: "freq", .. })
        ));

        let ok = encode(&Metadata::new().with("freq", 1.0), &[], &config).unwrap();
        assert!(ok.is_clean());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let meta = Metadata::new().with("bogus", 1).with("dissector", "rds");
        let out = encode(&meta, &[], &EncapsulationConfig::default()).unwrap();

        assert_eq!(out.header_len(), FIXED_HEADER_SIZE);
        assert!(out.is_clean());
    }

    #[test]
    fn test_encoder_is_idempotent() {
        let encoder = Encoder::new(EncapsulationConfig::new(LinkTypeSource::PayloadMetadata));
        let meta = Metadata::new().with("dlt", 1).with("freq", 1e9);

        let a = encoder.encode(&meta, b"abc").unwrap();
        let b = encoder.encode(&meta, b"abc").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_into_parts() {
        let config = EncapsulationConfig::new(LinkTypeSource::PayloadMetadata);
        let (bytes, errors) = encode(&Metadata::new(), &[5], &config)
            .unwrap()
            .into_parts();
        assert_eq!(bytes.len(), FIXED_HEADER_SIZE + 1);
        assert_eq!(errors.len(), 1);
    }
}
