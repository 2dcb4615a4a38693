//! RFtap header layout: constants, presence flags and the fixed field table.
//!
//! All multi-byte fields are little-endian. The header is always a whole
//! number of 32-bit words so the payload that follows starts aligned.

/// Magic bytes opening every RFtap header
pub const MAGIC: [u8; 4] = *b"RFta";

/// Size of the magic/length/flags prologue in bytes
pub const FIXED_HEADER_SIZE: usize = 8;

/// Byte offset of the length word (in 32-bit words)
pub const LENGTH_OFFSET: usize = 4;

/// Byte offset of the flags word
pub const FLAGS_OFFSET: usize = 6;

/// Header length granularity in bytes
pub const HEADER_ALIGN: usize = 4;

/// Zero word written where length and flags are backpatched
pub const FIELD_PLACEHOLDER: [u8; 2] = [0; 2];

/// Largest possible header: prologue, every fixed field and a 255-byte name
pub const MAX_HEADER_SIZE: usize = 312;

/// Tag identifying the dissector-name block
pub const DISSECTOR_TAG: u16 = 16;

/// Terminator byte following the dissector-name length
pub const TAG_TERMINATOR: u8 = 255;

/// Longest dissector name the one-byte length can carry
pub const MAX_DISSECTOR_NAME_LEN: usize = u8::MAX as usize;

/// Header presence flags bitmap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HeaderFlags(u16);

impl HeaderFlags {
    /// Link type (DLT) present
    pub const LINK_TYPE: u16 = 1 << 0;
    /// Center frequency present
    pub const FREQ: u16 = 1 << 1;
    /// Nominal frequency present
    pub const NOMFREQ: u16 = 1 << 2;
    /// Frequency offset present
    pub const FREQOFS: u16 = 1 << 3;
    /// Reserved, never set
    pub const RESERVED: u16 = 1 << 4;
    /// Signal power present
    pub const POWER: u16 = 1 << 5;
    /// Noise power present
    pub const NOISE: u16 = 1 << 6;
    /// Signal-to-noise ratio present
    pub const SNR: u16 = 1 << 7;
    /// Signal quality present
    pub const QUAL: u16 = 1 << 8;

    /// Create new empty flags
    pub fn new() -> Self {
        Self(0)
    }

    /// Wrap a raw flags word
    pub fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Add the given bits
    pub fn with(mut self, bits: u16) -> Self {
        self.0 |= bits;
        self
    }

    /// Set the given bits in place
    pub fn insert(&mut self, bits: u16) {
        self.0 |= bits;
    }

    /// Check if all of the given bits are set
    pub fn contains(&self, bits: u16) -> bool {
        self.0 & bits == bits
    }

    /// Check if no field is flagged
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Get raw word value
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

/// Wire representation of a fixed field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidth {
    /// Unsigned 32-bit integer
    U32,
    /// IEEE-754 double precision
    F64,
    /// IEEE-754 single precision
    F32,
}

impl FieldWidth {
    /// Encoded size in bytes
    pub const fn size(self) -> usize {
        match self {
            Self::U32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/// Where a fixed field takes its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// Resolved through the configured link type source
    LinkType,
    /// Read from the metadata key of the same name
    Metadata,
}

/// One optional fixed-size header field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Bit index in the flags word
    pub bit: u8,
    /// Metadata key
    pub key: &'static str,
    /// Wire representation
    pub width: FieldWidth,
    /// Value source
    pub source: FieldSource,
}

impl FieldSpec {
    /// Flag mask for this field
    pub const fn mask(&self) -> u16 {
        1 << self.bit
    }
}

/// Fixed fields in wire order (ascending bit index). Bit 4 is reserved.
pub const FIXED_FIELDS: [FieldSpec; 8] = [
    FieldSpec { bit: 0, key: "dlt", width: FieldWidth::U32, source: FieldSource::LinkType },
    FieldSpec { bit: 1, key: "freq", width: FieldWidth::F64, source: FieldSource::Metadata },
    FieldSpec { bit: 2, key: "nomfreq", width: FieldWidth::F64, source: FieldSource::Metadata },
    FieldSpec { bit: 3, key: "freqofs", width: FieldWidth::F64, source: FieldSource::Metadata },
    FieldSpec { bit: 5, key: "power", width: FieldWidth::F32, source: FieldSource::Metadata },
    FieldSpec { bit: 6, key: "noise", width: FieldWidth::F32, source: FieldSource::Metadata },
    FieldSpec { bit: 7, key: "snr", width: FieldWidth::F32, source: FieldSource::Metadata },
    FieldSpec { bit: 8, key: "qual", width: FieldWidth::F32, source: FieldSource::Metadata },
];

/// Metadata key carrying the dissector name
pub const DISSECTOR_KEY: &str = "dissector";

/// Zero bytes appended after a dissector name of `name_len` bytes
pub const fn tagged_padding(name_len: usize) -> usize {
    3 - ((name_len + 3) & 3)
}

/// Total size of a dissector-name block including padding
pub const fn tagged_block_len(name_len: usize) -> usize {
    4 + name_len + tagged_padding(name_len)
}
