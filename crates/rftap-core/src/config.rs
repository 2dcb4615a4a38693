//! Encapsulation configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::header::MAX_DISSECTOR_NAME_LEN;

/// How the "what protocol is inside" information is obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum LinkTypeSource {
    /// Link type read from the `dlt` metadata key
    PayloadMetadata,
    /// Dissector name read from the `dissector` metadata key
    DissectorMetadata,
    /// Constant link type
    FixedLinkType {
        /// DLT value written to every header
        link_type: i32,
    },
    /// Constant dissector name
    FixedDissector {
        /// Dissector name written to every header
        dissector: String,
    },
    /// No link type or dissector is emitted
    #[default]
    None,
}

/// What to do when a single field cannot be encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FieldPolicy {
    /// Leave the field out, record the error and keep encoding
    #[default]
    SkipAndReport,
    /// Abort the call on the first field error
    FailFast,
}

/// Immutable per-encoder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EncapsulationConfig {
    #[serde(flatten)]
    source: LinkTypeSource,
    #[serde(default)]
    field_policy: FieldPolicy,
}

impl EncapsulationConfig {
    /// Create a configuration with the default skip-and-report policy
    pub fn new(source: LinkTypeSource) -> Self {
        Self {
            source,
            field_policy: FieldPolicy::default(),
        }
    }

    /// Build from the legacy integer selector.
    ///
    /// `0` payload metadata, `1` dissector metadata, `2` fixed link type,
    /// `3` fixed dissector. Any other value disables the link type.
    pub fn from_selector(selector: i32, link_type: i32, dissector: &str) -> Self {
        let source = match selector {
            0 => LinkTypeSource::PayloadMetadata,
            1 => LinkTypeSource::DissectorMetadata,
            2 => LinkTypeSource::FixedLinkType { link_type },
            3 => LinkTypeSource::FixedDissector {
                dissector: dissector.to_string(),
            },
            _ => LinkTypeSource::None,
        };
        Self::new(source)
    }

    /// Set the field error policy
    #[must_use]
    pub fn with_field_policy(mut self, policy: FieldPolicy) -> Self {
        self.field_policy = policy;
        self
    }

    /// Link type source
    pub fn source(&self) -> &LinkTypeSource {
        &self.source
    }

    /// Field error policy
    pub fn field_policy(&self) -> FieldPolicy {
        self.field_policy
    }

    /// Validate constant values
    ///
    /// # Errors
    ///
    /// Returns an error if a fixed link type is negative or a fixed dissector
    /// name does not fit the one-byte length.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.source {
            LinkTypeSource::FixedLinkType { link_type } if *link_type < 0 => {
                Err(ConfigError::NegativeLinkType(*link_type))
            }
            LinkTypeSource::FixedDissector { dissector }
                if dissector.len() > MAX_DISSECTOR_NAME_LEN =>
            {
                Err(ConfigError::DissectorNameTooLong {
                    len: dissector.len(),
                    max: MAX_DISSECTOR_NAME_LEN,
                })
            }
            _ => Ok(()),
        }
    }
}
