//! `ProtectWorkflow` serializes a document trailer with a MAC container.
//!
//! Drives the protector hooks in pipeline order: body, trailer with the
//! `/AuthCode` dictionary, end-of-file marker, then the in-place patch.

use crate::{
    domain::{
        byte_range::ByteRange,
        constants,
        document::{MacLocation, ObjectRef},
        properties::MacProperties,
    },
    infra::config::MacConfiguration,
    services::protector::MacProtector,
    MacError, MacResult,
};

/// Output of a standalone protection run.
#[derive(Debug, Clone)]
pub struct ProtectedDocument {
    pub bytes: Vec<u8>,
    pub byte_range: ByteRange,
    /// Salt the validator must be given; the caller stores it with the encryption data.
    pub kdf_salt: Vec<u8>,
}

/// Output of an attached protection run.
#[derive(Debug, Clone)]
pub struct AttachedProtection {
    /// Signature container carrying the MAC as an unsigned attribute.
    pub signature_container: Vec<u8>,
    /// `/AuthCode` dictionary referencing the signature.
    pub auth_dictionary: Vec<u8>,
    pub kdf_salt: Vec<u8>,
}

/// Protection settings plus the container location this workflow produces.
pub struct ProtectWorkflow {
    properties: MacProperties,
    byte_range_width: usize,
    location: MacLocation,
}

impl Default for ProtectWorkflow {
    fn default() -> Self {
        Self::new(MacProperties::default())
    }
}

impl ProtectWorkflow {
    #[must_use]
    pub fn new(properties: MacProperties) -> Self {
        Self {
            properties,
            byte_range_width: constants::BYTE_RANGE_PLACEHOLDER_WIDTH,
            location: MacLocation::Standalone,
        }
    }

    pub fn from_config(config: &MacConfiguration) -> MacResult<Self> {
        config.validate()?;
        Ok(Self {
            properties: config.to_properties()?,
            byte_range_width: config.byte_range_placeholder_width,
            location: config.location()?,
        })
    }

    #[must_use]
    pub fn with_location(mut self, location: MacLocation) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn properties(&self) -> MacProperties {
        self.properties
    }

    /// Location selected at construction; picks which of `run` / `run_attached` applies.
    #[must_use]
    pub fn location(&self) -> MacLocation {
        self.location
    }

    fn require_location(&self, expected: MacLocation) -> MacResult<()> {
        if self.location == expected {
            return Ok(());
        }
        Err(MacError::ConfigurationError(format!(
            "workflow is configured for {} MAC containers, not {}",
            self.location.as_pdf_name(),
            expected.as_pdf_name()
        )))
    }

    /// Append a trailer with a standalone MAC to `body` and patch it in place.
    ///
    /// `trailer_entries` is written verbatim inside the trailer dictionary
    /// (e.g. `/Size 12 /Root 1 0 R`). A `kdf_salt` of `None` generates one.
    /// Fails with `ConfigurationError` on a workflow configured for attached containers.
    pub fn run(
        &self,
        body: &[u8],
        trailer_entries: &str,
        file_encryption_key: &[u8],
        kdf_salt: Option<&[u8]>,
    ) -> MacResult<ProtectedDocument> {
        self.require_location(MacLocation::Standalone)?;
        let mut protector = MacProtector::for_construction_with_width(
            self.properties,
            MacLocation::Standalone,
            self.byte_range_width,
        );
        protector.set_file_encryption_key(file_encryption_key);
        if let Some(salt) = kdf_salt {
            protector.set_kdf_salt(salt)?;
        }

        let mut out = Vec::with_capacity(body.len() + 1024);
        out.extend_from_slice(body);
        out.extend_from_slice(format!("trailer\n<< {trailer_entries} ").as_bytes());
        protector.before_final_serialization(&mut out)?;
        out.extend_from_slice(b" >>\n%%EOF\n");

        let byte_range = protector
            .after_byte_stream_materialized(&mut out)?
            .ok_or_else(|| MacError::PlaceholderState("standalone run produced no byte range".into()))?;
        log::info!(
            "Protected document: {} bytes, byte range {}",
            out.len(),
            byte_range
        );
        Ok(ProtectedDocument {
            bytes: out,
            byte_range,
            kdf_salt: protector.kdf_salt(),
        })
    }

    /// Bind a MAC to an existing signature.
    ///
    /// `signed_segments` are the bytes covered by the signature's byte range.
    /// Requires a workflow configured for attached containers.
    pub fn run_attached(
        &self,
        signature_container: &[u8],
        signed_segments: &[&[u8]],
        signature_reference: ObjectRef,
        file_encryption_key: &[u8],
        kdf_salt: Option<&[u8]>,
    ) -> MacResult<AttachedProtection> {
        self.require_location(MacLocation::AttachedToSignature)?;
        let mut protector =
            MacProtector::for_construction(self.properties, MacLocation::AttachedToSignature);
        protector.set_file_encryption_key(file_encryption_key);
        if let Some(salt) = kdf_salt {
            protector.set_kdf_salt(salt)?;
        }
        protector.set_signature_reference(signature_reference)?;

        let signature_container =
            protector.embed_into_signature(signature_container, signed_segments)?;
        let mut auth_dictionary = Vec::new();
        protector.before_final_serialization(&mut auth_dictionary)?;
        log::info!(
            "Attached MAC to signature {signature_reference} ({} bytes)",
            signature_container.len()
        );
        Ok(AttachedProtection {
            signature_container,
            auth_dictionary,
            kdf_salt: protector.kdf_salt(),
        })
    }
}
