//! Document-level MAC protector.
//!
//! One protector per document session, created either for construction
//! (properties + location) or for validation (an existing `/AuthCode`
//! dictionary). Construction is driven by the document pipeline hooks:
//!
//! * [`MacProtector::before_final_serialization`] writes the `/AuthCode` dictionary
//!   (with placeholders for standalone containers),
//! * [`MacProtector::after_byte_stream_materialized`] patches them,
//! * [`MacProtector::embed_into_signature`] covers the attached variant.

use zeroize::Zeroizing;

use crate::{
    domain::{
        byte_range::ByteRange,
        constants,
        container::MacContainer,
        context::ProtectionContext,
        document::{AuthDictionary, MacDocument, MacLocation, ObjectRef},
        properties::MacProperties,
        verification::MacVerificationReport,
    },
    services::{
        container_builder::MacContainerBuilder,
        container_reader,
        key_wrap,
        placeholder::MacPlaceholder,
        signature_embedder::SignatureMacEmbedder,
        validator::{MacValidator, ValidationKeys},
    },
    MacError, MacResult,
};

#[derive(Debug)]
enum Mode {
    Construction {
        properties: MacProperties,
        location: MacLocation,
        placeholder: MacPlaceholder,
        signature_reference: Option<ObjectRef>,
    },
    Validation {
        dictionary: AuthDictionary,
    },
}

#[derive(Debug)]
pub struct MacProtector {
    mode: Mode,
    context: ProtectionContext,
}

impl MacProtector {
    /// Protector that will attach a new MAC container.
    #[must_use]
    pub fn for_construction(properties: MacProperties, location: MacLocation) -> Self {
        log::debug!(
            "MAC protector for construction: {:?}, digest {}",
            location,
            properties.digest_algorithm()
        );
        Self {
            mode: Mode::Construction {
                properties,
                location,
                placeholder: MacPlaceholder::new(properties),
                signature_reference: None,
            },
            context: ProtectionContext::new(),
        }
    }

    /// Construction protector with a non-default `/ByteRange` placeholder width.
    #[must_use]
    pub fn for_construction_with_width(
        properties: MacProperties,
        location: MacLocation,
        byte_range_width: usize,
    ) -> Self {
        let mut protector = Self::for_construction(properties, location);
        if let Mode::Construction { placeholder, .. } = &mut protector.mode {
            *placeholder = MacPlaceholder::with_byte_range_width(properties, byte_range_width);
        }
        protector
    }

    /// Protector that checks the container described by an existing dictionary.
    #[must_use]
    pub fn for_validation(dictionary: AuthDictionary) -> Self {
        log::debug!("MAC protector for validation: {dictionary:?}");
        Self {
            mode: Mode::Validation { dictionary },
            context: ProtectionContext::new(),
        }
    }

    #[must_use]
    pub fn location(&self) -> MacLocation {
        match &self.mode {
            Mode::Construction { location, .. } => *location,
            Mode::Validation { dictionary } => dictionary.location,
        }
    }

    /// Construction properties; `None` for validation protectors.
    #[must_use]
    pub fn properties(&self) -> Option<MacProperties> {
        match &self.mode {
            Mode::Construction { properties, .. } => Some(*properties),
            Mode::Validation { .. } => None,
        }
    }

    pub fn set_file_encryption_key(&mut self, key: &[u8]) {
        self.context.set_file_encryption_key(key);
    }

    /// KDF salt, generated on first call; store it with the document's encryption data.
    pub fn kdf_salt(&mut self) -> Vec<u8> {
        self.context.kdf_salt().to_vec()
    }

    /// Salt recorded at protection time; rejects anything but 32 bytes.
    pub fn set_kdf_salt(&mut self, salt: &[u8]) -> MacResult<()> {
        self.context.set_kdf_salt(salt)
    }

    /// Signature dictionary the attached container belongs to (`/SigObjRef`).
    pub fn set_signature_reference(&mut self, reference: ObjectRef) -> MacResult<()> {
        match &mut self.mode {
            Mode::Construction {
                signature_reference,
                ..
            } => {
                *signature_reference = Some(reference);
                Ok(())
            }
            Mode::Validation { .. } => Err(MacError::ConfigurationError(
                "signature reference can only be set on a construction protector".into(),
            )),
        }
    }

    /// Hook: append the `/AuthCode` dictionary to the trailer being written.
    pub fn before_final_serialization(&mut self, out: &mut Vec<u8>) -> MacResult<()> {
        let Mode::Construction {
            location,
            placeholder,
            signature_reference,
            ..
        } = &mut self.mode
        else {
            return Err(Self::not_construction("before_final_serialization"));
        };
        match location {
            MacLocation::Standalone => {
                placeholder.reserve(out)?;
            }
            MacLocation::AttachedToSignature => {
                let reference = signature_reference.ok_or(MacError::SignatureReferenceMissing)?;
                AuthDictionary::attached(reference).write_to(out);
                log::debug!("Wrote attached /AuthCode dictionary referencing {reference}");
            }
        }
        Ok(())
    }

    /// Hook: patch the standalone placeholders once the byte stream is complete.
    /// Returns the protected byte range, or `None` for attached containers.
    pub fn after_byte_stream_materialized(
        &mut self,
        document: &mut [u8],
    ) -> MacResult<Option<ByteRange>> {
        match &self.mode {
            Mode::Validation { .. } => {
                return Err(Self::not_construction("after_byte_stream_materialized"))
            }
            Mode::Construction {
                location: MacLocation::AttachedToSignature,
                ..
            } => return Ok(None),
            Mode::Construction { .. } => {}
        }
        let kek = self.construction_wrap_key()?;
        let Mode::Construction { placeholder, .. } = &mut self.mode else {
            return Err(Self::not_construction("after_byte_stream_materialized"));
        };
        placeholder.finalize(document, &kek[..]).map(Some)
    }

    /// Attached variant: build a container over `signed_segments` (the bytes the
    /// signature's byte range covers) bound to the signature value, and return
    /// the signature container with the MAC added as an unsigned attribute.
    pub fn embed_into_signature(
        &mut self,
        signature_container: &[u8],
        signed_segments: &[&[u8]],
    ) -> MacResult<Vec<u8>> {
        let properties = match &self.mode {
            Mode::Construction {
                properties,
                location: MacLocation::AttachedToSignature,
                ..
            } => *properties,
            Mode::Construction { .. } => {
                return Err(MacError::ConfigurationError(
                    "embed_into_signature requires an attached-to-signature protector".into(),
                ))
            }
            Mode::Validation { .. } => return Err(Self::not_construction("embed_into_signature")),
        };
        let kek = self.construction_wrap_key()?;
        let digest_algorithm = properties.digest_algorithm();
        let data_digest = digest_algorithm.digest_parts(signed_segments);
        let signature_value = SignatureMacEmbedder::signature_value(signature_container)?;
        let signature_digest = digest_algorithm.digest(&signature_value);
        let auth_key = key_wrap::generate_mac_key();
        let container: MacContainer = MacContainerBuilder::new(properties).build(
            &data_digest,
            &auth_key,
            Some(&signature_digest),
            &kek[..],
        )?;
        SignatureMacEmbedder::new().embed(signature_container, &container)
    }

    /// Check the stored container against `document`.
    pub fn validate(&self, document: &dyn MacDocument) -> MacResult<()> {
        self.validate_with_report(document).map(|_| ())
    }

    pub fn validate_with_report(
        &self,
        document: &dyn MacDocument,
    ) -> MacResult<MacVerificationReport> {
        let Mode::Validation { dictionary } = &self.mode else {
            return Err(MacError::ConfigurationError(
                "validate requires a protector created for validation".into(),
            ));
        };
        let salt = self
            .context
            .existing_kdf_salt()
            .ok_or(MacError::KdfSaltNotSpecified)?;
        let reader = container_reader::reader_for(dictionary, document)?;
        MacValidator::new().validate(
            reader.as_ref(),
            document.bytes(),
            ValidationKeys {
                file_encryption_key: self.context.file_encryption_key(),
                kdf_salt: salt,
            },
        )
    }

    fn construction_wrap_key(&mut self) -> MacResult<Zeroizing<[u8; constants::WRAP_KEY_LENGTH]>> {
        let salt = self.context.kdf_salt().to_vec();
        key_wrap::derive_wrap_key(
            self.context.file_encryption_key(),
            &salt,
            constants::PDF_MAC_KDF_LABEL,
        )
    }

    fn not_construction(operation: &str) -> MacError {
        MacError::ConfigurationError(format!(
            "{operation} requires a protector created for construction"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::InMemoryDocument;
    use crate::infra::error::MacMismatch;

    fn protect(file_key: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut protector =
            MacProtector::for_construction(MacProperties::default(), MacLocation::Standalone);
        protector.set_file_encryption_key(file_key);
        let salt = protector.kdf_salt();
        let mut out = b"%PDF-2.0\nbody\ntrailer\n<< ".to_vec();
        protector.before_final_serialization(&mut out).unwrap();
        out.extend_from_slice(b" >>\n%%EOF\n");
        let range = protector.after_byte_stream_materialized(&mut out).unwrap();
        assert!(range.is_some());
        (out, salt)
    }

    #[test]
    fn standalone_round_trip() {
        let (out, salt) = protect(&[4u8; 32]);
        let mut validator = MacProtector::for_validation(AuthDictionary::extract(&out).unwrap());
        validator.set_file_encryption_key(&[4u8; 32]);
        validator.set_kdf_salt(&salt).unwrap();
        validator.validate(&InMemoryDocument::new(out)).unwrap();
    }

    #[test]
    fn empty_file_key_round_trip() {
        let (out, salt) = protect(&[]);
        let mut validator = MacProtector::for_validation(AuthDictionary::extract(&out).unwrap());
        validator.set_kdf_salt(&salt).unwrap();
        validator.validate(&InMemoryDocument::new(out)).unwrap();
    }

    #[test]
    fn validation_requires_salt() {
        let (out, _) = protect(&[]);
        let validator = MacProtector::for_validation(AuthDictionary::extract(&out).unwrap());
        assert!(matches!(
            validator.validate(&InMemoryDocument::new(out)),
            Err(MacError::KdfSaltNotSpecified)
        ));
    }

    #[test]
    fn wrong_file_key_fails_validation() {
        let (out, salt) = protect(&[4u8; 32]);
        let mut validator = MacProtector::for_validation(AuthDictionary::extract(&out).unwrap());
        validator.set_file_encryption_key(&[5u8; 32]);
        validator.set_kdf_salt(&salt).unwrap();
        let err = validator.validate(&InMemoryDocument::new(out)).unwrap_err();
        assert!(matches!(err, MacError::ValidationFailed(MacMismatch::KeyUnwrap)));
    }

    #[test]
    fn hooks_reject_wrong_mode() {
        let mut validator = MacProtector::for_validation(AuthDictionary::attached(ObjectRef::new(1, 0)));
        assert!(validator.before_final_serialization(&mut Vec::new()).is_err());
        assert!(validator.set_signature_reference(ObjectRef::new(2, 0)).is_err());

        let mut attached =
            MacProtector::for_construction(MacProperties::default(), MacLocation::AttachedToSignature);
        assert!(matches!(
            attached.before_final_serialization(&mut Vec::new()),
            Err(MacError::SignatureReferenceMissing)
        ));
        assert!(attached.validate(&InMemoryDocument::default()).is_err());

        let mut standalone =
            MacProtector::for_construction(MacProperties::default(), MacLocation::Standalone);
        assert!(matches!(
            standalone.embed_into_signature(&[], &[]),
            Err(MacError::ConfigurationError(_))
        ));
    }

    #[test]
    fn attached_construction_writes_reference() {
        let mut protector =
            MacProtector::for_construction(MacProperties::default(), MacLocation::AttachedToSignature);
        protector.set_signature_reference(ObjectRef::new(9, 0)).unwrap();
        let mut out = Vec::new();
        protector.before_final_serialization(&mut out).unwrap();
        assert_eq!(protector.after_byte_stream_materialized(&mut out).unwrap(), None);
        let dict = AuthDictionary::extract(&out).unwrap();
        assert_eq!(dict.signature_reference, Some(ObjectRef::new(9, 0)));
    }
}
