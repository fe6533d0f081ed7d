//! `VerifyWorkflow`: high-level facade for verifying MAC-protected documents.
//!
//! Reads the last `/AuthCode` dictionary and delegates to a validation protector;
//! keeps symmetry with the protect workflow. The dictionary text itself lies
//! inside the protected byte range, so an unreadable or incomplete dictionary
//! is reported as a validation failure rather than a parsing error.

use crate::{
    domain::{
        document::{AuthDictionary, MacDocument, MacLocation},
        verification::MacVerificationReport,
    },
    services::protector::MacProtector,
    MacError, MacMismatch, MacResult,
};

/// Orchestrates verification steps for a serialized document.
pub struct VerifyWorkflow;

impl Default for VerifyWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl VerifyWorkflow {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Run verification over `document` with the key material recorded at protection time.
    pub fn run(
        &self,
        document: &dyn MacDocument,
        file_encryption_key: &[u8],
        kdf_salt: &[u8],
    ) -> MacResult<MacVerificationReport> {
        let dictionary = Self::read_dictionary(document.bytes())?;
        let mut protector = MacProtector::for_validation(dictionary);
        protector.set_file_encryption_key(file_encryption_key);
        protector.set_kdf_salt(kdf_salt)?;
        protector.validate_with_report(document)
    }

    /// Extract the dictionary and check it names everything its location needs.
    fn read_dictionary(bytes: &[u8]) -> MacResult<AuthDictionary> {
        let dictionary = AuthDictionary::extract(bytes).map_err(unreadable_dictionary)?;
        match dictionary.location {
            MacLocation::Standalone => {
                if dictionary.container.is_none() {
                    return Err(unreadable_dictionary(MacError::ContainerNotSpecified));
                }
                let range = dictionary
                    .byte_range
                    .ok_or_else(|| unreadable_dictionary(MacError::ByteRangeNotSpecified))?;
                range.segments(bytes).map_err(unreadable_dictionary)?;
            }
            MacLocation::AttachedToSignature => {
                if dictionary.signature_reference.is_none() {
                    return Err(unreadable_dictionary(MacError::SignatureReferenceMissing));
                }
            }
        }
        Ok(dictionary)
    }
}

fn unreadable_dictionary(error: MacError) -> MacError {
    log::warn!("AuthCode dictionary rejected: {error}");
    MacError::ValidationFailed(MacMismatch::AuthDictionary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::byte_range::ByteRange;
    use crate::domain::document::{InMemoryDocument, ObjectRef};

    fn assert_dictionary_mismatch(bytes: &[u8]) {
        let err = VerifyWorkflow::new()
            .run(&InMemoryDocument::new(bytes.to_vec()), b"", &[0u8; 32])
            .unwrap_err();
        assert!(
            matches!(err, MacError::ValidationFailed(MacMismatch::AuthDictionary)),
            "{err}"
        );
    }

    #[test]
    fn missing_dictionary_is_a_validation_failure() {
        assert_dictionary_mismatch(b"%PDF-1.7\ntrailer\n<< /Size 1 >>\n%%EOF\n");
    }

    #[test]
    fn incomplete_dictionaries_are_validation_failures() {
        assert_dictionary_mismatch(b"trailer << /AuthCode <</MACLocation /Standalone>> >>");
        assert_dictionary_mismatch(
            b"trailer << /AuthCode <</MACLocation /Standalone /MAC <3000>>> >>",
        );
        assert_dictionary_mismatch(b"trailer << /AuthCode <</MACLocation /AttachedToSig>> >>");
    }

    #[test]
    fn byte_range_beyond_document_is_a_validation_failure() {
        let range = ByteRange::from_values([0, 10, 20, 4000]).expect("range");
        let mut bytes = b"trailer << ".to_vec();
        AuthDictionary::standalone(vec![0x30, 0x00], range).write_to(&mut bytes);
        bytes.extend_from_slice(b" >>");
        assert_dictionary_mismatch(&bytes);
    }

    #[test]
    fn unresolvable_reference_is_not_a_dictionary_mismatch() {
        let mut bytes = b"trailer << ".to_vec();
        AuthDictionary::attached(ObjectRef::new(9, 0)).write_to(&mut bytes);
        bytes.extend_from_slice(b" >>");
        let err = VerifyWorkflow::new()
            .run(&InMemoryDocument::new(bytes), b"", &[0u8; 32])
            .unwrap_err();
        assert!(matches!(err, MacError::SignatureNotFound(_)), "{err}");
    }
}
