//! Validation service: re-derives a stored MAC container against the document.
//!
//! Order of checks:
//! 1. cmsAlgorithmProtection vs. outer algorithm identifiers, then registry
//!    lookup of every algorithm including the recipient's key derivation
//! 2. recomputed integrity-info digest vs. messageDigest attribute
//! 3. authentication key unwrap under the derived key-encryption key
//! 4. HMAC over the authenticated attributes (constant-time compare)

use subtle::ConstantTimeEq;

use crate::{
    domain::{
        algorithms::{KeyWrapAlgorithm, MacAlgorithm, MacDigestAlgorithm},
        constants,
        container::IntegrityInfo,
        verification::MacVerificationReport,
    },
    services::{container_reader::MacContainerReader, key_wrap},
    MacError, MacMismatch, MacResult,
};

/// Key material needed to unwrap the authentication key.
#[derive(Clone, Copy)]
pub struct ValidationKeys<'a> {
    pub file_encryption_key: &'a [u8],
    pub kdf_salt: &'a [u8],
}

pub struct MacValidator;

impl Default for MacValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl MacValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub fn validate(
        &self,
        reader: &dyn MacContainerReader,
        document: &[u8],
        keys: ValidationKeys<'_>,
    ) -> MacResult<MacVerificationReport> {
        let result = self.run(reader, document, keys);
        if let Err(e) = &result {
            if e.is_validation_failure() {
                log::warn!("MAC validation rejected document: {e}");
            } else {
                log::debug!("MAC validation could not complete: {e}");
            }
        }
        result
    }

    fn run(
        &self,
        reader: &dyn MacContainerReader,
        document: &[u8],
        keys: ValidationKeys<'_>,
    ) -> MacResult<MacVerificationReport> {
        // 1. Algorithm protection before any lookup, so a swapped OID is a mismatch
        let digest_oid = reader.parse_digest_algorithm_oid()?;
        let mac_oid = reader.parse_mac_algorithm_oid()?;
        let protection = reader.parse_algorithm_protection()?;
        if protection.digest_algorithm != digest_oid || protection.mac_algorithm != mac_oid {
            log::debug!(
                "Algorithm protection mismatch: container ({digest_oid}, {mac_oid}) vs attribute ({}, {})",
                protection.digest_algorithm,
                protection.mac_algorithm
            );
            return Err(MacError::ValidationFailed(MacMismatch::AlgorithmProtection));
        }
        let digest_algorithm = MacDigestAlgorithm::from_oid(&digest_oid)?;
        let mac_algorithm = MacAlgorithm::from_oid(&mac_oid)?;
        let key_wrap_algorithm = KeyWrapAlgorithm::from_oid(&reader.parse_key_wrap_algorithm_oid()?)?;
        let kdf_oid = reader.parse_kdf_algorithm_oid()?;
        if kdf_oid != constants::OID_KDF_PDF_MAC_WRAP_KEY {
            return Err(MacError::WrapAlgorithmNotSupported(format!(
                "key derivation {kdf_oid}"
            )));
        }

        // 2. Document digest
        let byte_range = reader.parse_byte_range();
        let data_digest = digest_algorithm.digest_parts(&byte_range.segments(document)?);
        let signature_digest = reader
            .parse_associated_signature()
            .map(|signature| digest_algorithm.digest(signature));
        let signature_bound = signature_digest.is_some();
        let expected_info = IntegrityInfo::new(data_digest, signature_digest).to_der();
        let expected_digest = digest_algorithm.digest(&expected_info);
        let stored_digest = reader.parse_message_digest()?;
        if !bool::from(expected_digest.ct_eq(&stored_digest)) {
            return Err(MacError::ValidationFailed(MacMismatch::DocumentDigest));
        }

        // 3. Key unwrap
        let kek = key_wrap::derive_wrap_key(
            keys.file_encryption_key,
            keys.kdf_salt,
            constants::PDF_MAC_KDF_LABEL,
        )?;
        let auth_key = key_wrap::unwrap_key(key_wrap_algorithm, &reader.parse_wrapped_key()?, &kek[..])?;

        // 4. MAC
        let attrs = reader.parse_auth_attributes()?;
        let stored_mac = reader.parse_mac()?;
        if !mac_algorithm.verify(&auth_key, &attrs, &stored_mac)? {
            return Err(MacError::ValidationFailed(MacMismatch::MacValue));
        }

        log::info!(
            "MAC validated ({:?}, {}, byte range {})",
            reader.location(),
            digest_algorithm,
            byte_range
        );
        Ok(MacVerificationReport {
            location: reader.location(),
            byte_range,
            digest_algorithm,
            mac_algorithm,
            key_wrap_algorithm,
            signature_bound,
        })
    }
}
