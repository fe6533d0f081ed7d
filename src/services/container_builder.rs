//! MAC container builder service.
//! Assembles the CMS `AuthenticatedData` container for PDF MAC protection.
//!
//! Output is byte-identical for identical inputs; randomness (the
//! authentication key) is supplied by the caller.

use crate::{
    domain::{
        asn1,
        constants,
        container::{IntegrityInfo, MacContainer},
        properties::MacProperties,
    },
    services::key_wrap,
    MacResult,
};

/// Encoded authenticated attributes in both forms the container needs.
pub struct AuthAttributes {
    /// `SET OF Attribute` (tag 0x31): the MAC input.
    pub set_der: Vec<u8>,
    /// `[2] IMPLICIT` form embedded in `AuthenticatedData`.
    pub embedding_der: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct MacContainerBuilder {
    properties: MacProperties,
}

impl MacContainerBuilder {
    #[must_use]
    pub fn new(properties: MacProperties) -> Self {
        Self { properties }
    }

    #[must_use]
    pub fn properties(&self) -> MacProperties {
        self.properties
    }

    /// Build the complete container.
    ///
    /// * `data_digest` - digest of the protected byte range
    /// * `auth_key` - 32-byte authentication key, MAC'd with and then wrapped
    /// * `signature_digest` - digest of the signature value (attached mode only)
    /// * `wrap_key` - key-encryption key derived from the file encryption key
    pub fn build(
        &self,
        data_digest: &[u8],
        auth_key: &[u8],
        signature_digest: Option<&[u8]>,
        wrap_key: &[u8],
    ) -> MacResult<MacContainer> {
        let digest_algorithm = self.properties.digest_algorithm();

        // 1-2. integrity info and its digest
        let integrity_info =
            IntegrityInfo::new(data_digest.to_vec(), signature_digest.map(<[u8]>::to_vec));
        let integrity_der = integrity_info.to_der();
        let message_digest = digest_algorithm.digest(&integrity_der);

        // 3-4. authenticated attributes + MAC over their SET encoding
        let attrs = self.build_auth_attributes(&message_digest);
        let mac = self
            .properties
            .mac_algorithm()
            .compute(auth_key, &attrs.set_der)?;

        // 5. recipient info with the wrapped key
        let recipient_info = self.build_recipient_info(auth_key, wrap_key)?;

        // 6. AuthenticatedData + ContentInfo
        let auth_data = self.build_authenticated_data(&recipient_info, &integrity_der, &attrs, &mac);
        let content_info = asn1::sequence(&[
            &asn1::oid(&constants::OID_AUTHENTICATED_DATA),
            &asn1::tlv(constants::ASN1_CONTEXT_0_CONSTRUCTED, &auth_data),
        ]);

        log::debug!(
            "Built MAC container: {} bytes (digest={}, mac={}, integrity_info={} bytes, signature_digest={})",
            content_info.len(),
            digest_algorithm,
            self.properties.mac_algorithm(),
            integrity_der.len(),
            signature_digest.is_some()
        );
        Ok(MacContainer::from_der(content_info))
    }

    /// Container built against the digest of empty input and a fresh random
    /// key. Key, digest and MAC lengths are fixed per algorithm, so this
    /// matches the real container size exactly.
    pub fn estimate_size(&self, with_signature_digest: bool) -> MacResult<usize> {
        let empty_digest = self.properties.digest_algorithm().digest(&[]);
        let auth_key = key_wrap::generate_mac_key();
        let kek = key_wrap::generate_mac_key();
        let signature_digest = with_signature_digest.then_some(empty_digest.as_slice());
        let container = self.build(&empty_digest, &auth_key, signature_digest, &kek)?;
        Ok(container.len())
    }

    /// contentType, cmsAlgorithmProtection and messageDigest, in DER SET order.
    #[must_use]
    pub fn build_auth_attributes(&self, message_digest: &[u8]) -> AuthAttributes {
        let content_type = build_attribute(
            &constants::OID_CONTENT_TYPE,
            &asn1::oid(&constants::OID_PDF_MAC_INTEGRITY_INFO),
        );
        let algorithm_protection = build_attribute(
            &constants::OID_CMS_ALGORITHM_PROTECTION,
            &self.build_algorithm_protection(),
        );
        let digest = build_attribute(
            &constants::OID_MESSAGE_DIGEST,
            &asn1::octet_string(message_digest),
        );
        let contents = asn1::set_of_contents(vec![content_type, algorithm_protection, digest]);
        AuthAttributes {
            set_der: asn1::tlv(constants::ASN1_SET_TAG, &contents),
            embedding_der: asn1::tlv(constants::ASN1_CONTEXT_2_CONSTRUCTED, &contents),
        }
    }

    /// `CMSAlgorithmProtection { digestAlgorithm, macAlgorithm [2] IMPLICIT }`.
    #[must_use]
    pub fn build_algorithm_protection(&self) -> Vec<u8> {
        let digest_alg = self.digest_algorithm_identifier();
        let mac_alg = asn1::retag(
            &self.mac_algorithm_identifier(),
            constants::ASN1_CONTEXT_2_CONSTRUCTED,
        );
        asn1::sequence(&[&digest_alg, &mac_alg])
    }

    /// `[3] PasswordRecipientInfo` carrying the wrapped authentication key.
    pub fn build_recipient_info(&self, auth_key: &[u8], wrap_key: &[u8]) -> MacResult<Vec<u8>> {
        let wrap_algorithm = self.properties.key_wrap_algorithm();
        let encrypted_key = key_wrap::wrap_key(wrap_algorithm, auth_key, wrap_key)?;
        let kdf = asn1::retag(
            &asn1::algorithm_identifier(&constants::OID_KDF_PDF_MAC_WRAP_KEY),
            constants::ASN1_CONTEXT_0_CONSTRUCTED,
        );
        let key_wrap = asn1::algorithm_identifier(&wrap_algorithm.oid());
        let body = [
            constants::VERSION_0,
            kdf.as_slice(),
            key_wrap.as_slice(),
            asn1::octet_string(&encrypted_key).as_slice(),
        ]
        .concat();
        Ok(asn1::tlv(constants::ASN1_CONTEXT_3_CONSTRUCTED, &body))
    }

    fn build_authenticated_data(
        &self,
        recipient_info: &[u8],
        integrity_der: &[u8],
        attrs: &AuthAttributes,
        mac: &[u8],
    ) -> Vec<u8> {
        let recipient_infos = asn1::set_of(vec![recipient_info.to_vec()]);
        let digest_alg = asn1::retag(
            &self.digest_algorithm_identifier(),
            constants::ASN1_CONTEXT_1_CONSTRUCTED,
        );
        let encap_content_info = asn1::sequence(&[
            &asn1::oid(&constants::OID_PDF_MAC_INTEGRITY_INFO),
            &asn1::tlv(
                constants::ASN1_CONTEXT_0_CONSTRUCTED,
                &asn1::octet_string(integrity_der),
            ),
        ]);
        asn1::sequence(&[
            constants::VERSION_0,
            &recipient_infos,
            &self.mac_algorithm_identifier(),
            &digest_alg,
            &encap_content_info,
            &attrs.embedding_der,
            &asn1::octet_string(mac),
        ])
    }

    fn digest_algorithm_identifier(&self) -> Vec<u8> {
        asn1::algorithm_identifier(&self.properties.digest_algorithm().oid())
    }

    fn mac_algorithm_identifier(&self) -> Vec<u8> {
        asn1::algorithm_identifier_with_null(&self.properties.mac_algorithm().oid())
    }
}

/// `Attribute ::= SEQUENCE { attrType OID, attrValues SET OF ANY }` with one value.
#[must_use]
pub fn build_attribute(attr_type: &der::asn1::ObjectIdentifier, value: &[u8]) -> Vec<u8> {
    asn1::sequence(&[&asn1::oid(attr_type), &asn1::set_of(vec![value.to_vec()])])
}
