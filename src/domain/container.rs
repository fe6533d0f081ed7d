//! MAC container domain types and the fixed-position schema accessors shared by
//! the builder and the readers.
//!
//! ```text
//! ContentInfo        { contentType, [0] AuthenticatedData }
//! AuthenticatedData  { version, recipientInfos, macAlgorithm, [1] digestAlgorithm,
//!                      encapContentInfo, [2] authAttrs, mac }
//! RecipientInfo [3]  { version, [0] kdfAlgorithm, keyWrapAlgorithm, encryptedKey }
//! EncapContentInfo   { eContentType, [0] OCTET STRING (PdfMacIntegrityInfo) }
//! PdfMacIntegrityInfo{ version, dataDigest, [0] signatureDigest OPTIONAL }
//! ```
//!
//! Every positional assumption lives in one accessor here so a schema change
//! is a one-place edit.

use std::fmt;

use der::asn1::ObjectIdentifier;

use crate::domain::asn1::{self, DerNode};
use crate::domain::constants;
use crate::infra::error::{MacError, MacResult};

/// DER-encoded MAC container (`ContentInfo` wrapping `AuthenticatedData`).
#[derive(Clone, PartialEq, Eq)]
pub struct MacContainer {
    der: Vec<u8>,
}

impl MacContainer {
    #[must_use]
    pub fn from_der(der: Vec<u8>) -> Self {
        Self { der }
    }
    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }
    #[must_use]
    pub fn into_der(self) -> Vec<u8> {
        self.der
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.der.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.der.is_empty()
    }
}

impl fmt::Debug for MacContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacContainer(len={})", self.der.len())
    }
}

/// `PdfMacIntegrityInfo`: what the MAC ultimately vouches for.
#[derive(Clone, PartialEq, Eq)]
pub struct IntegrityInfo {
    pub data_digest: Vec<u8>,
    pub signature_digest: Option<Vec<u8>>,
}

impl IntegrityInfo {
    #[must_use]
    pub fn new(data_digest: Vec<u8>, signature_digest: Option<Vec<u8>>) -> Self {
        Self {
            data_digest,
            signature_digest,
        }
    }

    #[must_use]
    pub fn to_der(&self) -> Vec<u8> {
        let data = asn1::octet_string(&self.data_digest);
        match &self.signature_digest {
            Some(sig) => {
                let sig = asn1::tlv(constants::ASN1_CONTEXT_0_PRIMITIVE, sig);
                asn1::sequence(&[constants::VERSION_0, &data, &sig])
            }
            None => asn1::sequence(&[constants::VERSION_0, &data]),
        }
    }

    pub fn from_der(bytes: &[u8]) -> MacResult<Self> {
        let node = DerNode::parse(bytes, "PdfMacIntegrityInfo")?
            .expect_tag(constants::ASN1_SEQUENCE_TAG, "PdfMacIntegrityInfo")?;
        let fields = node.children("PdfMacIntegrityInfo")?;
        let data_digest = fields
            .get(field::INTEGRITY_DATA_DIGEST)
            .ok_or_else(|| MacError::parsing("PdfMacIntegrityInfo", "missing dataDigest"))?
            .expect_tag(constants::ASN1_OCTET_STRING_TAG, "dataDigest")?
            .value()
            .to_vec();
        let signature_digest = match fields.get(field::INTEGRITY_SIGNATURE_DIGEST) {
            Some(node) => Some(
                node.expect_tag(constants::ASN1_CONTEXT_0_PRIMITIVE, "signatureDigest")?
                    .value()
                    .to_vec(),
            ),
            None => None,
        };
        Ok(Self {
            data_digest,
            signature_digest,
        })
    }
}

impl fmt::Debug for IntegrityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IntegrityInfo(data_digest={}, signature_digest={:?})",
            hex::encode(&self.data_digest),
            self.signature_digest.as_ref().map(hex::encode)
        )
    }
}

/// Field positions inside each fixed-shape sequence.
pub mod field {
    pub const CONTENT_INFO_TYPE: usize = 0;
    pub const CONTENT_INFO_CONTENT: usize = 1;

    pub const AUTH_DATA_RECIPIENT_INFOS: usize = 1;
    pub const AUTH_DATA_MAC_ALGORITHM: usize = 2;
    pub const AUTH_DATA_DIGEST_ALGORITHM: usize = 3;
    pub const AUTH_DATA_ENCAP_CONTENT_INFO: usize = 4;
    pub const AUTH_DATA_AUTH_ATTRS: usize = 5;
    pub const AUTH_DATA_MAC: usize = 6;

    pub const RECIPIENT_KDF_ALGORITHM: usize = 1;
    pub const RECIPIENT_KEY_WRAP_ALGORITHM: usize = 2;
    pub const RECIPIENT_ENCRYPTED_KEY: usize = 3;

    pub const ENCAP_CONTENT: usize = 1;

    pub const INTEGRITY_DATA_DIGEST: usize = 1;
    pub const INTEGRITY_SIGNATURE_DIGEST: usize = 2;

    pub const ATTRIBUTE_TYPE: usize = 0;
    pub const ATTRIBUTE_VALUES: usize = 1;

    pub const ALGORITHM_OID: usize = 0;
}

/// `AuthenticatedData` sequence inside the outer `ContentInfo`.
pub fn authenticated_data(container: &[u8]) -> MacResult<DerNode<'_>> {
    let content_info = DerNode::parse(container, "ContentInfo")?
        .expect_tag(constants::ASN1_SEQUENCE_TAG, "ContentInfo")?;
    let content_type = content_info
        .child(field::CONTENT_INFO_TYPE, "ContentInfo.contentType")?
        .as_oid("ContentInfo.contentType")?;
    if content_type != constants::OID_AUTHENTICATED_DATA {
        return Err(MacError::parsing(
            "ContentInfo.contentType",
            format!("expected AuthenticatedData, found {content_type}"),
        ));
    }
    let explicit = content_info
        .child(field::CONTENT_INFO_CONTENT, "ContentInfo.content")?
        .expect_tag(constants::ASN1_CONTEXT_0_CONSTRUCTED, "ContentInfo.content")?;
    explicit
        .child(0, "AuthenticatedData")?
        .expect_tag(constants::ASN1_SEQUENCE_TAG, "AuthenticatedData")
}

/// First (and only) recipient info.
pub fn recipient_info_field<'a>(auth_data: &DerNode<'a>) -> MacResult<DerNode<'a>> {
    auth_data
        .child(field::AUTH_DATA_RECIPIENT_INFOS, "recipientInfos")?
        .expect_tag(constants::ASN1_SET_TAG, "recipientInfos")?
        .child(0, "recipientInfos")
}

pub fn encrypted_key_field<'a>(recipient_info: &DerNode<'a>) -> MacResult<DerNode<'a>> {
    recipient_info
        .child(field::RECIPIENT_ENCRYPTED_KEY, "RecipientInfo.encryptedKey")?
        .expect_tag(constants::ASN1_OCTET_STRING_TAG, "RecipientInfo.encryptedKey")
}

/// OID of the key-wrap `AlgorithmIdentifier` in the recipient info.
pub fn key_wrap_algorithm_field<'a>(recipient_info: &DerNode<'a>) -> MacResult<DerNode<'a>> {
    recipient_info
        .child(
            field::RECIPIENT_KEY_WRAP_ALGORITHM,
            "RecipientInfo.keyEncryptionAlgorithm",
        )?
        .child(field::ALGORITHM_OID, "RecipientInfo.keyEncryptionAlgorithm")
}

/// OID inside the `[0]` key-derivation algorithm.
pub fn kdf_algorithm_field<'a>(recipient_info: &DerNode<'a>) -> MacResult<DerNode<'a>> {
    recipient_info
        .child(field::RECIPIENT_KDF_ALGORITHM, "RecipientInfo.kdfAlgorithm")?
        .expect_tag(
            constants::ASN1_CONTEXT_0_CONSTRUCTED,
            "RecipientInfo.kdfAlgorithm",
        )?
        .child(field::ALGORITHM_OID, "RecipientInfo.kdfAlgorithm")
}

/// Complete outer MAC `AlgorithmIdentifier` sequence.
pub fn mac_algorithm_field<'a>(auth_data: &DerNode<'a>) -> MacResult<DerNode<'a>> {
    auth_data
        .child(field::AUTH_DATA_MAC_ALGORITHM, "macAlgorithm")?
        .expect_tag(constants::ASN1_SEQUENCE_TAG, "macAlgorithm")
}

/// `[1] IMPLICIT` digest `AlgorithmIdentifier`.
pub fn digest_algorithm_field<'a>(auth_data: &DerNode<'a>) -> MacResult<DerNode<'a>> {
    auth_data
        .child(field::AUTH_DATA_DIGEST_ALGORITHM, "digestAlgorithm")?
        .expect_tag(constants::ASN1_CONTEXT_1_CONSTRUCTED, "digestAlgorithm")
}

/// DER of `PdfMacIntegrityInfo` carried in the encapsulated content.
pub fn integrity_info_field<'a>(auth_data: &DerNode<'a>) -> MacResult<&'a [u8]> {
    let encap = auth_data
        .child(field::AUTH_DATA_ENCAP_CONTENT_INFO, "encapContentInfo")?
        .expect_tag(constants::ASN1_SEQUENCE_TAG, "encapContentInfo")?;
    let octets = encap
        .child(field::ENCAP_CONTENT, "encapContentInfo.eContent")?
        .expect_tag(
            constants::ASN1_CONTEXT_0_CONSTRUCTED,
            "encapContentInfo.eContent",
        )?
        .child(0, "encapContentInfo.eContent")?
        .expect_tag(constants::ASN1_OCTET_STRING_TAG, "encapContentInfo.eContent")?;
    Ok(octets.value())
}

/// `[2] IMPLICIT SET OF Attribute`.
pub fn auth_attributes_field<'a>(auth_data: &DerNode<'a>) -> MacResult<DerNode<'a>> {
    auth_data
        .child(field::AUTH_DATA_AUTH_ATTRS, "authAttrs")?
        .expect_tag(constants::ASN1_CONTEXT_2_CONSTRUCTED, "authAttrs")
}

pub fn mac_value_field<'a>(auth_data: &DerNode<'a>) -> MacResult<DerNode<'a>> {
    auth_data
        .child(field::AUTH_DATA_MAC, "mac")?
        .expect_tag(constants::ASN1_OCTET_STRING_TAG, "mac")
}

/// Attribute of the given type within an attribute set (ordering is by DER, not position).
pub fn find_attribute<'a>(
    attributes: &DerNode<'a>,
    attr_type: &ObjectIdentifier,
    what: &str,
) -> MacResult<Option<DerNode<'a>>> {
    for attr in attributes.children(what)? {
        let oid = attr
            .child(field::ATTRIBUTE_TYPE, what)?
            .as_oid(what)?;
        if oid == *attr_type {
            return Ok(Some(attr));
        }
    }
    Ok(None)
}

/// First value of an attribute's `SET OF AttributeValue`.
pub fn attribute_value<'a>(attribute: &DerNode<'a>, what: &str) -> MacResult<DerNode<'a>> {
    attribute
        .child(field::ATTRIBUTE_VALUES, what)?
        .expect_tag(constants::ASN1_SET_TAG, what)?
        .child(0, what)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_info_with_and_without_signature_digest() {
        let plain = IntegrityInfo::new(vec![1; 32], None);
        let der = plain.to_der();
        assert_eq!(der[0], constants::ASN1_SEQUENCE_TAG);
        assert_eq!(IntegrityInfo::from_der(&der).unwrap(), plain);

        let attached = IntegrityInfo::new(vec![1; 32], Some(vec![2; 32]));
        let der = attached.to_der();
        assert_eq!(IntegrityInfo::from_der(&der).unwrap(), attached);
        // version, dataDigest, [0] signatureDigest
        let node = DerNode::parse(&der, "t").unwrap();
        let sig = node.child(field::INTEGRITY_SIGNATURE_DIGEST, "t").unwrap();
        assert_eq!(sig.tag(), constants::ASN1_CONTEXT_0_PRIMITIVE);
    }

    #[test]
    fn wrong_content_type_rejected() {
        let bogus = asn1::sequence(&[
            &asn1::oid(&constants::OID_DATA),
            &asn1::tlv(constants::ASN1_CONTEXT_0_CONSTRUCTED, &asn1::sequence(&[])),
        ]);
        let err = authenticated_data(&bogus).unwrap_err();
        assert!(matches!(err, MacError::ContainerParsing { .. }));
    }

    #[test]
    fn mac_container_debug_is_compact() {
        let c = MacContainer::from_der(vec![0x30, 0x00]);
        assert_eq!(format!("{c:?}"), "MacContainer(len=2)");
        assert_eq!(c.len(), 2);
        assert!(!c.is_empty());
    }
}
