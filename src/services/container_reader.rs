//! MAC container readers.
//!
//! Both readers expose the same fixed-schema navigation through the default
//! methods of [`MacContainerReader`]; they differ only in where the container
//! bytes and the protected byte range come from.

use der::asn1::ObjectIdentifier;

use crate::{
    domain::{
        asn1::DerNode,
        byte_range::ByteRange,
        constants,
        container::{self, IntegrityInfo},
        document::{AuthDictionary, MacDocument, MacLocation},
    },
    MacError, MacResult,
};

/// Digest and MAC algorithm OIDs recorded in the `cmsAlgorithmProtection` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmProtection {
    pub digest_algorithm: ObjectIdentifier,
    pub mac_algorithm: ObjectIdentifier,
}

/// Read access to a stored MAC container.
pub trait MacContainerReader {
    /// Raw container bytes; trailing zero padding is tolerated.
    fn container(&self) -> &[u8];

    fn location(&self) -> MacLocation;

    fn parse_byte_range(&self) -> ByteRange;

    /// Signature value the MAC is bound to (attached variant only).
    fn parse_associated_signature(&self) -> Option<&[u8]> {
        None
    }

    fn parse_mac(&self) -> MacResult<Vec<u8>> {
        let auth_data = container::authenticated_data(self.container())?;
        Ok(container::mac_value_field(&auth_data)?.value().to_vec())
    }

    /// Authenticated attributes re-tagged as `SET OF` (the MAC input).
    fn parse_auth_attributes(&self) -> MacResult<Vec<u8>> {
        let auth_data = container::authenticated_data(self.container())?;
        Ok(container::auth_attributes_field(&auth_data)?.encoded_with_tag(constants::ASN1_SET_TAG))
    }

    /// Value of the `messageDigest` authenticated attribute.
    fn parse_message_digest(&self) -> MacResult<Vec<u8>> {
        let auth_data = container::authenticated_data(self.container())?;
        let attrs = container::auth_attributes_field(&auth_data)?;
        let attr = container::find_attribute(&attrs, &constants::OID_MESSAGE_DIGEST, "authAttrs")?
            .ok_or_else(|| MacError::MacExtraction("messageDigest attribute missing".into()))?;
        let value = container::attribute_value(&attr, "messageDigest")?
            .expect_tag(constants::ASN1_OCTET_STRING_TAG, "messageDigest")?;
        Ok(value.value().to_vec())
    }

    fn parse_wrapped_key(&self) -> MacResult<Vec<u8>> {
        let auth_data = container::authenticated_data(self.container())?;
        let recipient = container::recipient_info_field(&auth_data)?;
        Ok(container::encrypted_key_field(&recipient)?.value().to_vec())
    }

    fn parse_key_wrap_algorithm_oid(&self) -> MacResult<ObjectIdentifier> {
        let auth_data = container::authenticated_data(self.container())?;
        let recipient = container::recipient_info_field(&auth_data)?;
        container::key_wrap_algorithm_field(&recipient)?.as_oid("keyEncryptionAlgorithm")
    }

    /// Key-derivation algorithm named in the password recipient info.
    fn parse_kdf_algorithm_oid(&self) -> MacResult<ObjectIdentifier> {
        let auth_data = container::authenticated_data(self.container())?;
        let recipient = container::recipient_info_field(&auth_data)?;
        container::kdf_algorithm_field(&recipient)?.as_oid("RecipientInfo.kdfAlgorithm")
    }

    fn parse_digest_algorithm_oid(&self) -> MacResult<ObjectIdentifier> {
        let auth_data = container::authenticated_data(self.container())?;
        container::digest_algorithm_field(&auth_data)?
            .child(container::field::ALGORITHM_OID, "digestAlgorithm")?
            .as_oid("digestAlgorithm")
    }

    fn parse_mac_algorithm_oid(&self) -> MacResult<ObjectIdentifier> {
        let auth_data = container::authenticated_data(self.container())?;
        container::mac_algorithm_field(&auth_data)?
            .child(container::field::ALGORITHM_OID, "macAlgorithm")?
            .as_oid("macAlgorithm")
    }

    /// Integrity info stored in the encapsulated content.
    fn parse_integrity_info(&self) -> MacResult<IntegrityInfo> {
        let auth_data = container::authenticated_data(self.container())?;
        IntegrityInfo::from_der(container::integrity_info_field(&auth_data)?)
    }

    fn parse_algorithm_protection(&self) -> MacResult<AlgorithmProtection> {
        let auth_data = container::authenticated_data(self.container())?;
        let attrs = container::auth_attributes_field(&auth_data)?;
        let attr = container::find_attribute(
            &attrs,
            &constants::OID_CMS_ALGORITHM_PROTECTION,
            "authAttrs",
        )?
        .ok_or_else(|| MacError::MacExtraction("cmsAlgorithmProtection attribute missing".into()))?;
        let value = container::attribute_value(&attr, "cmsAlgorithmProtection")?
            .expect_tag(constants::ASN1_SEQUENCE_TAG, "cmsAlgorithmProtection")?;
        let digest_algorithm = value
            .child(0, "cmsAlgorithmProtection.digestAlgorithm")?
            .child(container::field::ALGORITHM_OID, "cmsAlgorithmProtection.digestAlgorithm")?
            .as_oid("cmsAlgorithmProtection.digestAlgorithm")?;
        let mac_algorithm = value
            .child(1, "cmsAlgorithmProtection.macAlgorithm")?
            .expect_tag(
                constants::ASN1_CONTEXT_2_CONSTRUCTED,
                "cmsAlgorithmProtection.macAlgorithm",
            )?
            .child(container::field::ALGORITHM_OID, "cmsAlgorithmProtection.macAlgorithm")?
            .as_oid("cmsAlgorithmProtection.macAlgorithm")?;
        Ok(AlgorithmProtection {
            digest_algorithm,
            mac_algorithm,
        })
    }
}

/// Container stored directly in the `/AuthCode` dictionary.
#[derive(Debug, Clone)]
pub struct StandaloneMacReader {
    container: Vec<u8>,
    byte_range: ByteRange,
}

impl StandaloneMacReader {
    pub fn new(dictionary: &AuthDictionary) -> MacResult<Self> {
        let container = dictionary
            .container
            .clone()
            .ok_or(MacError::ContainerNotSpecified)?;
        let byte_range = dictionary.byte_range.ok_or(MacError::ByteRangeNotSpecified)?;
        log::debug!(
            "Standalone MAC container: {} bytes, byte range {}",
            container.len(),
            byte_range
        );
        Ok(Self {
            container,
            byte_range,
        })
    }
}

impl MacContainerReader for StandaloneMacReader {
    fn container(&self) -> &[u8] {
        &self.container
    }

    fn location(&self) -> MacLocation {
        MacLocation::Standalone
    }

    fn parse_byte_range(&self) -> ByteRange {
        self.byte_range
    }
}

/// Container carried as the `id-pdfMacData` unsigned attribute of a signature.
#[derive(Debug, Clone)]
pub struct SignatureMacReader {
    container: Vec<u8>,
    signature_value: Vec<u8>,
    byte_range: ByteRange,
}

impl SignatureMacReader {
    pub fn new(dictionary: &AuthDictionary, document: &dyn MacDocument) -> MacResult<Self> {
        let reference = dictionary
            .signature_reference
            .ok_or(MacError::SignatureReferenceMissing)?;
        let signature = document
            .signature_dictionary(reference)
            .ok_or_else(|| MacError::SignatureNotFound(reference.to_string()))?;

        let signer_info = SignerInfoView::first_of(&signature.contents)?;
        let container = signer_info.mac_container()?.to_vec();
        let signature_value = signer_info.signature_value()?.to_vec();
        log::debug!(
            "MAC container attached to signature {}: {} bytes (signed attributes present: {})",
            reference,
            container.len(),
            signer_info.has_signed_attributes()
        );
        Ok(Self {
            container,
            signature_value,
            byte_range: signature.byte_range,
        })
    }
}

impl MacContainerReader for SignatureMacReader {
    fn container(&self) -> &[u8] {
        &self.container
    }

    fn location(&self) -> MacLocation {
        MacLocation::AttachedToSignature
    }

    fn parse_byte_range(&self) -> ByteRange {
        self.byte_range
    }

    fn parse_associated_signature(&self) -> Option<&[u8]> {
        Some(&self.signature_value)
    }
}

/// Reader selected by the dictionary's `/MACLocation`.
pub fn reader_for(
    dictionary: &AuthDictionary,
    document: &dyn MacDocument,
) -> MacResult<Box<dyn MacContainerReader>> {
    Ok(match dictionary.location {
        MacLocation::Standalone => Box::new(StandaloneMacReader::new(dictionary)?),
        MacLocation::AttachedToSignature => {
            Box::new(SignatureMacReader::new(dictionary, document)?)
        }
    })
}

/// Positional view of the first `SignerInfo` in a CMS `SignedData` container.
///
/// ```text
/// SignerInfo { version, sid, digestAlgorithm, [0] signedAttrs OPTIONAL,
///              signatureAlgorithm, signature, [1] unsignedAttrs OPTIONAL }
/// ```
#[derive(Debug)]
pub struct SignerInfoView<'a> {
    fields: Vec<DerNode<'a>>,
    signed_attributes: bool,
}

/// Field positions when `signedAttrs` is absent; each shifts by one when present.
const SIGNER_INFO_SIGNATURE: usize = 4;
const SIGNER_INFO_UNSIGNED_ATTRS: usize = 5;
const SIGNER_INFO_SIGNED_ATTRS: usize = 3;

impl<'a> SignerInfoView<'a> {
    pub fn first_of(signature_container: &'a [u8]) -> MacResult<Self> {
        Self::from_node(first_signer_info(signature_container)?)
    }

    pub fn from_node(signer_info: DerNode<'a>) -> MacResult<Self> {
        let fields = signer_info.children("SignerInfo")?;
        let signed_attributes = fields
            .get(SIGNER_INFO_SIGNED_ATTRS)
            .is_some_and(|f| f.tag() == constants::ASN1_CONTEXT_0_CONSTRUCTED);
        Ok(Self {
            fields,
            signed_attributes,
        })
    }

    #[must_use]
    pub fn has_signed_attributes(&self) -> bool {
        self.signed_attributes
    }

    /// All fields in order.
    #[must_use]
    pub fn fields(&self) -> &[DerNode<'a>] {
        &self.fields
    }

    #[must_use]
    pub fn signature_index(&self) -> usize {
        SIGNER_INFO_SIGNATURE + usize::from(self.signed_attributes)
    }

    #[must_use]
    pub fn unsigned_attributes_index(&self) -> usize {
        SIGNER_INFO_UNSIGNED_ATTRS + usize::from(self.signed_attributes)
    }

    pub fn signature_value(&self) -> MacResult<&'a [u8]> {
        let field = self
            .fields
            .get(self.signature_index())
            .ok_or_else(|| MacError::MacExtraction("SignerInfo has no signature value".into()))?
            .expect_tag(constants::ASN1_OCTET_STRING_TAG, "SignerInfo.signature")?;
        Ok(field.value())
    }

    /// `[1] IMPLICIT SET OF Attribute`, if present.
    #[must_use]
    pub fn unsigned_attributes(&self) -> Option<DerNode<'a>> {
        self.fields
            .get(self.unsigned_attributes_index())
            .copied()
            .filter(|f| f.tag() == constants::ASN1_CONTEXT_1_CONSTRUCTED)
    }

    /// DER of the MAC container inside the `id-pdfMacData` unsigned attribute.
    pub fn mac_container(&self) -> MacResult<&'a [u8]> {
        let attrs = self
            .unsigned_attributes()
            .ok_or_else(|| MacError::MacExtraction("signature has no unsigned attributes".into()))?;
        let attr = container::find_attribute(&attrs, &constants::OID_PDF_MAC_DATA, "unsignedAttrs")?
            .ok_or_else(|| {
                MacError::MacExtraction("no pdfMacData attribute in unsigned attributes".into())
            })?;
        let value = container::attribute_value(&attr, "pdfMacData")?
            .expect_tag(constants::ASN1_SEQUENCE_TAG, "pdfMacData")?;
        Ok(value.encoded())
    }
}

/// `ContentInfo -> [0] SignedData -> signerInfos (last field) -> first SignerInfo`.
pub fn first_signer_info(signature_container: &[u8]) -> MacResult<DerNode<'_>> {
    let signer_infos = signed_data(signature_container)?
        .last_child("SignedData.signerInfos")?
        .expect_tag(constants::ASN1_SET_TAG, "SignedData.signerInfos")?;
    signer_infos
        .child(0, "SignedData.signerInfos")?
        .expect_tag(constants::ASN1_SEQUENCE_TAG, "SignerInfo")
}

/// `SignedData` sequence of a CMS signature `ContentInfo`.
pub fn signed_data(signature_container: &[u8]) -> MacResult<DerNode<'_>> {
    let content_info = DerNode::parse(signature_container, "signature ContentInfo")?
        .expect_tag(constants::ASN1_SEQUENCE_TAG, "signature ContentInfo")?;
    let content_type = content_info
        .child(container::field::CONTENT_INFO_TYPE, "signature ContentInfo")?
        .as_oid("signature ContentInfo.contentType")?;
    if content_type != constants::OID_SIGNED_DATA {
        return Err(MacError::MacExtraction(format!(
            "signature container is not SignedData ({content_type})"
        )));
    }
    content_info
        .child(container::field::CONTENT_INFO_CONTENT, "signature ContentInfo")?
        .expect_tag(constants::ASN1_CONTEXT_0_CONSTRUCTED, "signature ContentInfo")?
        .child(0, "SignedData")?
        .expect_tag(constants::ASN1_SEQUENCE_TAG, "SignedData")
}
