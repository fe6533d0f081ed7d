//! Signature MAC embedder service.
//!
//! Adds a MAC container to the first `SignerInfo` of a CMS signature as the
//! `id-pdfMacData` unsigned attribute, re-encoding every enclosing length.

use crate::{
    domain::{
        asn1, constants,
        container::{field, MacContainer},
    },
    services::{
        container_builder::build_attribute,
        container_reader::{self, SignerInfoView},
    },
    MacError, MacResult,
};

pub struct SignatureMacEmbedder;

impl Default for SignatureMacEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureMacEmbedder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Signature value of the first signer; its digest binds the MAC to this signature.
    pub fn signature_value(signature_container: &[u8]) -> MacResult<Vec<u8>> {
        Ok(SignerInfoView::first_of(signature_container)?
            .signature_value()?
            .to_vec())
    }

    /// Return a copy of `signature_container` carrying `mac` in the unsigned
    /// attributes of its first signer. An existing `id-pdfMacData` attribute is replaced.
    pub fn embed(&self, signature_container: &[u8], mac: &MacContainer) -> MacResult<Vec<u8>> {
        let signed_data = container_reader::signed_data(signature_container)?;
        let signed_data_fields = signed_data.children("SignedData")?;
        let (signer_infos, leading_fields) = signed_data_fields
            .split_last()
            .ok_or_else(|| MacError::MacExtraction("empty SignedData".into()))?;
        let signers = signer_infos
            .expect_tag(constants::ASN1_SET_TAG, "SignedData.signerInfos")?
            .children("SignedData.signerInfos")?;
        let (first, other_signers) = signers
            .split_first()
            .ok_or_else(|| MacError::MacExtraction("signature has no SignerInfo".into()))?;

        let view =
            SignerInfoView::from_node(first.expect_tag(constants::ASN1_SEQUENCE_TAG, "SignerInfo")?)?;
        let mac_attribute = build_attribute(&constants::OID_PDF_MAC_DATA, mac.as_der());

        let mut fields: Vec<Vec<u8>> = view.fields().iter().map(|f| f.encoded().to_vec()).collect();
        match view.unsigned_attributes() {
            Some(existing) => {
                let mut attributes = Vec::new();
                for attr in existing.children("unsignedAttrs")? {
                    let attr_type = attr
                        .child(field::ATTRIBUTE_TYPE, "unsignedAttrs")?
                        .as_oid("unsignedAttrs")?;
                    if attr_type == constants::OID_PDF_MAC_DATA {
                        log::warn!("Replacing existing pdfMacData attribute");
                        continue;
                    }
                    attributes.push(attr.encoded().to_vec());
                }
                attributes.push(mac_attribute);
                fields[view.unsigned_attributes_index()] = asn1::tlv(
                    constants::ASN1_CONTEXT_1_CONSTRUCTED,
                    &asn1::set_of_contents(attributes),
                );
            }
            None => {
                if fields.len() != view.unsigned_attributes_index() {
                    return Err(MacError::MacExtraction(format!(
                        "unexpected SignerInfo shape: {} fields",
                        fields.len()
                    )));
                }
                fields.push(asn1::tlv(constants::ASN1_CONTEXT_1_CONSTRUCTED, &mac_attribute));
            }
        }

        // Re-encode bottom-up; signer order is preserved so the MAC stays on the first signer.
        let signer_info = asn1::tlv(constants::ASN1_SEQUENCE_TAG, &fields.concat());
        let mut signer_set = signer_info;
        for other in other_signers {
            signer_set.extend_from_slice(other.encoded());
        }
        let signer_infos = asn1::tlv(constants::ASN1_SET_TAG, &signer_set);

        let mut signed_data_body: Vec<u8> = leading_fields
            .iter()
            .flat_map(|f| f.encoded().iter().copied())
            .collect();
        signed_data_body.extend_from_slice(&signer_infos);
        let signed_data = asn1::tlv(constants::ASN1_SEQUENCE_TAG, &signed_data_body);

        let out = asn1::sequence(&[
            &asn1::oid(&constants::OID_SIGNED_DATA),
            &asn1::tlv(constants::ASN1_CONTEXT_0_CONSTRUCTED, &signed_data),
        ]);
        log::debug!(
            "Embedded {}-byte MAC container into signature ({} -> {} bytes, signed attributes present: {})",
            mac.len(),
            signature_container.len(),
            out.len(),
            view.has_signed_attributes()
        );
        Ok(out)
    }
}
