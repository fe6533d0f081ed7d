//! Shared fixtures for integration tests.

#![allow(dead_code)]

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::cms::{CMSOptions, CmsContentInfo};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::x509::{X509NameBuilder, X509};
use pdf_mac::ByteRange;

pub const FILE_KEY: [u8; 32] = [0x5A; 32];

pub fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

/// A small but structurally plausible document body.
pub fn sample_body() -> Vec<u8> {
    b"%PDF-2.0\n\
1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n\
3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>\nendobj\n"
        .to_vec()
}

/// Self-signed P-256 certificate and key.
pub fn test_signer() -> (X509, PKey<Private>) {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).expect("curve");
    let key = PKey::from_ec_key(EcKey::generate(&group).expect("ec key")).expect("pkey");

    let mut name = X509NameBuilder::new().expect("name builder");
    name.append_entry_by_nid(Nid::COMMONNAME, "pdf-mac test signer")
        .expect("cn");
    let name = name.build();

    let mut builder = X509::builder().expect("x509 builder");
    builder.set_version(2).expect("version");
    let serial = BigNum::from_u32(1)
        .and_then(|n| n.to_asn1_integer())
        .expect("serial");
    builder.set_serial_number(&serial).expect("serial");
    builder.set_subject_name(&name).expect("subject");
    builder.set_issuer_name(&name).expect("issuer");
    builder.set_pubkey(&key).expect("pubkey");
    builder
        .set_not_before(&Asn1Time::days_from_now(0).expect("time"))
        .expect("not before");
    builder
        .set_not_after(&Asn1Time::days_from_now(1).expect("time"))
        .expect("not after");
    builder.sign(&key, MessageDigest::sha256()).expect("self-sign");
    (builder.build(), key)
}

/// Detached CMS `SignedData` over `data`, with or without signed attributes.
pub fn sign_detached(data: &[u8], signed_attributes: bool) -> Vec<u8> {
    let (cert, key) = test_signer();
    let mut flags = CMSOptions::DETACHED | CMSOptions::BINARY;
    if !signed_attributes {
        flags |= CMSOptions::NOATTR;
    }
    CmsContentInfo::sign(Some(&*cert), Some(&*key), None, Some(data), flags)
        .and_then(|cms| cms.to_der())
        .expect("cms sign")
}

/// Document with a signature `/Contents` placeholder of `contents_capacity`
/// bytes, followed by `trailer`. Returns the bytes and the signature byte range.
pub fn document_with_signature_slot(
    contents_capacity: usize,
    trailer: &[u8],
) -> (Vec<u8>, ByteRange) {
    let mut doc = sample_body();
    doc.extend_from_slice(b"4 0 obj\n<< /Type /Sig /Filter /Adobe.PPKLite /Contents ");
    let start = doc.len();
    doc.push(b'<');
    doc.extend(std::iter::repeat(b'0').take(contents_capacity * 2));
    doc.push(b'>');
    let end = doc.len();
    doc.extend_from_slice(b" >>\nendobj\ntrailer\n<< /Size 5 /Root 1 0 R ");
    doc.extend_from_slice(trailer);
    doc.extend_from_slice(b" >>\n%%EOF\n");
    let range =
        ByteRange::around_placeholder(start as u64, end as u64, doc.len() as u64).expect("range");
    (doc, range)
}

/// Hex-patch `contents` into the `/Contents` placeholder described by `range`.
pub fn patch_contents(doc: &mut [u8], range: &ByteRange, contents: &[u8]) {
    let start = range.gap_start() as usize + 1;
    let encoded = hex::encode(contents);
    assert!(start + encoded.len() < range.gap_end() as usize, "contents overflow");
    doc[start..start + encoded.len()].copy_from_slice(encoded.as_bytes());
}

/// Concatenation of both byte-range segments.
pub fn covered_bytes(doc: &[u8], range: &ByteRange) -> Vec<u8> {
    range.segments(doc).expect("segments").concat()
}
