//! Known-answer checks with fixed key material: every value in the container
//! is recomputed independently with the primitive crates.

mod common;

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use pdf_mac::domain::constants;
use pdf_mac::services::key_wrap;
use pdf_mac::services::{MacContainerBuilder, MacContainerReader, StandaloneMacReader};
use pdf_mac::{AuthDictionary, ByteRange, KeyWrapAlgorithm, MacProperties};
use sha2::{Digest, Sha256};

const CONTENT: &[u8] = b"hello world";
const HELLO_WORLD_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

fn hello_world_reader() -> StandaloneMacReader {
    let kek = key_wrap::derive_wrap_key(&[0u8; 32], &[0u8; 32], constants::PDF_MAC_KDF_LABEL)
        .expect("kek");
    let digest = Sha256::digest(CONTENT).to_vec();
    let container = MacContainerBuilder::new(MacProperties::default())
        .build(&digest, &[0x42; 32], None, &kek[..])
        .expect("build");
    let range = ByteRange::around_placeholder(CONTENT.len() as u64, CONTENT.len() as u64, CONTENT.len() as u64)
        .expect("range");
    StandaloneMacReader::new(&AuthDictionary::standalone(container.into_der(), range))
        .expect("reader")
}

#[test]
fn wrap_key_matches_independent_hkdf() {
    let ours = key_wrap::derive_wrap_key(&[0u8; 32], &[0u8; 32], b"PDFMAC").expect("kek");
    let mut expected = [0u8; 32];
    Hkdf::<Sha256>::new(Some(&[0u8; 32]), &[0u8; 32])
        .expand(b"PDFMAC", &mut expected)
        .expect("expand");
    assert_eq!(&ours[..], &expected[..]);
}

#[test]
fn data_digest_is_sha256_of_content() {
    common::init_logging();
    let info = hello_world_reader().parse_integrity_info().expect("integrity info");
    assert_eq!(hex::encode(&info.data_digest), HELLO_WORLD_SHA256);
    assert!(info.signature_digest.is_none());
}

#[test]
fn message_digest_covers_integrity_info_der() {
    let reader = hello_world_reader();
    let info = reader.parse_integrity_info().expect("integrity info");
    let message_digest = reader.parse_message_digest().expect("message digest");
    assert_eq!(message_digest, Sha256::digest(info.to_der()).to_vec());
}

#[test]
fn mac_is_hmac_over_auth_attributes_under_unwrapped_key() {
    let reader = hello_world_reader();
    let kek = key_wrap::derive_wrap_key(&[0u8; 32], &[0u8; 32], constants::PDF_MAC_KDF_LABEL)
        .expect("kek");
    let auth_key = key_wrap::unwrap_key(
        KeyWrapAlgorithm::Aes256NoPadding,
        &reader.parse_wrapped_key().expect("wrapped key"),
        &kek[..],
    )
    .expect("unwrap");
    assert_eq!(&auth_key[..], &[0x42; 32]);

    let attrs = reader.parse_auth_attributes().expect("attrs");
    assert_eq!(attrs[0], constants::ASN1_SET_TAG, "MAC input uses the SET tag");
    let mut mac = Hmac::<Sha256>::new_from_slice(&auth_key).expect("hmac key");
    mac.update(&attrs);
    assert_eq!(
        reader.parse_mac().expect("mac"),
        mac.finalize().into_bytes().to_vec()
    );
}

#[test]
fn container_names_expected_algorithms() {
    let reader = hello_world_reader();
    assert_eq!(
        reader.parse_digest_algorithm_oid().expect("digest").to_string(),
        "2.16.840.1.101.3.4.2.1"
    );
    assert_eq!(
        reader.parse_mac_algorithm_oid().expect("mac").to_string(),
        "1.2.840.113549.2.9"
    );
    assert_eq!(
        reader.parse_key_wrap_algorithm_oid().expect("wrap").to_string(),
        "2.16.840.1.101.3.4.1.45"
    );
    assert_eq!(reader.parse_wrapped_key().expect("wrapped").len(), 40);
}
