//! MAC containers attached to real CMS signatures produced by OpenSSL.

mod common;

use pdf_mac::services::SignerInfoView;
use pdf_mac::{
    AuthDictionary, ByteRange, InMemoryDocument, MacError, MacLocation, MacMismatch,
    MacProperties, MacProtector, ObjectRef, ProtectWorkflow, SignatureDictionary,
    VerifyWorkflow,
};

const SIGNATURE_REF: ObjectRef = ObjectRef {
    number: 4,
    generation: 0,
};
const CONTENTS_CAPACITY: usize = 8192;

struct SignedFixture {
    bytes: Vec<u8>,
    range: ByteRange,
    signature: Vec<u8>,
}

/// Document with the attached `/AuthCode` in its trailer and an unsigned slot.
fn signed_document(signed_attributes: bool) -> SignedFixture {
    let auth_dictionary = AuthDictionary::attached(SIGNATURE_REF).to_pdf_bytes();
    let (bytes, range) = common::document_with_signature_slot(CONTENTS_CAPACITY, &auth_dictionary);
    let signature = common::sign_detached(&common::covered_bytes(&bytes, &range), signed_attributes);
    SignedFixture {
        bytes,
        range,
        signature,
    }
}

fn finish(fixture: &SignedFixture, contents: &[u8]) -> InMemoryDocument {
    let mut bytes = fixture.bytes.clone();
    common::patch_contents(&mut bytes, &fixture.range, contents);
    InMemoryDocument::new(bytes).with_signature(
        SIGNATURE_REF,
        SignatureDictionary {
            byte_range: fixture.range,
            contents: contents.to_vec(),
        },
    )
}

fn attach_with_protector(fixture: &SignedFixture, salt: &[u8]) -> Vec<u8> {
    let mut protector =
        MacProtector::for_construction(MacProperties::default(), MacLocation::AttachedToSignature);
    protector.set_file_encryption_key(&common::FILE_KEY);
    protector.set_kdf_salt(salt).expect("salt");
    protector
        .set_signature_reference(SIGNATURE_REF)
        .expect("reference");

    let mut trailer = Vec::new();
    protector
        .before_final_serialization(&mut trailer)
        .expect("attached dictionary");
    assert_eq!(trailer, AuthDictionary::attached(SIGNATURE_REF).to_pdf_bytes());
    assert_eq!(
        protector
            .after_byte_stream_materialized(&mut trailer)
            .expect("no-op"),
        None
    );

    let segments = fixture.range.segments(&fixture.bytes).expect("segments");
    protector
        .embed_into_signature(&fixture.signature, &segments)
        .expect("embed")
}

#[test]
fn protector_flow_round_trips_with_and_without_signed_attributes() {
    common::init_logging();
    for signed_attributes in [true, false] {
        let fixture = signed_document(signed_attributes);
        assert_eq!(
            SignerInfoView::first_of(&fixture.signature)
                .expect("signer info")
                .has_signed_attributes(),
            signed_attributes
        );
        let salt = [0x24u8; 32];
        let contents = attach_with_protector(&fixture, &salt);
        let view = SignerInfoView::first_of(&contents).expect("signer info");
        assert!(view.mac_container().is_ok());

        let report = VerifyWorkflow::new()
            .run(&finish(&fixture, &contents), &common::FILE_KEY, &salt)
            .unwrap_or_else(|e| panic!("signed_attributes={signed_attributes}: {e}"));
        assert_eq!(report.location, MacLocation::AttachedToSignature);
        assert!(report.signature_bound);
        assert_eq!(report.byte_range, fixture.range);
    }
}

#[test]
fn workflow_attached_run_round_trips() {
    for signed_attributes in [true, false] {
        let fixture = signed_document(signed_attributes);
        let segments = fixture.range.segments(&fixture.bytes).expect("segments");
        let attached = ProtectWorkflow::default()
            .with_location(MacLocation::AttachedToSignature)
            .run_attached(
                &fixture.signature,
                &segments,
                SIGNATURE_REF,
                &common::FILE_KEY,
                None,
            )
            .expect("run attached");
        assert_eq!(
            attached.auth_dictionary,
            AuthDictionary::attached(SIGNATURE_REF).to_pdf_bytes()
        );
        VerifyWorkflow::new()
            .run(
                &finish(&fixture, &attached.signature_container),
                &common::FILE_KEY,
                &attached.kdf_salt,
            )
            .expect("verify");
    }
}

#[test]
fn standalone_workflow_refuses_attached_run() {
    let fixture = signed_document(false);
    let segments = fixture.range.segments(&fixture.bytes).expect("segments");
    let err = ProtectWorkflow::default()
        .run_attached(
            &fixture.signature,
            &segments,
            SIGNATURE_REF,
            &common::FILE_KEY,
            None,
        )
        .unwrap_err();
    assert!(matches!(err, MacError::ConfigurationError(_)), "{err}");
}

#[test]
fn reembedding_replaces_the_existing_container() {
    let fixture = signed_document(true);
    let salt = [0x31u8; 32];
    let once = attach_with_protector(&fixture, &salt);
    let twice = attach_with_protector(
        &SignedFixture {
            bytes: fixture.bytes.clone(),
            range: fixture.range,
            signature: once.clone(),
        },
        &salt,
    );
    let view = SignerInfoView::first_of(&twice).expect("signer info");
    let attrs = view.unsigned_attributes().expect("unsigned attrs");
    assert_eq!(attrs.children("unsignedAttrs").expect("attrs").len(), 1);
    VerifyWorkflow::new()
        .run(&finish(&fixture, &twice), &common::FILE_KEY, &salt)
        .expect("verify");
}

#[test]
fn tampered_signature_value_is_a_validation_failure() {
    let fixture = signed_document(false);
    let salt = [0x42u8; 32];
    let mut contents = attach_with_protector(&fixture, &salt);
    let offset = {
        let view = SignerInfoView::first_of(&contents).expect("signer info");
        let value = view.signature_value().expect("signature value");
        value.as_ptr() as usize - contents.as_ptr() as usize
    };
    contents[offset + 8] ^= 0xFF;

    let err = VerifyWorkflow::new()
        .run(&finish(&fixture, &contents), &common::FILE_KEY, &salt)
        .unwrap_err();
    assert!(
        matches!(err, MacError::ValidationFailed(MacMismatch::DocumentDigest)),
        "{err}"
    );
}

#[test]
fn tampered_signed_bytes_are_a_validation_failure() {
    let fixture = signed_document(true);
    let salt = [0x42u8; 32];
    let contents = attach_with_protector(&fixture, &salt);
    let mut document = finish(&fixture, &contents);
    // "/Count 1" becomes "/Count 2"
    let bytes = document.bytes_mut();
    let position = bytes
        .windows(8)
        .position(|w| w == b"/Count 1")
        .expect("page count");
    bytes[position + 7] = b'2';

    let err = VerifyWorkflow::new()
        .run(&document, &common::FILE_KEY, &salt)
        .unwrap_err();
    assert!(err.is_validation_failure(), "{err}");
}

#[test]
fn missing_signature_reference_is_a_precondition_error() {
    let mut protector =
        MacProtector::for_construction(MacProperties::default(), MacLocation::AttachedToSignature);
    protector.set_file_encryption_key(&common::FILE_KEY);
    let mut trailer = Vec::new();
    let err = protector
        .before_final_serialization(&mut trailer)
        .unwrap_err();
    assert!(matches!(err, MacError::SignatureReferenceMissing));
    assert!(!err.is_validation_failure());
    assert!(trailer.is_empty());
}

#[test]
fn unresolvable_signature_reference_is_reported() {
    let fixture = signed_document(true);
    let salt = [0x42u8; 32];
    let contents = attach_with_protector(&fixture, &salt);
    let mut bytes = fixture.bytes.clone();
    common::patch_contents(&mut bytes, &fixture.range, &contents);
    // Signature dictionary not registered with the document model
    let err = VerifyWorkflow::new()
        .run(&InMemoryDocument::new(bytes), &common::FILE_KEY, &salt)
        .unwrap_err();
    assert!(matches!(err, MacError::SignatureNotFound(_)), "{err}");
}
