//! Centralized constants for DER tags, object identifiers and placeholder geometry.
//! Keep this intentionally small; only broadly reused literals should live here.

use der::asn1::ObjectIdentifier;

// === ASN.1 DER Constants ===

/// ASN.1 INTEGER tag
pub const ASN1_INTEGER_TAG: u8 = 0x02;

/// ASN.1 OCTET STRING tag
pub const ASN1_OCTET_STRING_TAG: u8 = 0x04;

/// ASN.1 NULL value (tag + length + null)
pub const ASN1_NULL: &[u8] = &[0x05, 0x00];

/// ASN.1 OBJECT IDENTIFIER tag
pub const ASN1_OID_TAG: u8 = 0x06;

/// ASN.1 SEQUENCE tag
pub const ASN1_SEQUENCE_TAG: u8 = 0x30;

/// ASN.1 SET tag
pub const ASN1_SET_TAG: u8 = 0x31;

/// Context-specific constructed [0]
pub const ASN1_CONTEXT_0_CONSTRUCTED: u8 = 0xA0;

/// Context-specific constructed [1]
pub const ASN1_CONTEXT_1_CONSTRUCTED: u8 = 0xA1;

/// Context-specific constructed [2]
pub const ASN1_CONTEXT_2_CONSTRUCTED: u8 = 0xA2;

/// Context-specific constructed [3] (`PasswordRecipientInfo` choice)
pub const ASN1_CONTEXT_3_CONSTRUCTED: u8 = 0xA3;

/// Context-specific primitive [0]
pub const ASN1_CONTEXT_0_PRIMITIVE: u8 = 0x80;

/// DER long form length encoding: 1-byte length follows
pub const DER_LONG_FORM_1_BYTE: u8 = 0x81;

/// DER long form length encoding: 2-byte length follows
pub const DER_LONG_FORM_2_BYTE: u8 = 0x82;

/// DER long form length encoding: 3-byte length follows
pub const DER_LONG_FORM_3_BYTE: u8 = 0x83;

/// DER long form length encoding: 4-byte length follows
pub const DER_LONG_FORM_4_BYTE: u8 = 0x84;

// === CMS / PKCS#9 OIDs ===

/// id-ct-authData (RFC 5652 AuthenticatedData content type)
pub const OID_AUTHENTICATED_DATA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.1.2");

/// PKCS#7 `SignedData` content type
pub const OID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");

/// PKCS#7 data content type
pub const OID_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");

/// PKCS#9 contentType attribute
pub const OID_CONTENT_TYPE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.3");

/// PKCS#9 messageDigest attribute
pub const OID_MESSAGE_DIGEST: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.4");

/// id-aa-CMSAlgorithmProtection (RFC 6211)
pub const OID_CMS_ALGORITHM_PROTECTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.52");

// === PDF MAC OIDs (ISO/TS 32004) ===

/// id-pdfMacIntegrityInfo: encapsulated content type of the MAC container
pub const OID_PDF_MAC_INTEGRITY_INFO: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.0.32004.1.0");

/// id-kdf-pdfMacWrapKey: key derivation algorithm recorded in the recipient info
pub const OID_KDF_PDF_MAC_WRAP_KEY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.0.32004.1.1");

/// id-pdfMacData: unsigned signature attribute carrying the MAC container
pub const OID_PDF_MAC_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.0.32004.1.2");

// === Versions ===

/// Version used by `AuthenticatedData`, `PasswordRecipientInfo` and `PdfMacIntegrityInfo`
pub const VERSION_0: &[u8] = &[0x02, 0x01, 0x00];

// === Key material ===

/// Length of the per-container authentication (MAC) key
pub const MAC_KEY_LENGTH: usize = 32;

/// Length of the derived key-encryption key (AES-256)
pub const WRAP_KEY_LENGTH: usize = 32;

/// Length of the KDF salt stored alongside the document encryption data
pub const KDF_SALT_LENGTH: usize = 32;

/// RFC 3394 adds one 64-bit integrity block to the wrapped key
pub const KEY_WRAP_OVERHEAD: usize = 8;

/// HKDF info label for the key-encryption key
pub const PDF_MAC_KDF_LABEL: &[u8] = b"PDFMAC";

// === Placeholder geometry ===

/// Width reserved for the `/ByteRange` array text
pub const BYTE_RANGE_PLACEHOLDER_WIDTH: usize = 80;

/// Hex string delimiters `<` and `>`
pub const HEX_DELIMITER_BYTES: usize = 2;

// === AuthCode dictionary keys ===

pub const AUTH_CODE_KEY: &str = "/AuthCode";
pub const MAC_KEY: &str = "/MAC";
pub const BYTE_RANGE_KEY: &str = "/ByteRange";
pub const MAC_LOCATION_KEY: &str = "/MACLocation";
pub const SIG_OBJ_REF_KEY: &str = "/SigObjRef";
pub const MAC_LOCATION_STANDALONE: &str = "/Standalone";
pub const MAC_LOCATION_ATTACHED: &str = "/AttachedToSig";
