//! Algorithm registry: the closed sets of digest, MAC and key-wrap algorithms
//! a MAC container may use, their object identifiers, and primitive dispatch.

use std::fmt;
use std::str::FromStr;

use der::asn1::ObjectIdentifier;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha384, Sha512};
use sha3::{Sha3_256, Sha3_384, Sha3_512};
use subtle::ConstantTimeEq;

use crate::infra::error::{MacError, MacResult};

const OID_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");
const OID_SHA384: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.2");
const OID_SHA512: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.3");
const OID_SHA3_256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.8");
const OID_SHA3_384: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.9");
const OID_SHA3_512: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.10");
const OID_HMAC_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.2.9");
const OID_AES256_WRAP: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.1.45");

type HmacSha256 = Hmac<Sha256>;

/// Digest algorithms allowed for the protected byte range and integrity info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacDigestAlgorithm {
    Sha256,
    Sha384,
    Sha512,
    Sha3_256,
    Sha3_384,
    Sha3_512,
}

impl MacDigestAlgorithm {
    pub const ALL: [MacDigestAlgorithm; 6] = [
        MacDigestAlgorithm::Sha256,
        MacDigestAlgorithm::Sha384,
        MacDigestAlgorithm::Sha512,
        MacDigestAlgorithm::Sha3_256,
        MacDigestAlgorithm::Sha3_384,
        MacDigestAlgorithm::Sha3_512,
    ];

    #[must_use]
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            MacDigestAlgorithm::Sha256 => OID_SHA256,
            MacDigestAlgorithm::Sha384 => OID_SHA384,
            MacDigestAlgorithm::Sha512 => OID_SHA512,
            MacDigestAlgorithm::Sha3_256 => OID_SHA3_256,
            MacDigestAlgorithm::Sha3_384 => OID_SHA3_384,
            MacDigestAlgorithm::Sha3_512 => OID_SHA3_512,
        }
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> MacResult<Self> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.oid() == *oid)
            .ok_or_else(|| MacError::DigestNotSupported(oid.to_string()))
    }

    /// Lookup by dotted-decimal string as returned by container readers.
    pub fn from_oid_str(oid: &str) -> MacResult<Self> {
        let parsed = ObjectIdentifier::new(oid)
            .map_err(|_| MacError::DigestNotSupported(oid.to_string()))?;
        Self::from_oid(&parsed)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MacDigestAlgorithm::Sha256 => "sha256",
            MacDigestAlgorithm::Sha384 => "sha384",
            MacDigestAlgorithm::Sha512 => "sha512",
            MacDigestAlgorithm::Sha3_256 => "sha3-256",
            MacDigestAlgorithm::Sha3_384 => "sha3-384",
            MacDigestAlgorithm::Sha3_512 => "sha3-512",
        }
    }

    #[must_use]
    pub fn digest_size(&self) -> usize {
        match self {
            MacDigestAlgorithm::Sha256 | MacDigestAlgorithm::Sha3_256 => 32,
            MacDigestAlgorithm::Sha384 | MacDigestAlgorithm::Sha3_384 => 48,
            MacDigestAlgorithm::Sha512 | MacDigestAlgorithm::Sha3_512 => 64,
        }
    }

    /// Digest `data` in one pass.
    #[must_use]
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            MacDigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            MacDigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            MacDigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
            MacDigestAlgorithm::Sha3_256 => Sha3_256::digest(data).to_vec(),
            MacDigestAlgorithm::Sha3_384 => Sha3_384::digest(data).to_vec(),
            MacDigestAlgorithm::Sha3_512 => Sha3_512::digest(data).to_vec(),
        }
    }

    /// Digest several discontiguous slices as one message (byte-range digests).
    #[must_use]
    pub fn digest_parts(&self, parts: &[&[u8]]) -> Vec<u8> {
        fn run<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
            let mut hasher = D::new();
            for part in parts {
                Digest::update(&mut hasher, part);
            }
            hasher.finalize().to_vec()
        }
        match self {
            MacDigestAlgorithm::Sha256 => run::<Sha256>(parts),
            MacDigestAlgorithm::Sha384 => run::<Sha384>(parts),
            MacDigestAlgorithm::Sha512 => run::<Sha512>(parts),
            MacDigestAlgorithm::Sha3_256 => run::<Sha3_256>(parts),
            MacDigestAlgorithm::Sha3_384 => run::<Sha3_384>(parts),
            MacDigestAlgorithm::Sha3_512 => run::<Sha3_512>(parts),
        }
    }
}

impl FromStr for MacDigestAlgorithm {
    type Err = MacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|alg| alg.as_str() == normalized || alg.as_str().replace('-', "") == normalized)
            .ok_or_else(|| MacError::DigestNotSupported(s.to_string()))
    }
}

impl fmt::Display for MacDigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MAC algorithms applied over the authenticated attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacAlgorithm {
    HmacSha256,
}

impl MacAlgorithm {
    pub const ALL: [MacAlgorithm; 1] = [MacAlgorithm::HmacSha256];

    #[must_use]
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            MacAlgorithm::HmacSha256 => OID_HMAC_SHA256,
        }
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> MacResult<Self> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.oid() == *oid)
            .ok_or_else(|| MacError::MacAlgorithmNotSupported(oid.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MacAlgorithm::HmacSha256 => "hmac-sha256",
        }
    }

    #[must_use]
    pub fn mac_size(&self) -> usize {
        match self {
            MacAlgorithm::HmacSha256 => 32,
        }
    }

    pub fn compute(&self, key: &[u8], data: &[u8]) -> MacResult<Vec<u8>> {
        match self {
            MacAlgorithm::HmacSha256 => {
                let mut mac = HmacSha256::new_from_slice(key)
                    .map_err(|e| MacError::InvalidKey(format!("HMAC key rejected: {e}")))?;
                mac.update(data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
        }
    }

    /// Recompute and compare in constant time.
    pub fn verify(&self, key: &[u8], data: &[u8], expected: &[u8]) -> MacResult<bool> {
        let computed = self.compute(key, data)?;
        Ok(computed.len() == expected.len() && bool::from(computed.ct_eq(expected)))
    }
}

impl FromStr for MacAlgorithm {
    type Err = MacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hmac-sha256" | "hmacsha256" | "hmac_sha256" | "hmac-sha-256" => {
                Ok(MacAlgorithm::HmacSha256)
            }
            _ => Err(MacError::MacAlgorithmNotSupported(s.to_string())),
        }
    }
}

impl fmt::Display for MacAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key wrapping algorithms for the per-container authentication key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyWrapAlgorithm {
    /// RFC 3394 AES-256 key wrap, no padding
    Aes256NoPadding,
}

impl KeyWrapAlgorithm {
    pub const ALL: [KeyWrapAlgorithm; 1] = [KeyWrapAlgorithm::Aes256NoPadding];

    #[must_use]
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            KeyWrapAlgorithm::Aes256NoPadding => OID_AES256_WRAP,
        }
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> MacResult<Self> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.oid() == *oid)
            .ok_or_else(|| MacError::WrapAlgorithmNotSupported(oid.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyWrapAlgorithm::Aes256NoPadding => "aes256-wrap",
        }
    }

    /// Required key-encryption key length.
    #[must_use]
    pub fn kek_size(&self) -> usize {
        match self {
            KeyWrapAlgorithm::Aes256NoPadding => 32,
        }
    }
}

impl FromStr for KeyWrapAlgorithm {
    type Err = MacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes256-wrap" | "aes-256-wrap" | "aes256_no_padd" | "aes256-no-padding" => {
                Ok(KeyWrapAlgorithm::Aes256NoPadding)
            }
            _ => Err(MacError::WrapAlgorithmNotSupported(s.to_string())),
        }
    }
}

impl fmt::Display for KeyWrapAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_oid_lookup_is_bidirectional() {
        for alg in MacDigestAlgorithm::ALL {
            assert_eq!(MacDigestAlgorithm::from_oid(&alg.oid()).unwrap(), alg);
            assert_eq!(
                MacDigestAlgorithm::from_oid_str(&alg.oid().to_string()).unwrap(),
                alg
            );
            assert_eq!(alg.digest(b"abc").len(), alg.digest_size());
        }
    }

    #[test]
    fn unknown_oids_are_rejected_per_family() {
        let md5 = ObjectIdentifier::new_unwrap("1.2.840.113549.2.5");
        assert!(matches!(
            MacDigestAlgorithm::from_oid(&md5),
            Err(MacError::DigestNotSupported(_))
        ));
        assert!(matches!(
            MacAlgorithm::from_oid(&md5),
            Err(MacError::MacAlgorithmNotSupported(_))
        ));
        assert!(matches!(
            KeyWrapAlgorithm::from_oid(&md5),
            Err(MacError::WrapAlgorithmNotSupported(_))
        ));
    }

    #[test]
    fn digest_parts_matches_single_pass() {
        for alg in MacDigestAlgorithm::ALL {
            assert_eq!(
                alg.digest_parts(&[b"hello ", b"world"]),
                alg.digest(b"hello world")
            );
        }
    }

    #[test]
    fn sha256_known_answer() {
        assert_eq!(
            hex::encode(MacDigestAlgorithm::Sha256.digest(b"hello world")),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn names_parse() {
        assert_eq!(
            "SHA3-384".parse::<MacDigestAlgorithm>().unwrap(),
            MacDigestAlgorithm::Sha3_384
        );
        assert_eq!(
            "sha512".parse::<MacDigestAlgorithm>().unwrap(),
            MacDigestAlgorithm::Sha512
        );
        assert!("md5".parse::<MacDigestAlgorithm>().is_err());
        assert_eq!(
            "hmac-sha256".parse::<MacAlgorithm>().unwrap(),
            MacAlgorithm::HmacSha256
        );
        assert_eq!(
            "aes256-wrap".parse::<KeyWrapAlgorithm>().unwrap(),
            KeyWrapAlgorithm::Aes256NoPadding
        );
    }

    #[test]
    fn hmac_verify_detects_change() {
        let mac = MacAlgorithm::HmacSha256;
        let tag = mac.compute(&[7u8; 32], b"attrs").unwrap();
        assert!(mac.verify(&[7u8; 32], b"attrs", &tag).unwrap());
        assert!(!mac.verify(&[7u8; 32], b"attrz", &tag).unwrap());
        assert!(!mac.verify(&[7u8; 32], b"attrs", &tag[..16]).unwrap());
    }
}
