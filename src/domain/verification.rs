//! Verification domain types for MAC-protected documents.
//!
//! A report is only produced when every check passed; any mismatch surfaces
//! as `MacError::ValidationFailed` instead, so callers can tell "checked and
//! failed" apart from "could not be checked".

use crate::domain::{
    algorithms::{KeyWrapAlgorithm, MacAlgorithm, MacDigestAlgorithm},
    byte_range::ByteRange,
    document::MacLocation,
};

/// Summary of a successful MAC validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacVerificationReport {
    pub location: MacLocation,
    /// Range recomputed over the document.
    pub byte_range: ByteRange,
    pub digest_algorithm: MacDigestAlgorithm,
    pub mac_algorithm: MacAlgorithm,
    pub key_wrap_algorithm: KeyWrapAlgorithm,
    /// True when the MAC also vouches for a signature value.
    pub signature_bound: bool,
}

impl MacVerificationReport {
    /// Number of document bytes the MAC covers.
    #[must_use]
    pub fn protected_len(&self) -> u64 {
        let [_, first, _, second] = self.byte_range.values();
        first + second
    }
}
