//! Immutable algorithm selection for one protection session.

use crate::domain::algorithms::{KeyWrapAlgorithm, MacAlgorithm, MacDigestAlgorithm};

/// Algorithms used to build a MAC container.
///
/// Created once per protection session and never mutated; the same values are
/// recovered from the container's algorithm identifiers during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacProperties {
    digest_algorithm: MacDigestAlgorithm,
    mac_algorithm: MacAlgorithm,
    key_wrap_algorithm: KeyWrapAlgorithm,
}

impl MacProperties {
    #[must_use]
    pub fn new(
        digest_algorithm: MacDigestAlgorithm,
        mac_algorithm: MacAlgorithm,
        key_wrap_algorithm: KeyWrapAlgorithm,
    ) -> Self {
        Self {
            digest_algorithm,
            mac_algorithm,
            key_wrap_algorithm,
        }
    }

    /// Default MAC and wrap algorithms with the given digest.
    #[must_use]
    pub fn with_digest(digest_algorithm: MacDigestAlgorithm) -> Self {
        Self::new(
            digest_algorithm,
            MacAlgorithm::HmacSha256,
            KeyWrapAlgorithm::Aes256NoPadding,
        )
    }

    #[must_use]
    pub fn digest_algorithm(&self) -> MacDigestAlgorithm {
        self.digest_algorithm
    }
    #[must_use]
    pub fn mac_algorithm(&self) -> MacAlgorithm {
        self.mac_algorithm
    }
    #[must_use]
    pub fn key_wrap_algorithm(&self) -> KeyWrapAlgorithm {
        self.key_wrap_algorithm
    }
}

impl Default for MacProperties {
    fn default() -> Self {
        Self::with_digest(MacDigestAlgorithm::Sha256)
    }
}
