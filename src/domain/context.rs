//! Per-document key material for MAC protection.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::{domain::constants::KDF_SALT_LENGTH, MacError, MacResult};

/// Mutable key state owned by one protector for one document.
///
/// `file_encryption_key` may be empty for documents without payload
/// encryption. The KDF salt is generated on first use and stable afterwards.
#[derive(Default, Clone)]
pub struct ProtectionContext {
    file_encryption_key: Vec<u8>,
    kdf_salt: Option<Vec<u8>>,
}

impl ProtectionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_file_encryption_key(&mut self, key: &[u8]) {
        self.file_encryption_key.zeroize();
        self.file_encryption_key = key.to_vec();
    }

    #[must_use]
    pub fn file_encryption_key(&self) -> &[u8] {
        &self.file_encryption_key
    }

    /// Salt for the key-encryption-key derivation, generated lazily.
    pub fn kdf_salt(&mut self) -> &[u8] {
        self.kdf_salt.get_or_insert_with(|| {
            let mut salt = vec![0u8; KDF_SALT_LENGTH];
            OsRng.fill_bytes(&mut salt);
            log::debug!("Generated {KDF_SALT_LENGTH}-byte KDF salt");
            salt
        })
    }

    /// Salt only if one was generated or supplied; validation never invents one.
    #[must_use]
    pub fn existing_kdf_salt(&self) -> Option<&[u8]> {
        self.kdf_salt.as_deref()
    }

    /// Supply the salt recorded at protection time; it must be exactly
    /// [`KDF_SALT_LENGTH`] bytes.
    pub fn set_kdf_salt(&mut self, salt: &[u8]) -> MacResult<()> {
        if salt.len() != KDF_SALT_LENGTH {
            return Err(MacError::InvalidKey(format!(
                "KDF salt must be {KDF_SALT_LENGTH} bytes, got {}",
                salt.len()
            )));
        }
        self.kdf_salt = Some(salt.to_vec());
        Ok(())
    }
}

impl Drop for ProtectionContext {
    fn drop(&mut self) {
        self.file_encryption_key.zeroize();
    }
}

impl fmt::Debug for ProtectionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtectionContext")
            .field("file_encryption_key", &"[REDACTED]")
            .field("kdf_salt_len", &self.kdf_salt.as_ref().map(Vec::len))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salt_is_lazy_and_stable() {
        let mut ctx = ProtectionContext::new();
        assert!(ctx.existing_kdf_salt().is_none());
        let first = ctx.kdf_salt().to_vec();
        assert_eq!(first.len(), KDF_SALT_LENGTH);
        assert_eq!(ctx.kdf_salt(), first.as_slice());
        assert_eq!(ctx.existing_kdf_salt(), Some(first.as_slice()));
    }

    #[test]
    fn explicit_salt_wins() {
        let mut ctx = ProtectionContext::new();
        ctx.set_kdf_salt(&[9u8; 32]).unwrap();
        assert_eq!(ctx.kdf_salt(), &[9u8; 32]);
    }

    #[test]
    fn salt_of_wrong_length_is_rejected() {
        let mut ctx = ProtectionContext::new();
        for len in [0, 16, KDF_SALT_LENGTH - 1, KDF_SALT_LENGTH + 1, 64] {
            let err = ctx.set_kdf_salt(&vec![7u8; len]).unwrap_err();
            assert!(matches!(err, MacError::InvalidKey(_)), "{len}: {err}");
        }
        assert!(ctx.existing_kdf_salt().is_none());
        ctx.set_kdf_salt(&[7u8; KDF_SALT_LENGTH]).unwrap();
        assert_eq!(ctx.existing_kdf_salt(), Some(&[7u8; KDF_SALT_LENGTH][..]));
    }

    #[test]
    fn debug_redacts_key() {
        let mut ctx = ProtectionContext::new();
        ctx.set_file_encryption_key(&[0x41; 32]);
        let rendered = format!("{ctx:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("65"));
    }
}
