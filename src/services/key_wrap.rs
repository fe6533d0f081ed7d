//! Key derivation and wrapping for the per-container authentication key.
//!
//! The key-encryption key is derived with HKDF-SHA-256 from the document's
//! file encryption key and KDF salt, domain-separated by the `PDFMAC` label.
//! The random authentication key is wrapped with RFC 3394 AES key wrap
//! (OpenSSL), which is deterministic for a given key pair.

use hkdf::Hkdf;
use openssl::aes::{self, AesKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::domain::algorithms::KeyWrapAlgorithm;
use crate::domain::constants::{KEY_WRAP_OVERHEAD, MAC_KEY_LENGTH, WRAP_KEY_LENGTH};
use crate::infra::error::{MacError, MacMismatch, MacResult};

/// Derive the key-encryption key. An empty `file_encryption_key` is valid.
pub fn derive_wrap_key(
    file_encryption_key: &[u8],
    salt: &[u8],
    label: &[u8],
) -> MacResult<Zeroizing<[u8; WRAP_KEY_LENGTH]>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), file_encryption_key);
    let mut okm = Zeroizing::new([0u8; WRAP_KEY_LENGTH]);
    hk.expand(label, &mut okm[..])
        .map_err(|e| MacError::InvalidKey(format!("HKDF expand failed: {e}")))?;
    Ok(okm)
}

/// Fresh random authentication key from the OS CSPRNG.
#[must_use]
pub fn generate_mac_key() -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(vec![0u8; MAC_KEY_LENGTH]);
    OsRng.fill_bytes(&mut key[..]);
    key
}

/// Wrap `auth_key` (exactly 32 bytes) under `kek`.
pub fn wrap_key(algorithm: KeyWrapAlgorithm, auth_key: &[u8], kek: &[u8]) -> MacResult<Vec<u8>> {
    check_kek(algorithm, kek)?;
    if auth_key.len() != MAC_KEY_LENGTH {
        return Err(MacError::InvalidKey(format!(
            "authentication key must be {MAC_KEY_LENGTH} bytes, got {}",
            auth_key.len()
        )));
    }
    let key = AesKey::new_encrypt(kek)
        .map_err(|_| MacError::InvalidKey("AES key-encryption key rejected".into()))?;
    let mut out = vec![0u8; auth_key.len() + KEY_WRAP_OVERHEAD];
    let written = aes::wrap_key(&key, None, &mut out, auth_key)
        .map_err(|_| MacError::InvalidKey("AES key wrap failed".into()))?;
    out.truncate(written);
    Ok(out)
}

/// Unwrap a wrapped authentication key. An integrity-check failure means the
/// key-encryption key (file key or salt) does not match the one used to wrap.
pub fn unwrap_key(
    algorithm: KeyWrapAlgorithm,
    wrapped: &[u8],
    kek: &[u8],
) -> MacResult<Zeroizing<Vec<u8>>> {
    check_kek(algorithm, kek)?;
    if wrapped.len() != MAC_KEY_LENGTH + KEY_WRAP_OVERHEAD {
        return Err(MacError::InvalidKey(format!(
            "wrapped key must be {} bytes, got {}",
            MAC_KEY_LENGTH + KEY_WRAP_OVERHEAD,
            wrapped.len()
        )));
    }
    let key = AesKey::new_decrypt(kek)
        .map_err(|_| MacError::InvalidKey("AES key-encryption key rejected".into()))?;
    let mut out = Zeroizing::new(vec![0u8; wrapped.len() - KEY_WRAP_OVERHEAD]);
    let written = aes::unwrap_key(&key, None, &mut out[..], wrapped)
        .map_err(|_| MacError::ValidationFailed(MacMismatch::KeyUnwrap))?;
    out.truncate(written);
    Ok(out)
}

fn check_kek(algorithm: KeyWrapAlgorithm, kek: &[u8]) -> MacResult<()> {
    if kek.len() != algorithm.kek_size() {
        return Err(MacError::InvalidKey(format!(
            "{algorithm} requires a {}-byte key-encryption key, got {}",
            algorithm.kek_size(),
            kek.len()
        )));
    }
    Ok(())
}
