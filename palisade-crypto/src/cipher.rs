//! AES-256-GCM field cipher with per-tenant key derivation.

use crate::envelope::{self, IV_LEN, KEY_LEN, SALT_LEN, TAG_LEN};
use crate::error::{CryptoError, Result};
use crate::secret::MasterSecret;
use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

/// AES-256-GCM instantiated with the envelope's 16-byte IV width.
type FieldAead = AesGcm<Aes256, U16>;

/// PBKDF2-HMAC-SHA256 rounds for tenant key derivation.
const PBKDF2_ROUNDS: u32 = 100_000;

/// Separator between master secret and tenant id in the KDF input.
const KDF_INPUT_SEPARATOR: u8 = 0x1f;

/// Symmetric cipher for sensitive scalar field values.
///
/// Each [`encrypt`](Self::encrypt) call derives a fresh 256-bit key via
/// PBKDF2-HMAC-SHA256 over the master secret and tenant id, salted with a
/// fresh random 64-byte value that travels in the envelope. Together with
/// the random IV this makes encryption non-deterministic: encrypting the
/// same plaintext twice yields two distinct envelopes, so ciphertext
/// cannot serve as an equality-searchable index.
///
/// The per-value salt (rather than the tenant id) is the KDF salt on
/// purpose: a fixed per-tenant salt would be reused across every value of
/// that tenant.
///
/// The cipher is stateless apart from the master secret and takes no
/// locks; derivation and the AEAD are CPU-bound work safe to run from any
/// thread.
pub struct FieldCipher {
    master: MasterSecret,
}

impl FieldCipher {
    /// Create a cipher over a master secret.
    pub fn new(master: MasterSecret) -> Self {
        Self { master }
    }

    /// Create a cipher from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::MissingSecret` when no secret is configured;
    /// callers are expected to fail startup on this.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(MasterSecret::from_env()?))
    }

    /// Encrypt a plaintext value for a tenant.
    ///
    /// Returns the `enc:`-prefixed envelope string.
    pub fn encrypt(&self, plaintext: &str, tenant_id: &str) -> Result<String> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let mut key = self.derive_key(tenant_id, &salt);
        let cipher = FieldAead::new_from_slice(&key)
            .map_err(|_| CryptoError::encrypt_failed("invalid derived key length"))?;
        key.zeroize();

        let nonce = Nonce::<U16>::from_slice(&iv);
        let mut sealed = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::encrypt_failed("AEAD encryption failure"))?;

        // The AEAD appends the tag to the ciphertext; the envelope stores
        // the tag before the ciphertext.
        if sealed.len() < TAG_LEN {
            return Err(CryptoError::encrypt_failed("sealed output too short"));
        }
        let tag_start = sealed.len() - TAG_LEN;
        let tag: [u8; TAG_LEN] = sealed[tag_start..]
            .try_into()
            .expect("slice length verified");
        sealed.truncate(tag_start);

        Ok(envelope::encode(&salt, &iv, &tag, &sealed))
    }

    /// Decrypt an envelope back to its plaintext.
    ///
    /// # Errors
    ///
    /// - `CryptoError::InvalidFormat` when `value` is not a well-formed
    ///   envelope
    /// - `CryptoError::DecryptFailed` on authentication-tag mismatch
    ///   (wrong tenant key, corruption, or tampering). The failure is
    ///   all-or-nothing; no partial plaintext is ever returned.
    pub fn decrypt(&self, value: &str, tenant_id: &str) -> Result<String> {
        let parsed = envelope::parse(value)?;

        let mut key = self.derive_key(tenant_id, &parsed.salt);
        let cipher = FieldAead::new_from_slice(&key)
            .map_err(|_| CryptoError::decrypt_failed("invalid derived key length"))?;
        key.zeroize();

        // Reassemble ciphertext || tag for the AEAD
        let mut sealed = Vec::with_capacity(parsed.ciphertext.len() + TAG_LEN);
        sealed.extend_from_slice(&parsed.ciphertext);
        sealed.extend_from_slice(&parsed.tag);

        let nonce = Nonce::<U16>::from_slice(&parsed.iv);
        let plaintext = cipher
            .decrypt(nonce, sealed.as_ref())
            .map_err(|_| CryptoError::decrypt_failed("authentication tag mismatch"))?;

        String::from_utf8(plaintext)
            .map_err(|_| CryptoError::decrypt_failed("plaintext is not valid UTF-8"))
    }

    /// Cheap prefix check: is `value` an encrypted envelope?
    pub fn is_encrypted(value: &str) -> bool {
        envelope::is_envelope(value)
    }

    /// Derive the 256-bit value key for `tenant_id` under `salt`.
    fn derive_key(&self, tenant_id: &str, salt: &[u8; SALT_LEN]) -> [u8; KEY_LEN] {
        let secret = self.master.expose_secret();
        let mut input = Vec::with_capacity(secret.len() + 1 + tenant_id.len());
        input.extend_from_slice(secret);
        input.push(KDF_INPUT_SEPARATOR);
        input.extend_from_slice(tenant_id.as_bytes());

        let mut key = [0u8; KEY_LEN];
        pbkdf2_hmac::<Sha256>(&input, salt, PBKDF2_ROUNDS, &mut key);
        input.zeroize();
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> FieldCipher {
        FieldCipher::new(MasterSecret::new(b"test master secret".to_vec()).unwrap())
    }

    #[test]
    fn test_roundtrip() {
        let c = cipher();
        let sealed = c.encrypt("123-45-6789", "tenant-a").unwrap();
        assert!(FieldCipher::is_encrypted(&sealed));
        assert_eq!(c.decrypt(&sealed, "tenant-a").unwrap(), "123-45-6789");
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let c = cipher();
        let sealed = c.encrypt("", "tenant-a").unwrap();
        assert_eq!(c.decrypt(&sealed, "tenant-a").unwrap(), "");
    }

    #[test]
    fn test_cross_tenant_decrypt_fails() {
        let c = cipher();
        let sealed = c.encrypt("confidential", "tenant-a").unwrap();
        let err = c.decrypt(&sealed, "tenant-b").unwrap_err();
        assert!(matches!(err, CryptoError::DecryptFailed { .. }));
    }

    #[test]
    fn test_encryption_is_non_deterministic() {
        let c = cipher();
        let first = c.encrypt("same input", "tenant-a").unwrap();
        let second = c.encrypt("same input", "tenant-a").unwrap();
        assert_ne!(first, second);

        // Both still decrypt to the original
        assert_eq!(c.decrypt(&first, "tenant-a").unwrap(), "same input");
        assert_eq!(c.decrypt(&second, "tenant-a").unwrap(), "same input");
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let c = cipher();
        let sealed = c.encrypt("intact", "tenant-a").unwrap();

        // Flip one character inside the base64 body
        let mut chars: Vec<char> = sealed.chars().collect();
        let idx = sealed.len() - 2;
        chars[idx] = if chars[idx] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();

        let err = c.decrypt(&tampered, "tenant-a").unwrap_err();
        assert!(matches!(
            err,
            CryptoError::DecryptFailed { .. } | CryptoError::InvalidFormat { .. }
        ));
    }

    #[test]
    fn test_decrypt_rejects_plain_value() {
        let c = cipher();
        let err = c.decrypt("not encrypted", "tenant-a").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidFormat { .. }));
    }

    #[test]
    fn test_is_encrypted() {
        let c = cipher();
        let sealed = c.encrypt("value", "tenant-a").unwrap();
        assert!(FieldCipher::is_encrypted(&sealed));
        assert!(!FieldCipher::is_encrypted("plain text"));
    }
}
