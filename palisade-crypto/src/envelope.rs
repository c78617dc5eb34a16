//! Envelope format for encrypted field values.
//!
//! ## Envelope Layout
//!
//! ```text
//! "enc:" + base64( salt(64) || iv(16) || auth_tag(16) || ciphertext )
//! ```
//!
//! - **Prefix**: the ASCII literal `enc:` - identifies a value as an
//!   encrypted envelope (see [`is_envelope`])
//! - **Salt**: 64 random bytes, the per-value KDF salt
//! - **IV**: 16-byte random initialization vector (unique per encryption)
//! - **Auth tag**: 16-byte GCM authentication tag
//! - **Ciphertext**: AES-256-GCM output (plaintext length)
//!
//! The byte layout inside the base64 body is a wire contract: previously
//! encrypted data must decrypt against it byte-for-byte, so the offsets
//! below are fixed.

use crate::error::{CryptoError, Result};
use base64::prelude::*;

// ============================================================================
// Constants
// ============================================================================

/// ASCII prefix identifying an encrypted envelope.
pub const PREFIX: &str = "enc:";

/// Size of the per-value KDF salt.
pub const SALT_LEN: usize = 64;

/// Size of the initialization vector.
pub const IV_LEN: usize = 16;

/// Size of the GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// Required key size for AES-256.
pub const KEY_LEN: usize = 32;

// Field offsets inside the decoded body
const SALT_OFFSET: usize = 0;
const IV_OFFSET: usize = SALT_OFFSET + SALT_LEN; // 64
const TAG_OFFSET: usize = IV_OFFSET + IV_LEN; // 80

/// Total header length (salt + iv + auth tag).
pub const HEADER_LEN: usize = TAG_OFFSET + TAG_LEN; // 96

// ============================================================================
// Detection
// ============================================================================

/// Cheap prefix check: does `value` look like an encrypted envelope?
///
/// Used by the batch helpers to skip values that are already encrypted.
/// A `true` result does not guarantee the body is well-formed; only
/// [`parse`] validates that.
pub fn is_envelope(value: &str) -> bool {
    value.starts_with(PREFIX)
}

// ============================================================================
// Encoding
// ============================================================================

/// Assemble an envelope string from its parts.
pub fn encode(
    salt: &[u8; SALT_LEN],
    iv: &[u8; IV_LEN],
    tag: &[u8; TAG_LEN],
    ciphertext: &[u8],
) -> String {
    let mut body = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    body.extend_from_slice(salt);
    body.extend_from_slice(iv);
    body.extend_from_slice(tag);
    body.extend_from_slice(ciphertext);

    format!("{PREFIX}{}", BASE64_STANDARD.encode(body))
}

// ============================================================================
// Parsing
// ============================================================================

/// Parsed fields of an encrypted envelope.
#[derive(Debug, Clone)]
pub struct ParsedEnvelope {
    /// Per-value KDF salt.
    pub salt: [u8; SALT_LEN],
    /// Initialization vector used for encryption.
    pub iv: [u8; IV_LEN],
    /// GCM authentication tag.
    pub tag: [u8; TAG_LEN],
    /// Raw ciphertext (may be empty for empty plaintext).
    pub ciphertext: Vec<u8>,
}

/// Parse and validate an envelope string.
///
/// # Errors
///
/// Returns `CryptoError::InvalidFormat` if:
/// - The `enc:` prefix is missing (value may not be encrypted)
/// - The base64 body fails to decode
/// - The decoded body is shorter than salt + IV + tag
pub fn parse(envelope: &str) -> Result<ParsedEnvelope> {
    let body = envelope
        .strip_prefix(PREFIX)
        .ok_or_else(|| CryptoError::invalid_format("missing enc: prefix"))?;

    let decoded = BASE64_STANDARD
        .decode(body)
        .map_err(|_| CryptoError::invalid_format("envelope body is not valid base64"))?;

    if decoded.len() < HEADER_LEN {
        return Err(CryptoError::invalid_format(
            "envelope too short for salt, iv, and auth tag",
        ));
    }

    let salt: [u8; SALT_LEN] = decoded[SALT_OFFSET..SALT_OFFSET + SALT_LEN]
        .try_into()
        .expect("slice length verified");
    let iv: [u8; IV_LEN] = decoded[IV_OFFSET..IV_OFFSET + IV_LEN]
        .try_into()
        .expect("slice length verified");
    let tag: [u8; TAG_LEN] = decoded[TAG_OFFSET..TAG_OFFSET + TAG_LEN]
        .try_into()
        .expect("slice length verified");
    let ciphertext = decoded[HEADER_LEN..].to_vec();

    Ok(ParsedEnvelope {
        salt,
        iv,
        tag,
        ciphertext,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_roundtrip() {
        let salt = [0x11u8; SALT_LEN];
        let iv = [0x22u8; IV_LEN];
        let tag = [0x33u8; TAG_LEN];
        let ciphertext = b"opaque bytes";

        let envelope = encode(&salt, &iv, &tag, ciphertext);
        assert!(is_envelope(&envelope));

        let parsed = parse(&envelope).unwrap();
        assert_eq!(parsed.salt, salt);
        assert_eq!(parsed.iv, iv);
        assert_eq!(parsed.tag, tag);
        assert_eq!(parsed.ciphertext, ciphertext);
    }

    #[test]
    fn test_layout_constants() {
        // Verify the offset math is correct
        assert_eq!(HEADER_LEN, 96);

        let envelope = encode(&[0xAA; SALT_LEN], &[0xBB; IV_LEN], &[0xCC; TAG_LEN], &[]);
        let decoded = BASE64_STANDARD
            .decode(envelope.strip_prefix(PREFIX).unwrap())
            .unwrap();

        assert_eq!(decoded.len(), HEADER_LEN);
        assert_eq!(&decoded[0..64], &[0xAA; 64]);
        assert_eq!(&decoded[64..80], &[0xBB; 16]);
        assert_eq!(&decoded[80..96], &[0xCC; 16]);
    }

    #[test]
    fn test_empty_ciphertext_allowed() {
        let envelope = encode(&[0; SALT_LEN], &[0; IV_LEN], &[0; TAG_LEN], &[]);
        let parsed = parse(&envelope).unwrap();
        assert!(parsed.ciphertext.is_empty());
    }

    #[test]
    fn test_missing_prefix() {
        let err = parse("AAAA").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidFormat { .. }));
    }

    #[test]
    fn test_bad_base64() {
        let err = parse("enc:!!!not-base64!!!").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidFormat { .. }));
    }

    #[test]
    fn test_too_short() {
        let short = format!("{PREFIX}{}", BASE64_STANDARD.encode([0u8; HEADER_LEN - 1]));
        let err = parse(&short).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidFormat { .. }));
    }

    #[test]
    fn test_is_envelope() {
        assert!(is_envelope("enc:AAAA"));
        assert!(!is_envelope("plain text"));
        assert!(!is_envelope("ENC:AAAA"));
    }
}
