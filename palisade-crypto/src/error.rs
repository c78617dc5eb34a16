//! Error types for field encryption operations.
//!
//! Variants separate format problems (the value is not an envelope) from
//! cryptographic failures (the envelope does not authenticate) and from
//! configuration problems (no master secret), since callers react to each
//! differently.

use thiserror::Error;

/// Result type alias for encryption operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur during field encryption/decryption.
///
/// Note: Error messages intentionally avoid including sensitive data
/// like key material or plaintext content.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The envelope format is invalid.
    ///
    /// This occurs when:
    /// - The `enc:` prefix is missing (value may not be encrypted)
    /// - The base64 body fails to decode
    /// - The decoded body is too short to hold salt, IV, and tag
    #[error("Invalid envelope format: {context}")]
    InvalidFormat {
        /// Description of what was wrong with the format.
        context: &'static str,
    },

    /// Encryption operation failed.
    ///
    /// This is rare with AES-GCM and typically indicates
    /// a programming error or resource exhaustion.
    #[error("Encryption failed: {context}")]
    EncryptFailed {
        /// Description of what went wrong.
        context: &'static str,
    },

    /// Decryption operation failed.
    ///
    /// This occurs when:
    /// - The wrong tenant key is used
    /// - Ciphertext has been tampered with or corrupted
    /// - Authentication tag verification failed
    ///
    /// Callers must propagate this error and abort the read; substituting
    /// a placeholder value would surface garbage as real data.
    #[error("Decryption failed: {context}")]
    DecryptFailed {
        /// Description of what went wrong.
        context: &'static str,
    },

    /// The master encryption secret is missing or unusable.
    ///
    /// Raised at startup, never at evaluation time. There is no fallback
    /// key: a process without a configured secret must not start.
    #[error("Master secret not configured: {context}")]
    MissingSecret {
        /// Description of what was wrong with the configuration.
        context: &'static str,
    },
}

impl CryptoError {
    /// Create an invalid format error.
    pub fn invalid_format(context: &'static str) -> Self {
        Self::InvalidFormat { context }
    }

    /// Create an encryption failed error.
    pub fn encrypt_failed(context: &'static str) -> Self {
        Self::EncryptFailed { context }
    }

    /// Create a decryption failed error.
    pub fn decrypt_failed(context: &'static str) -> Self {
        Self::DecryptFailed { context }
    }

    /// Create a missing secret error.
    pub fn missing_secret(context: &'static str) -> Self {
        Self::MissingSecret { context }
    }
}

impl From<CryptoError> for palisade_core::Error {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::MissingSecret { .. } => palisade_core::Error::config(err.to_string()),
            other => palisade_core::Error::other(other.to_string()),
        }
    }
}
