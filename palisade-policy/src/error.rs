//! Policy error types

use palisade_crypto::CryptoError;
use thiserror::Error;

/// Policy-related errors
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Malformed record or rule rejected at write time
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Uniqueness constraint violation on insert
    #[error("Duplicate record: {message}")]
    Duplicate { message: String },

    /// Referenced policy record absent
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Policy store read failure
    #[error("Policy store error: {message}")]
    Store { message: String },

    /// Field decryption failure during masking
    ///
    /// Always propagated; masked output is never built from ciphertext or
    /// placeholder values.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl PolicyError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a duplicate record error
    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

/// Result type alias for policy operations
pub type Result<T> = std::result::Result<T, PolicyError>;
