//! Pipeline error types

use palisade_crypto::CryptoError;
use palisade_policy::PolicyError;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Message surfaced for every authorization denial.
///
/// Deliberately opaque: the caller must not be able to tell "permission
/// absent" from "resource absent", or the denial itself would leak the
/// existence of data the subject cannot see. The internal reason is
/// logged, never returned.
pub const DENIED_MESSAGE: &str = "access denied";

/// Errors surfaced by the request pipeline
#[derive(Debug, Error)]
pub enum ApiError {
    /// The client address failed the tenant allow-list check.
    ///
    /// Raised before identity resolution; the reason may name the
    /// offending address since no data existence is implied.
    #[error("Admission denied: {reason}")]
    AdmissionDenied { reason: String },

    /// Permission resolution denied the request.
    ///
    /// Always carries [`DENIED_MESSAGE`]; see its docs.
    #[error("{message}")]
    AuthorizationDenied { message: String },

    /// Policy evaluation failure (store read, masking)
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Field decryption failure
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The protected handler failed
    #[error("Handler error: {message}")]
    Handler { message: String },
}

impl ApiError {
    /// Create the opaque authorization denial.
    pub fn authorization_denied() -> Self {
        Self::AuthorizationDenied {
            message: DENIED_MESSAGE.to_string(),
        }
    }

    /// Create a handler error.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }
}
