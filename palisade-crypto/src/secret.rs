//! Master-secret handling.
//!
//! The process-wide master secret is the sole input (together with the
//! tenant id) to tenant key derivation. It is loaded once at startup;
//! a process without a configured secret must fail fast rather than fall
//! back to a built-in key.

use crate::error::{CryptoError, Result};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Environment variable holding the master encryption secret.
pub const MASTER_SECRET_ENV: &str = "PALISADE_MASTER_SECRET";

/// The process-wide master encryption secret.
///
/// This type wraps the secret material and:
/// - Prevents accidental exposure through `Debug`
/// - Automatically zeroizes memory when dropped
///
/// # Security
///
/// Use [`expose_secret`](Self::expose_secret) only when feeding the key
/// derivation function. Do not store, log, or transmit the returned bytes.
pub struct MasterSecret {
    bytes: SecretBytes,
}

#[derive(Zeroize, ZeroizeOnDrop)]
struct SecretBytes(Vec<u8>);

// Safe Debug impl that doesn't expose secret material
impl std::fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterSecret")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl MasterSecret {
    /// Create a master secret from raw material.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::MissingSecret` when the material is empty.
    pub fn new(material: impl Into<Vec<u8>>) -> Result<Self> {
        let material = material.into();
        if material.is_empty() {
            return Err(CryptoError::missing_secret("secret material is empty"));
        }
        Ok(Self {
            bytes: SecretBytes(material),
        })
    }

    /// Load the master secret from [`MASTER_SECRET_ENV`].
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::MissingSecret` when the variable is unset or
    /// empty. Call this during process startup so a misconfigured
    /// deployment refuses to serve instead of silently encrypting with a
    /// default key.
    pub fn from_env() -> Result<Self> {
        let value = std::env::var(MASTER_SECRET_ENV)
            .map_err(|_| CryptoError::missing_secret("environment variable is not set"))?;
        Self::new(value.into_bytes())
    }

    /// Expose the secret bytes for key derivation.
    pub(crate) fn expose_secret(&self) -> &[u8] {
        &self.bytes.0
    }
}

// Intentionally no Clone impl to prevent accidental copies

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_secret_rejected() {
        let err = MasterSecret::new(Vec::new()).unwrap_err();
        assert!(matches!(err, CryptoError::MissingSecret { .. }));
    }

    #[test]
    fn test_debug_redacts() {
        let secret = MasterSecret::new(b"super secret".to_vec()).unwrap();
        let printed = format!("{secret:?}");
        assert!(printed.contains("REDACTED"));
        assert!(!printed.contains("super secret"));
    }

    #[test]
    fn test_missing_secret_maps_to_config_error() {
        let err = MasterSecret::new(Vec::new()).unwrap_err();
        let core: palisade_core::Error = err.into();
        assert!(matches!(core, palisade_core::Error::Config(_)));
    }
}
