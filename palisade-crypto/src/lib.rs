//! Field-level encryption for the Palisade engine using AES-256-GCM.
//!
//! This crate encrypts sensitive scalar field values before they reach the
//! persistence layer and decrypts them on the way back, keyed per tenant.
//!
//! # Features
//!
//! - **AES-256-GCM authenticated encryption**: Provides both
//!   confidentiality and tamper detection
//! - **Per-tenant key derivation**: PBKDF2-HMAC-SHA256 over the master
//!   secret and tenant id, salted per value
//! - **Non-deterministic envelopes**: Fresh random salt and IV per call,
//!   so equal plaintexts produce distinct ciphertexts
//! - **Fail-closed decryption**: Authentication-tag mismatch raises
//!   [`CryptoError::DecryptFailed`]; garbage plaintext is never returned
//! - **Secret hygiene**: Master secret and derived keys are zeroized via
//!   the `zeroize` crate
//!
//! # Envelope Format
//!
//! ```text
//! "enc:" + base64( salt(64) || iv(16) || auth_tag(16) || ciphertext )
//! ```
//!
//! The layout is a wire contract shared with previously encrypted data;
//! see [`envelope`] for the offset table.
//!
//! # Quick Start
//!
//! ```ignore
//! use palisade_crypto::{FieldCipher, MasterSecret};
//!
//! // Fails fast when PALISADE_MASTER_SECRET is not configured
//! let cipher = FieldCipher::from_env()?;
//!
//! let sealed = cipher.encrypt("123-45-6789", "tenant-a")?;
//! assert!(FieldCipher::is_encrypted(&sealed));
//!
//! let plain = cipher.decrypt(&sealed, "tenant-a")?;
//! assert_eq!(plain, "123-45-6789");
//! ```
//!
//! # Batch Helpers
//!
//! [`encrypt_fields`] / [`decrypt_fields`] apply the cipher to a named
//! subset of a record's string fields, skipping values that are already
//! envelopes so repeated application is safe.

mod cipher;
pub mod envelope;
mod error;
mod fields;
mod secret;

pub use cipher::FieldCipher;
pub use error::{CryptoError, Result};
pub use fields::{decrypt_fields, encrypt_fields};
pub use secret::{MasterSecret, MASTER_SECRET_ENV};

pub use envelope::{HEADER_LEN, IV_LEN, KEY_LEN, PREFIX, SALT_LEN, TAG_LEN};
