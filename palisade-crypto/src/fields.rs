//! Batch helpers applying the cipher to named record fields.
//!
//! Handlers typically protect a fixed subset of a record's string fields
//! (`ssn`, `bankAccount`, ...). These helpers apply [`FieldCipher`] to
//! that subset in place, using the envelope prefix check to avoid
//! double-encrypting values that are already envelopes.

use crate::cipher::FieldCipher;
use crate::error::Result;
use palisade_core::Record;
use serde_json::Value;

/// Encrypt the named string fields of `record` in place.
///
/// Fields that are absent, non-string, or already encrypted are left
/// untouched.
pub fn encrypt_fields<S: AsRef<str>>(
    cipher: &FieldCipher,
    record: &mut Record,
    fields: &[S],
    tenant_id: &str,
) -> Result<()> {
    for field in fields {
        let field = field.as_ref();
        let plaintext = match record.get(field) {
            Some(Value::String(s)) if !FieldCipher::is_encrypted(s) => s.clone(),
            _ => continue,
        };
        let sealed = cipher.encrypt(&plaintext, tenant_id)?;
        record.insert(field.to_string(), Value::String(sealed));
    }
    Ok(())
}

/// Decrypt the named fields of `record` in place.
///
/// Fields that are absent, non-string, or not envelopes are left
/// untouched. A decryption failure aborts the whole operation; the record
/// may hold a mix of decrypted and still-encrypted fields at that point,
/// so callers must discard it rather than serialize it.
pub fn decrypt_fields<S: AsRef<str>>(
    cipher: &FieldCipher,
    record: &mut Record,
    fields: &[S],
    tenant_id: &str,
) -> Result<()> {
    for field in fields {
        let field = field.as_ref();
        let sealed = match record.get(field) {
            Some(Value::String(s)) if FieldCipher::is_encrypted(s) => s.clone(),
            _ => continue,
        };
        let plaintext = cipher.decrypt(&sealed, tenant_id)?;
        record.insert(field.to_string(), Value::String(plaintext));
    }
    Ok(())
}
