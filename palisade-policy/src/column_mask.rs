//! Column-level security masking
//!
//! Redacts individual fields of a record before it leaves the process.
//! For each field the most specific applicable rule wins (user > org-unit
//! > role > tenant-wide); a field with no applicable rule passes through
//! untouched.
//!
//! Effects:
//!
//! - `ALLOW`: the value is surfaced as-is
//! - `DENY`: the key is omitted from the output entirely (absent, not
//!   nulled)
//! - `MASK`: the value is transformed per the rule's masking type
//!
//! Masking always runs on decrypted plaintext: when a masked field holds
//! an `enc:` envelope, it is decrypted first. Masking ciphertext would
//! leak nothing useful and, worse, produce output that looks redacted but
//! still carries key-dependent structure. Decryption failures propagate -
//! a record that cannot be decrypted is never surfaced with placeholder
//! values.

use crate::store::PolicyStore;
use crate::types::{ColumnAction, ColumnSecurityRule, MaskingConfig, MaskingType};
use palisade_core::{Record, Subject};
use palisade_crypto::FieldCipher;
use serde_json::Value;
use std::sync::Arc;

/// Literal used when no replacement is configured for a full mask.
const DEFAULT_FULL_MASK: &str = "***";

/// Applies column security rules to outgoing records.
pub struct ColumnMaskEvaluator {
    store: Arc<dyn PolicyStore>,
    cipher: Arc<FieldCipher>,
}

impl ColumnMaskEvaluator {
    /// Create an evaluator over a policy store and field cipher.
    pub fn new(store: Arc<dyn PolicyStore>, cipher: Arc<FieldCipher>) -> Self {
        Self { store, cipher }
    }

    /// Apply column rules to one record, producing the redacted copy.
    ///
    /// # Errors
    ///
    /// Propagates store read failures and decryption failures on masked
    /// fields.
    pub fn mask_record(
        &self,
        subject: &Subject,
        resource: &str,
        record: &Record,
    ) -> crate::Result<Record> {
        let rules = self.store.column_rules(&subject.tenant_id, resource)?;
        self.apply(subject, &rules, record)
    }

    /// Apply column rules to a whole response payload.
    pub fn mask_records(
        &self,
        subject: &Subject,
        resource: &str,
        records: &[Record],
    ) -> crate::Result<Vec<Record>> {
        // One store read for the batch
        let rules = self.store.column_rules(&subject.tenant_id, resource)?;
        records
            .iter()
            .map(|record| self.apply(subject, &rules, record))
            .collect()
    }

    fn apply(
        &self,
        subject: &Subject,
        rules: &[ColumnSecurityRule],
        record: &Record,
    ) -> crate::Result<Record> {
        let mut output = Record::new();

        for (field, value) in record {
            match self.winning_rule(subject, rules, field) {
                None => {
                    output.insert(field.clone(), value.clone());
                }
                Some(rule) => match rule.action {
                    ColumnAction::Allow => {
                        output.insert(field.clone(), value.clone());
                    }
                    ColumnAction::Deny => {
                        // Omitted: absent from the output, not nulled
                    }
                    ColumnAction::Mask => {
                        let masked = self.mask_value(subject, rule, value)?;
                        output.insert(field.clone(), masked);
                    }
                },
            }
        }

        Ok(output)
    }

    /// The most specific applicable rule for a field, if any.
    ///
    /// Within a tier the most restrictive action wins (DENY > MASK >
    /// ALLOW), so two conflicting rules at equal specificity cannot widen
    /// exposure.
    fn winning_rule<'a>(
        &self,
        subject: &Subject,
        rules: &'a [ColumnSecurityRule],
        field: &str,
    ) -> Option<&'a ColumnSecurityRule> {
        rules
            .iter()
            .filter(|r| r.is_active && r.column == field)
            .filter_map(|r| r.applies_to_subject(subject).map(|tier| (tier, r)))
            .min_by_key(|(tier, r)| (*tier, action_severity(r.action)))
            .map(|(_, r)| r)
    }

    /// Transform a masked value, decrypting it first when needed.
    fn mask_value(
        &self,
        subject: &Subject,
        rule: &ColumnSecurityRule,
        value: &Value,
    ) -> crate::Result<Value> {
        let plaintext = match value {
            Value::String(s) if FieldCipher::is_encrypted(s) => {
                self.cipher.decrypt(s, &subject.tenant_id)?
            }
            Value::String(s) => s.clone(),
            // Non-string scalars are fully replaced; partial masking a
            // stringified number would leak most of it
            _ => {
                let config = rule.masking_config.clone().unwrap_or_default();
                return Ok(Value::String(
                    config
                        .replacement
                        .unwrap_or_else(|| DEFAULT_FULL_MASK.to_string()),
                ));
            }
        };

        let masking_type = rule.masking_type.unwrap_or(MaskingType::Full);
        let config = rule.masking_config.clone().unwrap_or_default();
        Ok(Value::String(apply_mask(&plaintext, masking_type, &config)))
    }
}

/// Order column actions by restrictiveness, most restrictive first.
fn action_severity(action: ColumnAction) -> u8 {
    match action {
        ColumnAction::Deny => 0,
        ColumnAction::Mask => 1,
        ColumnAction::Allow => 2,
    }
}

/// Apply a masking transform to a plaintext value.
fn apply_mask(value: &str, masking_type: MaskingType, config: &MaskingConfig) -> String {
    match masking_type {
        MaskingType::Full => config
            .replacement
            .clone()
            .unwrap_or_else(|| DEFAULT_FULL_MASK.to_string()),
        MaskingType::Partial => {
            let chars: Vec<char> = value.chars().collect();
            let len = chars.len();
            if len <= config.prefix_len + config.suffix_len {
                // Too short to keep anything without leaking the value
                return config.mask_char.to_string().repeat(len);
            }
            let prefix: String = chars[..config.prefix_len].iter().collect();
            let suffix: String = chars[len - config.suffix_len..].iter().collect();
            let masked = config
                .mask_char
                .to_string()
                .repeat(len - config.prefix_len - config.suffix_len);
            format!("{prefix}{masked}{suffix}")
        }
        MaskingType::Custom => config
            .replacement
            .clone()
            .unwrap_or_else(|| DEFAULT_FULL_MASK.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPolicyStore;
    use palisade_core::as_record;
    use palisade_crypto::{encrypt_fields, MasterSecret};
    use serde_json::json;

    fn cipher() -> Arc<FieldCipher> {
        Arc::new(FieldCipher::new(
            MasterSecret::new(b"test master secret".to_vec()).unwrap(),
        ))
    }

    fn subject() -> Subject {
        Subject::new("u1", "t1", "ANALYST")
            .with_org_units(["sales"])
            .with_ancestors(["emea"])
    }

    fn evaluator(store: MemoryPolicyStore) -> ColumnMaskEvaluator {
        ColumnMaskEvaluator::new(Arc::new(store), cipher())
    }

    #[test]
    fn test_no_rules_record_untouched() {
        let e = evaluator(MemoryPolicyStore::new());
        let record = as_record(json!({"name": "Ada", "ssn": "123-45-6789"})).unwrap();
        let masked = e.mask_record(&subject(), "employees", &record).unwrap();
        assert_eq!(masked, record);
    }

    #[test]
    fn test_deny_omits_field_entirely() {
        let store = MemoryPolicyStore::new();
        store
            .insert_column_rule(
                ColumnSecurityRule::new("t1", "employees", "ssn", ColumnAction::Deny)
                    .for_role("ANALYST"),
            )
            .unwrap();
        let e = evaluator(store);

        let record = as_record(json!({"name": "Ada", "ssn": "123-45-6789"})).unwrap();
        let masked = e.mask_record(&subject(), "employees", &record).unwrap();

        assert!(!masked.contains_key("ssn"));
        assert_eq!(masked["name"], "Ada");
    }

    #[test]
    fn test_partial_mask_preserves_prefix_and_suffix() {
        let store = MemoryPolicyStore::new();
        store
            .insert_column_rule(
                ColumnSecurityRule::new("t1", "employees", "ssn", ColumnAction::Mask)
                    .for_role("ANALYST")
                    .with_masking(MaskingType::Partial, MaskingConfig::default()),
            )
            .unwrap();
        let e = evaluator(store);

        // 9 characters: first 2 and last 2 preserved, 5 masked
        let record = as_record(json!({"ssn": "123456789"})).unwrap();
        let masked = e.mask_record(&subject(), "employees", &record).unwrap();
        assert_eq!(masked["ssn"], "12*****89");
    }

    #[test]
    fn test_partial_mask_short_value_fully_masked() {
        let store = MemoryPolicyStore::new();
        store
            .insert_column_rule(
                ColumnSecurityRule::new("t1", "employees", "pin", ColumnAction::Mask)
                    .for_role("ANALYST")
                    .with_masking(MaskingType::Partial, MaskingConfig::default()),
            )
            .unwrap();
        let e = evaluator(store);

        let record = as_record(json!({"pin": "1234"})).unwrap();
        let masked = e.mask_record(&subject(), "employees", &record).unwrap();
        assert_eq!(masked["pin"], "****");
    }

    #[test]
    fn test_full_mask_literal() {
        let store = MemoryPolicyStore::new();
        store
            .insert_column_rule(
                ColumnSecurityRule::new("t1", "employees", "salary", ColumnAction::Mask)
                    .for_role("ANALYST")
                    .with_masking(
                        MaskingType::Full,
                        MaskingConfig {
                            replacement: Some("[REDACTED]".into()),
                            ..MaskingConfig::default()
                        },
                    ),
            )
            .unwrap();
        let e = evaluator(store);

        let record = as_record(json!({"salary": "92000"})).unwrap();
        let masked = e.mask_record(&subject(), "employees", &record).unwrap();
        assert_eq!(masked["salary"], "[REDACTED]");
    }

    #[test]
    fn test_most_specific_rule_wins() {
        let store = MemoryPolicyStore::new();
        // Role-wide mask, but this user is explicitly allowed
        store
            .insert_column_rule(
                ColumnSecurityRule::new("t1", "employees", "ssn", ColumnAction::Mask)
                    .for_role("ANALYST")
                    .with_masking(MaskingType::Full, MaskingConfig::default()),
            )
            .unwrap();
        store
            .insert_column_rule(
                ColumnSecurityRule::new("t1", "employees", "ssn", ColumnAction::Allow)
                    .for_user("u1"),
            )
            .unwrap();
        let e = evaluator(store);

        let record = as_record(json!({"ssn": "123-45-6789"})).unwrap();
        let masked = e.mask_record(&subject(), "employees", &record).unwrap();
        assert_eq!(masked["ssn"], "123-45-6789");
    }

    #[test]
    fn test_restrictive_action_wins_within_tier() {
        let store = MemoryPolicyStore::new();
        store
            .insert_column_rule(
                ColumnSecurityRule::new("t1", "employees", "ssn", ColumnAction::Allow)
                    .for_role("ANALYST"),
            )
            .unwrap();
        store
            .insert_column_rule(
                ColumnSecurityRule::new("t1", "employees", "ssn", ColumnAction::Deny)
                    .for_role("ANALYST"),
            )
            .unwrap();
        let e = evaluator(store);

        let record = as_record(json!({"ssn": "123-45-6789"})).unwrap();
        let masked = e.mask_record(&subject(), "employees", &record).unwrap();
        assert!(!masked.contains_key("ssn"));
    }

    #[test]
    fn test_masks_decrypted_plaintext_not_ciphertext() {
        let c = cipher();
        let store = MemoryPolicyStore::new();
        store
            .insert_column_rule(
                ColumnSecurityRule::new("t1", "employees", "ssn", ColumnAction::Mask)
                    .for_role("ANALYST")
                    .with_masking(MaskingType::Partial, MaskingConfig::default()),
            )
            .unwrap();
        let e = ColumnMaskEvaluator::new(Arc::new(store), c.clone());

        let mut record = as_record(json!({"ssn": "123456789"})).unwrap();
        encrypt_fields(&c, &mut record, &["ssn"], "t1").unwrap();
        assert!(FieldCipher::is_encrypted(record["ssn"].as_str().unwrap()));

        // The mask applies to the plaintext, not the envelope
        let masked = e.mask_record(&subject(), "employees", &record).unwrap();
        assert_eq!(masked["ssn"], "12*****89");
    }

    #[test]
    fn test_decrypt_failure_aborts_masking() {
        let c = cipher();
        let store = MemoryPolicyStore::new();
        store
            .insert_column_rule(
                ColumnSecurityRule::new("t1", "employees", "ssn", ColumnAction::Mask)
                    .for_role("ANALYST")
                    .with_masking(MaskingType::Partial, MaskingConfig::default()),
            )
            .unwrap();
        let e = ColumnMaskEvaluator::new(Arc::new(store), c.clone());

        // Envelope sealed for a different tenant
        let mut record = as_record(json!({"ssn": "123456789"})).unwrap();
        encrypt_fields(&c, &mut record, &["ssn"], "t2").unwrap();

        let err = e.mask_record(&subject(), "employees", &record).unwrap_err();
        assert!(matches!(err, crate::PolicyError::Crypto(_)));
    }

    #[test]
    fn test_mask_non_string_value_fully_replaced() {
        let store = MemoryPolicyStore::new();
        store
            .insert_column_rule(
                ColumnSecurityRule::new("t1", "employees", "salary", ColumnAction::Mask)
                    .for_role("ANALYST")
                    .with_masking(MaskingType::Partial, MaskingConfig::default()),
            )
            .unwrap();
        let e = evaluator(store);

        let record = as_record(json!({"salary": 92000})).unwrap();
        let masked = e.mask_record(&subject(), "employees", &record).unwrap();
        assert_eq!(masked["salary"], "***");
    }

    #[test]
    fn test_mask_records_batch() {
        let store = MemoryPolicyStore::new();
        store
            .insert_column_rule(
                ColumnSecurityRule::new("t1", "employees", "ssn", ColumnAction::Deny)
                    .for_role("ANALYST"),
            )
            .unwrap();
        let e = evaluator(store);

        let records = vec![
            as_record(json!({"id": "e1", "ssn": "111111111"})).unwrap(),
            as_record(json!({"id": "e2", "ssn": "222222222"})).unwrap(),
        ];
        let masked = e.mask_records(&subject(), "employees", &records).unwrap();
        assert!(masked.iter().all(|r| !r.contains_key("ssn")));
        assert_eq!(masked.len(), 2);
    }
}
