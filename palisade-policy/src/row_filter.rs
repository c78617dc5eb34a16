//! Row-level security filtering
//!
//! Filters a candidate record set down to the records visible to a
//! subject. Row security here is an opt-in restriction layer, not a
//! default-deny layer: when no rule applies to the subject for a resource
//! type, every record is visible. That default is deliberate - permission
//! resolution has already gated access to the resource as a whole, and
//! row rules only narrow it further.
//!
//! Applicable rules (active, covering the resource type, and matching the
//! subject's scope with the usual user > org-unit > role precedence and
//! inheritance semantics) are evaluated per record in `priority` order,
//! numerically highest first. The first rule whose expression matches the
//! record makes it visible; a record matched by no rule is excluded. Rules
//! are visibility grants, so several rules for one subject combine as a
//! union.

use crate::store::PolicyStore;
use crate::types::RowSecurityRule;
use palisade_core::{Record, Subject};
use std::sync::Arc;

/// Filters candidate record sets by row security rules.
pub struct RowFilterEvaluator {
    store: Arc<dyn PolicyStore>,
}

impl RowFilterEvaluator {
    /// Create an evaluator over a policy store.
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self { store }
    }

    /// The subset of `records` visible to `subject`.
    ///
    /// # Errors
    ///
    /// Propagates policy store read failures; filtering is aborted rather
    /// than passed through unfiltered.
    pub fn filter_visible(
        &self,
        subject: &Subject,
        resource_type: &str,
        records: Vec<Record>,
    ) -> crate::Result<Vec<Record>> {
        let mut rules: Vec<RowSecurityRule> = self
            .store
            .row_rules(&subject.tenant_id, resource_type)?
            .into_iter()
            .filter(|r| r.is_active)
            .filter(|r| r.applies_to.contains(resource_type))
            .filter(|r| r.applies_to_subject(subject).is_some())
            .collect();

        // No applicable rule: everything stays visible
        if rules.is_empty() {
            return Ok(records);
        }

        // Highest priority first; stable sort keeps insertion order on ties
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));

        let total = records.len();
        let visible: Vec<Record> = records
            .into_iter()
            .filter(|record| {
                rules
                    .iter()
                    .any(|rule| rule.rule_expression.evaluate(subject, record))
            })
            .collect();

        tracing::debug!(
            tenant_id = %subject.tenant_id,
            user_id = %subject.user_id,
            resource_type,
            total,
            visible = visible.len(),
            "row filter applied"
        );
        Ok(visible)
    }
}
