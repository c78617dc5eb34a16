//! Permission resolution
//!
//! Resolves allow/deny for `(subject, resource, action)` and for abstract
//! function capabilities against the tenant's permission records.
//!
//! # Evaluation Semantics
//!
//! 1. **Expiry filter**: expired records are treated as absent
//! 2. **Precedence walk**: user > org-unit > role; the most specific tier
//!    holding at least one applicable record decides
//! 3. **Deny overrides within a tier**: any applicable record that does
//!    not grant (action not in its set, `allowed = false`, or a failing
//!    condition) forces a denial even if a sibling record grants
//! 4. **Default deny**: no applicable record at any tier denies
//!
//! `resolve` never returns an error; a store failure or any other
//! ambiguity yields a denial with a loggable reason.

use crate::store::PolicyStore;
use crate::types::{Decision, ScopeTier};
use chrono::Utc;
use palisade_core::{Record, Subject};
use std::sync::Arc;

/// Tiers in precedence order, most specific first.
const TIERS: [ScopeTier; 3] = [ScopeTier::User, ScopeTier::OrgUnit, ScopeTier::Role];

/// Resolves permission decisions against the policy store.
///
/// Stateless apart from the store handle; safe to share across threads.
pub struct PermissionResolver {
    store: Arc<dyn PolicyStore>,
}

impl PermissionResolver {
    /// Create a resolver over a policy store.
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self { store }
    }

    /// Resolve whether `subject` may perform `action` on `resource`.
    ///
    /// `record_attrs` feeds condition predicates on the permission
    /// records; pass `None` when no record context exists (conditions
    /// then fail closed).
    pub fn resolve(
        &self,
        subject: &Subject,
        resource: &str,
        action: &str,
        record_attrs: Option<&Record>,
    ) -> Decision {
        let records = match self.store.org_permissions(&subject.tenant_id, resource) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(
                    tenant_id = %subject.tenant_id,
                    resource,
                    error = %err,
                    "policy store read failed; denying"
                );
                return Decision::denied("policy store unavailable");
            }
        };

        let now = Utc::now();
        let empty = Record::new();
        let attrs = record_attrs.unwrap_or(&empty);

        for tier in TIERS {
            let applicable: Vec<_> = records
                .iter()
                .filter(|p| !p.is_expired(now))
                .filter(|p| p.applies_to(subject) == Some(tier))
                .collect();
            if applicable.is_empty() {
                continue;
            }

            let all_grant = applicable.iter().all(|p| {
                p.actions.contains(action)
                    && p.conditions
                        .as_ref()
                        .map_or(true, |c| c.evaluate(subject, attrs))
            });

            let decision = if all_grant {
                Decision::Allowed
            } else {
                Decision::denied(format!("action '{action}' denied at {tier:?} scope"))
            };
            tracing::debug!(
                tenant_id = %subject.tenant_id,
                user_id = %subject.user_id,
                resource,
                action,
                tier = ?tier,
                allowed = decision.is_allowed(),
                "permission decision"
            );
            return decision;
        }

        tracing::debug!(
            tenant_id = %subject.tenant_id,
            user_id = %subject.user_id,
            resource,
            action,
            "no applicable permission record; default deny"
        );
        Decision::denied(format!(
            "no permission record grants '{action}' on '{resource}'"
        ))
    }

    /// Resolve whether `subject` may use the abstract capability
    /// `function`.
    ///
    /// Same precedence walk as [`resolve`](Self::resolve), testing each
    /// record's `allowed` flag instead of action-set membership. Default
    /// deny.
    pub fn resolve_function(&self, subject: &Subject, function: &str) -> bool {
        let records = match self
            .store
            .function_permissions(&subject.tenant_id, function)
        {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(
                    tenant_id = %subject.tenant_id,
                    function,
                    error = %err,
                    "policy store read failed; denying"
                );
                return false;
            }
        };

        let now = Utc::now();
        let empty = Record::new();

        for tier in TIERS {
            let applicable: Vec<_> = records
                .iter()
                .filter(|p| !p.is_expired(now))
                .filter(|p| p.applies_to(subject) == Some(tier))
                .collect();
            if applicable.is_empty() {
                continue;
            }

            return applicable.iter().all(|p| {
                p.allowed
                    && p.conditions
                        .as_ref()
                        .map_or(true, |c| c.evaluate(subject, &empty))
            });
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Predicate;
    use crate::store::MemoryPolicyStore;
    use crate::types::{FunctionPermission, OrganizationPermission};
    use chrono::Duration;
    use palisade_core::as_record;
    use serde_json::json;

    fn resolver(store: MemoryPolicyStore) -> PermissionResolver {
        PermissionResolver::new(Arc::new(store))
    }

    fn pm_subject() -> Subject {
        Subject::new("u1", "t1", "PROJECT_MANAGER")
            .with_org_units(["sales"])
            .with_ancestors(["emea"])
    }

    #[test]
    fn test_default_deny_without_records() {
        let r = resolver(MemoryPolicyStore::new());
        let decision = r.resolve(&pm_subject(), "projects", "READ", None);
        assert!(!decision.is_allowed());
        assert!(decision.reason().is_some());
    }

    #[test]
    fn test_role_grant_and_missing_action() {
        let store = MemoryPolicyStore::new();
        store
            .insert_org_permission(OrganizationPermission::for_role(
                "t1",
                "PROJECT_MANAGER",
                "projects",
                ["READ", "UPDATE"],
            ))
            .unwrap();
        let r = resolver(store);
        let subject = pm_subject();

        assert!(r.resolve(&subject, "projects", "READ", None).is_allowed());
        assert!(r.resolve(&subject, "projects", "UPDATE", None).is_allowed());
        // Granted READ/UPDATE does not imply DELETE
        assert!(!r.resolve(&subject, "projects", "DELETE", None).is_allowed());
    }

    #[test]
    fn test_user_scope_wins_over_role() {
        let store = MemoryPolicyStore::new();
        // Role grants READ, but the user-specific record does not
        store
            .insert_org_permission(OrganizationPermission::for_role(
                "t1",
                "PROJECT_MANAGER",
                "projects",
                ["READ"],
            ))
            .unwrap();
        store
            .insert_org_permission(OrganizationPermission::for_user(
                "t1",
                "u1",
                "projects",
                ["UPDATE"],
            ))
            .unwrap();
        let r = resolver(store);
        let subject = pm_subject();

        // The user tier decides; its record lacks READ
        assert!(!r.resolve(&subject, "projects", "READ", None).is_allowed());
        assert!(r.resolve(&subject, "projects", "UPDATE", None).is_allowed());
    }

    #[test]
    fn test_deny_overrides_within_tier() {
        let store = MemoryPolicyStore::new();
        // Two org-unit records apply: one grants READ, the other does not
        store
            .insert_org_permission(OrganizationPermission::for_org_unit(
                "t1",
                "sales",
                "projects",
                ["READ"],
            ))
            .unwrap();
        store
            .insert_org_permission(OrganizationPermission::for_org_unit(
                "t1",
                "emea",
                "projects",
                ["UPDATE"],
            ))
            .unwrap();
        let r = resolver(store);

        assert!(!r
            .resolve(&pm_subject(), "projects", "READ", None)
            .is_allowed());
    }

    #[test]
    fn test_org_unit_inheritance() {
        let store = MemoryPolicyStore::new();
        store
            .insert_org_permission(OrganizationPermission::for_org_unit(
                "t1",
                "emea",
                "projects",
                ["READ"],
            ))
            .unwrap();
        let r = resolver(store);

        // Subject is in "sales", a descendant of "emea": inherited grant
        assert!(r
            .resolve(&pm_subject(), "projects", "READ", None)
            .is_allowed());

        // Without inheritance the ancestor record does not apply
        let store = MemoryPolicyStore::new();
        store
            .insert_org_permission(
                OrganizationPermission::for_org_unit("t1", "emea", "projects", ["READ"])
                    .without_inheritance(),
            )
            .unwrap();
        let r = resolver(store);
        assert!(!r
            .resolve(&pm_subject(), "projects", "READ", None)
            .is_allowed());
    }

    #[test]
    fn test_expired_record_is_absent() {
        let store = MemoryPolicyStore::new();
        store
            .insert_org_permission(
                OrganizationPermission::for_role("t1", "PROJECT_MANAGER", "projects", ["READ"])
                    .expiring_at(Utc::now() - Duration::hours(1)),
            )
            .unwrap();
        let r = resolver(store);

        assert!(!r
            .resolve(&pm_subject(), "projects", "READ", None)
            .is_allowed());
    }

    #[test]
    fn test_conditions_gate_the_grant() {
        let store = MemoryPolicyStore::new();
        store
            .insert_org_permission(
                OrganizationPermission::for_role("t1", "PROJECT_MANAGER", "projects", ["UPDATE"])
                    .with_conditions(Predicate::equals("status", "draft")),
            )
            .unwrap();
        let r = resolver(store);
        let subject = pm_subject();

        let draft = as_record(json!({"status": "draft"})).unwrap();
        assert!(r
            .resolve(&subject, "projects", "UPDATE", Some(&draft))
            .is_allowed());

        let published = as_record(json!({"status": "published"})).unwrap();
        assert!(!r
            .resolve(&subject, "projects", "UPDATE", Some(&published))
            .is_allowed());

        // No record context: conditions fail closed
        assert!(!r.resolve(&subject, "projects", "UPDATE", None).is_allowed());
    }

    #[test]
    fn test_cross_tenant_records_never_apply() {
        let store = MemoryPolicyStore::new();
        store
            .insert_org_permission(OrganizationPermission::for_role(
                "t2",
                "PROJECT_MANAGER",
                "projects",
                ["READ"],
            ))
            .unwrap();
        let r = resolver(store);

        assert!(!r
            .resolve(&pm_subject(), "projects", "READ", None)
            .is_allowed());
    }

    #[test]
    fn test_resolve_function() {
        let store = MemoryPolicyStore::new();
        store
            .insert_function_permission(FunctionPermission::for_role(
                "t1",
                "PROJECT_MANAGER",
                "EXPORT_REPORTS",
                true,
            ))
            .unwrap();
        // User-specific override disallows it
        store
            .insert_function_permission(FunctionPermission::for_user(
                "t1",
                "u1",
                "EXPORT_REPORTS",
                false,
            ))
            .unwrap();
        let r = resolver(store);
        let subject = pm_subject();

        assert!(!r.resolve_function(&subject, "EXPORT_REPORTS"));

        let colleague = Subject::new("u2", "t1", "PROJECT_MANAGER");
        assert!(r.resolve_function(&colleague, "EXPORT_REPORTS"));

        // Default deny for unknown functions
        assert!(!r.resolve_function(&subject, "CLOSE_BOOKS"));
    }
}
