//! Request subject resolved by the external identity layer.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A resolved request subject.
///
/// Produced by the identity/session collaborator before any evaluation
/// runs; the engine treats it as immutable input. Org-unit membership is
/// materialized up front so that no hierarchy walk ever happens at
/// evaluation time:
///
/// - `org_unit_ids` holds the subject's direct memberships
/// - `ancestor_org_unit_ids` holds the ancestor closure of those
///   memberships, computed once via [`OrgHierarchy::ancestor_closure`]
///
/// The union of the two sets is the subject's ancestor-inclusive org-unit
/// set. They are kept separate because non-inheriting permissions apply to
/// direct memberships only.
///
/// [`OrgHierarchy::ancestor_closure`]: crate::org::OrgHierarchy::ancestor_closure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// User identifier within the tenant.
    pub user_id: String,
    /// Owning tenant.
    pub tenant_id: String,
    /// Role name assigned by the identity layer.
    pub role: String,
    /// Direct org-unit memberships.
    #[serde(default)]
    pub org_unit_ids: HashSet<String>,
    /// Ancestors of the direct memberships, materialized by the identity
    /// layer.
    #[serde(default)]
    pub ancestor_org_unit_ids: HashSet<String>,
}

impl Subject {
    /// Create a subject with no org-unit memberships.
    pub fn new(
        user_id: impl Into<String>,
        tenant_id: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
            role: role.into(),
            org_unit_ids: HashSet::new(),
            ancestor_org_unit_ids: HashSet::new(),
        }
    }

    /// Set the direct org-unit memberships.
    pub fn with_org_units<I, S>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.org_unit_ids = units.into_iter().map(Into::into).collect();
        self
    }

    /// Set the materialized ancestor closure.
    pub fn with_ancestors<I, S>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ancestor_org_unit_ids = units.into_iter().map(Into::into).collect();
        self
    }

    /// True if `org_unit` is one of the subject's direct memberships.
    pub fn in_org_unit(&self, org_unit: &str) -> bool {
        self.org_unit_ids.contains(org_unit)
    }

    /// True if `org_unit` is a direct membership or an ancestor of one.
    pub fn in_org_unit_or_ancestor(&self, org_unit: &str) -> bool {
        self.org_unit_ids.contains(org_unit) || self.ancestor_org_unit_ids.contains(org_unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_org_unit_membership() {
        let subject = Subject::new("u1", "t1", "ANALYST")
            .with_org_units(["sales"])
            .with_ancestors(["emea", "corp"]);

        assert!(subject.in_org_unit("sales"));
        assert!(!subject.in_org_unit("emea"));

        assert!(subject.in_org_unit_or_ancestor("sales"));
        assert!(subject.in_org_unit_or_ancestor("emea"));
        assert!(subject.in_org_unit_or_ancestor("corp"));
        assert!(!subject.in_org_unit_or_ancestor("apac"));
    }

    #[test]
    fn test_serde_shape() {
        let subject = Subject::new("u1", "t1", "ANALYST").with_org_units(["sales"]);
        let json = serde_json::to_value(&subject).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["tenantId"], "t1");
        assert_eq!(json["role"], "ANALYST");
        assert!(json["orgUnitIds"].is_array());
    }
}
