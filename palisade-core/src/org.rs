//! Org-unit hierarchy with write-time cycle rejection.
//!
//! The hierarchy is mutated only by administrative writes; evaluation code
//! never walks it. The identity layer calls [`OrgHierarchy::ancestor_closure`]
//! once per session to materialize a subject's ancestor set. Because
//! [`OrgHierarchy::set_parent`] rejects any link that would close a cycle,
//! every walk over a stored hierarchy is bounded.

use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};

/// Parent links between org units for one tenant.
#[derive(Debug, Default, Clone)]
pub struct OrgHierarchy {
    parent: HashMap<String, String>,
}

impl OrgHierarchy {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `unit` under `parent`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the link would make a unit its own
    /// ancestor (including the direct `unit == parent` case).
    pub fn set_parent(&mut self, unit: impl Into<String>, parent: impl Into<String>) -> Result<()> {
        let unit = unit.into();
        let parent = parent.into();

        if unit == parent {
            return Err(Error::validation(format!(
                "org unit '{unit}' cannot be its own parent"
            )));
        }

        // Walk up from the proposed parent; reaching `unit` means the new
        // link would close a cycle. Bounded because the stored hierarchy is
        // already acyclic.
        let mut cursor = Some(parent.as_str());
        while let Some(current) = cursor {
            if current == unit {
                return Err(Error::validation(format!(
                    "linking org unit '{unit}' under '{parent}' would create a cycle"
                )));
            }
            cursor = self.parent.get(current).map(String::as_str);
        }

        self.parent.insert(unit, parent);
        Ok(())
    }

    /// Remove a unit's parent link.
    pub fn remove(&mut self, unit: &str) {
        self.parent.remove(unit);
    }

    /// The direct parent of `unit`, if any.
    pub fn parent_of(&self, unit: &str) -> Option<&str> {
        self.parent.get(unit).map(String::as_str)
    }

    /// All ancestors of `unit`, nearest first.
    pub fn ancestors_of(&self, unit: &str) -> Vec<String> {
        let mut ancestors = Vec::new();
        let mut cursor = self.parent.get(unit);
        while let Some(parent) = cursor {
            ancestors.push(parent.clone());
            cursor = self.parent.get(parent);
        }
        ancestors
    }

    /// Ancestor closure over a set of direct memberships.
    ///
    /// Used by the identity layer to materialize
    /// `Subject::ancestor_org_unit_ids`; the returned set excludes the
    /// direct memberships themselves.
    pub fn ancestor_closure<'a, I>(&self, units: I) -> HashSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut closure = HashSet::new();
        for unit in units {
            for ancestor in self.ancestors_of(unit) {
                closure.insert(ancestor);
            }
        }
        closure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OrgHierarchy {
        let mut h = OrgHierarchy::new();
        h.set_parent("sales", "emea").unwrap();
        h.set_parent("emea", "corp").unwrap();
        h.set_parent("support", "emea").unwrap();
        h
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let h = sample();
        assert_eq!(h.ancestors_of("sales"), vec!["emea", "corp"]);
        assert_eq!(h.ancestors_of("corp"), Vec::<String>::new());
    }

    #[test]
    fn test_self_parent_rejected() {
        let mut h = OrgHierarchy::new();
        let err = h.set_parent("corp", "corp").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut h = sample();
        // corp -> sales would close sales -> emea -> corp -> sales
        let err = h.set_parent("corp", "sales").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        // the rejected link must not be recorded
        assert_eq!(h.parent_of("corp"), None);
    }

    #[test]
    fn test_ancestor_closure() {
        let h = sample();
        let closure = h.ancestor_closure(["sales", "support"].into_iter());
        assert_eq!(
            closure,
            ["emea", "corp"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn test_reparent_allowed() {
        let mut h = sample();
        h.set_parent("support", "corp").unwrap();
        assert_eq!(h.ancestors_of("support"), vec!["corp"]);
    }
}
