//! Per-resource capability registry.
//!
//! Which fields of a resource are stored encrypted (and therefore need
//! decryption on the response path) is schema knowledge, not policy. It is
//! registered once at pipeline construction and looked up as a typed
//! `Option` per resource type - never rediscovered through untyped store
//! casts at call sites.

use std::collections::HashMap;

/// Capabilities of one resource type.
#[derive(Debug, Clone, Default)]
pub struct ResourceCapabilities {
    /// String fields persisted as `enc:` envelopes.
    pub encrypted_fields: Vec<String>,
}

impl ResourceCapabilities {
    /// Capabilities with a set of encrypted fields.
    pub fn with_encrypted_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            encrypted_fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Registry of resource capabilities, resolved once at startup.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    resources: HashMap<String, ResourceCapabilities>,
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource type's capabilities.
    pub fn register(
        mut self,
        resource: impl Into<String>,
        capabilities: ResourceCapabilities,
    ) -> Self {
        self.resources.insert(resource.into(), capabilities);
        self
    }

    /// Capabilities for a resource type, if registered.
    ///
    /// `None` means the resource has no special capabilities (nothing
    /// encrypted), not that the resource is unknown.
    pub fn get(&self, resource: &str) -> Option<&ResourceCapabilities> {
        self.resources.get(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let registry = ResourceRegistry::new().register(
            "employees",
            ResourceCapabilities::with_encrypted_fields(["ssn", "bankAccount"]),
        );

        let caps = registry.get("employees").unwrap();
        assert_eq!(caps.encrypted_fields, vec!["ssn", "bankAccount"]);
        assert!(registry.get("projects").is_none());
    }
}
