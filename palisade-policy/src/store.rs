//! Read access to persisted policy records, tenant-scoped.
//!
//! Evaluators depend only on the [`PolicyStore`] trait; the backing
//! persistence layer is an external collaborator. [`MemoryPolicyStore`]
//! is the in-process implementation used by tests and embedded setups,
//! and doubles as the reference for the write-side constraints the
//! storage layer must provide.

use crate::error::{PolicyError, Result};
use crate::types::{
    ColumnSecurityRule, FunctionPermission, OrganizationPermission, PermissionTarget,
    RowSecurityRule,
};
use std::collections::HashMap;
use std::sync::RwLock;

/// Tenant-scoped read access to policy records.
///
/// Implementations are read-mostly and accessed concurrently without
/// evaluator-side locking; evaluation never mutates the store. Expiry and
/// activity filtering happen in the evaluators, so implementations may
/// serve cached snapshots.
pub trait PolicyStore: Send + Sync {
    /// Organization permissions for `(tenant, resource)`.
    fn org_permissions(&self, tenant_id: &str, resource: &str)
        -> Result<Vec<OrganizationPermission>>;

    /// Function permissions for `(tenant, function)`.
    fn function_permissions(&self, tenant_id: &str, function: &str)
        -> Result<Vec<FunctionPermission>>;

    /// Row security rules covering `resource_type` for a tenant.
    fn row_rules(&self, tenant_id: &str, resource_type: &str) -> Result<Vec<RowSecurityRule>>;

    /// Column security rules for `(tenant, resource)`.
    fn column_rules(&self, tenant_id: &str, resource: &str) -> Result<Vec<ColumnSecurityRule>>;
}

type OrgKey = (String, PermissionTarget, String);
type FuncKey = (String, PermissionTarget, String);

/// In-memory policy store.
///
/// Administrative writes are serialized behind the write locks, and
/// `(tenant, target, resource)` uniqueness is enforced by the map key
/// itself. That key is the storage-layer constraint: an application-level
/// existence check before insert is only a fast-path nicety, since
/// check-then-insert races under concurrent identical requests.
#[derive(Default)]
pub struct MemoryPolicyStore {
    org: RwLock<HashMap<OrgKey, OrganizationPermission>>,
    func: RwLock<HashMap<FuncKey, FunctionPermission>>,
    rows: RwLock<Vec<RowSecurityRule>>,
    cols: RwLock<Vec<ColumnSecurityRule>>,
}

impl MemoryPolicyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an organization permission.
    ///
    /// # Errors
    ///
    /// - `PolicyError::Validation` when the target columns are malformed
    /// - `PolicyError::Duplicate` when a record already exists for the
    ///   same `(tenant, target, resource)`
    pub fn insert_org_permission(&self, permission: OrganizationPermission) -> Result<()> {
        let target = permission.target()?;
        let key = (
            permission.tenant_id.clone(),
            target,
            permission.resource.clone(),
        );
        let mut org = self.org.write().expect("lock poisoned");
        if org.contains_key(&key) {
            return Err(PolicyError::duplicate(format!(
                "organization permission for {:?} on '{}' already exists",
                key.1, key.2
            )));
        }
        org.insert(key, permission);
        Ok(())
    }

    /// Remove an organization permission.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::NotFound` when no record matches.
    pub fn remove_org_permission(
        &self,
        tenant_id: &str,
        target: &PermissionTarget,
        resource: &str,
    ) -> Result<OrganizationPermission> {
        let key = (tenant_id.to_string(), target.clone(), resource.to_string());
        self.org
            .write()
            .expect("lock poisoned")
            .remove(&key)
            .ok_or_else(|| {
                PolicyError::not_found(format!(
                    "no organization permission for {target:?} on '{resource}'"
                ))
            })
    }

    /// Insert a function permission.
    ///
    /// Same constraints as [`insert_org_permission`](Self::insert_org_permission),
    /// keyed by `(tenant, target, function)`.
    pub fn insert_function_permission(&self, permission: FunctionPermission) -> Result<()> {
        let target = permission.target()?;
        let key = (
            permission.tenant_id.clone(),
            target,
            permission.function.clone(),
        );
        let mut func = self.func.write().expect("lock poisoned");
        if func.contains_key(&key) {
            return Err(PolicyError::duplicate(format!(
                "function permission for {:?} on '{}' already exists",
                key.1, key.2
            )));
        }
        func.insert(key, permission);
        Ok(())
    }

    /// Remove a function permission.
    pub fn remove_function_permission(
        &self,
        tenant_id: &str,
        target: &PermissionTarget,
        function: &str,
    ) -> Result<FunctionPermission> {
        let key = (tenant_id.to_string(), target.clone(), function.to_string());
        self.func
            .write()
            .expect("lock poisoned")
            .remove(&key)
            .ok_or_else(|| {
                PolicyError::not_found(format!(
                    "no function permission for {target:?} on '{function}'"
                ))
            })
    }

    /// Insert a row security rule.
    pub fn insert_row_rule(&self, rule: RowSecurityRule) -> Result<()> {
        rule.validate()?;
        self.rows.write().expect("lock poisoned").push(rule);
        Ok(())
    }

    /// Insert a column security rule.
    pub fn insert_column_rule(&self, rule: ColumnSecurityRule) -> Result<()> {
        rule.validate()?;
        self.cols.write().expect("lock poisoned").push(rule);
        Ok(())
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn org_permissions(
        &self,
        tenant_id: &str,
        resource: &str,
    ) -> Result<Vec<OrganizationPermission>> {
        Ok(self
            .org
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|p| p.tenant_id == tenant_id && p.resource == resource)
            .cloned()
            .collect())
    }

    fn function_permissions(
        &self,
        tenant_id: &str,
        function: &str,
    ) -> Result<Vec<FunctionPermission>> {
        Ok(self
            .func
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|p| p.tenant_id == tenant_id && p.function == function)
            .cloned()
            .collect())
    }

    fn row_rules(&self, tenant_id: &str, resource_type: &str) -> Result<Vec<RowSecurityRule>> {
        Ok(self
            .rows
            .read()
            .expect("lock poisoned")
            .iter()
            .filter(|r| r.tenant_id == tenant_id && r.applies_to.contains(resource_type))
            .cloned()
            .collect())
    }

    fn column_rules(&self, tenant_id: &str, resource: &str) -> Result<Vec<ColumnSecurityRule>> {
        Ok(self
            .cols
            .read()
            .expect("lock poisoned")
            .iter()
            .filter(|r| r.tenant_id == tenant_id && r.resource == resource)
            .cloned()
            .collect())
    }
}
