//! Core policy record types
//!
//! This module defines the persisted policy records and the evaluation
//! primitives derived from them:
//!
//! - [`OrganizationPermission`] / [`FunctionPermission`]: allow/deny grants
//!   scoped to a user, org unit, or role
//! - [`RowSecurityRule`] / [`ColumnSecurityRule`]: row visibility and
//!   per-field allow/deny/mask policy
//! - [`PermissionTarget`] / [`ScopeTier`]: the validated target scope and
//!   its precedence ordering
//! - [`Decision`]: the outcome of permission resolution
//!
//! Records are stored as camelCase JSON documents; the serde shapes here
//! match those documents field-for-field. Target scope is persisted as
//! three optional columns; [`validate_target`]-style checks reject
//! malformed combinations at write time so evaluation never sees them.

use crate::error::{PolicyError, Result};
use crate::predicate::Predicate;
use chrono::{DateTime, Utc};
use palisade_core::Subject;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn default_true() -> bool {
    true
}

// ============================================================================
// Target scope and precedence
// ============================================================================

/// A validated permission target: exactly one scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PermissionTarget {
    /// Targets one user directly.
    User(String),
    /// Targets an org unit (optionally inherited by descendants).
    OrgUnit(String),
    /// Targets every subject holding a role.
    Role(String),
}

/// Precedence tier of a matched record, most specific first.
///
/// Derived ordering is the precedence order: `User < OrgUnit < Role <
/// Tenant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScopeTier {
    /// Direct user match.
    User,
    /// Org-unit match (direct membership, or ancestor with inheritance).
    OrgUnit,
    /// Role match.
    Role,
    /// No target columns set; applies tenant-wide (column rules only).
    Tenant,
}

/// Match a record's target columns against a subject.
///
/// Returns the precedence tier when the record applies, `None` otherwise:
///
/// - a `user_id` target applies only to that exact user
/// - an `org_unit_id` target applies to direct members always, and to
///   members of descendant units only when `inheritance` is set
/// - a `role` target applies to subjects holding that role
/// - no target at all applies tenant-wide
///
/// Records with multiple targets are rejected at write time; if one leaks
/// through, the most specific populated scope decides, which cannot widen
/// access.
pub(crate) fn match_scope(
    subject: &Subject,
    user_id: Option<&str>,
    org_unit_id: Option<&str>,
    role: Option<&str>,
    inheritance: bool,
) -> Option<ScopeTier> {
    if let Some(user) = user_id {
        return (user == subject.user_id).then_some(ScopeTier::User);
    }
    if let Some(unit) = org_unit_id {
        if subject.in_org_unit(unit) {
            return Some(ScopeTier::OrgUnit);
        }
        if inheritance && subject.ancestor_org_unit_ids.contains(unit) {
            return Some(ScopeTier::OrgUnit);
        }
        return None;
    }
    if let Some(r) = role {
        return (r == subject.role).then_some(ScopeTier::Role);
    }
    Some(ScopeTier::Tenant)
}

/// Validate the target columns of a permission record: exactly one scope.
fn validate_exactly_one_target(
    kind: &str,
    user_id: &Option<String>,
    org_unit_id: &Option<String>,
    role: &Option<String>,
) -> Result<PermissionTarget> {
    let mut targets = Vec::new();
    if let Some(user) = user_id {
        targets.push(PermissionTarget::User(user.clone()));
    }
    if let Some(unit) = org_unit_id {
        targets.push(PermissionTarget::OrgUnit(unit.clone()));
    }
    if let Some(r) = role {
        targets.push(PermissionTarget::Role(r.clone()));
    }
    match targets.len() {
        1 => Ok(targets.into_iter().next().expect("length verified")),
        0 => Err(PolicyError::validation(format!(
            "{kind} must set one of userId, orgUnitId, or role"
        ))),
        _ => Err(PolicyError::validation(format!(
            "{kind} must set exactly one of userId, orgUnitId, or role"
        ))),
    }
}

// ============================================================================
// Decision
// ============================================================================

/// Outcome of permission resolution.
///
/// Denial is a normal, expected outcome, not an error; `resolve` never
/// fails. The denial reason is for logs and audit trails; the composition
/// layer replaces it with an opaque message before it reaches a caller so
/// that "no permission" and "no such resource" are indistinguishable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The action is permitted.
    Allowed,
    /// The action is not permitted.
    Denied {
        /// Internal reason, suitable for audit logs only.
        reason: String,
    },
}

impl Decision {
    /// Create a denial with a reason.
    pub fn denied(reason: impl Into<String>) -> Self {
        Decision::Denied {
            reason: reason.into(),
        }
    }

    /// Returns true if the action was allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    /// The denial reason, if denied.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Decision::Allowed => None,
            Decision::Denied { reason } => Some(reason),
        }
    }
}

// ============================================================================
// OrganizationPermission
// ============================================================================

/// A resource/action grant scoped to a user, org unit, or role.
///
/// Unique per `(tenant, target, resource)`; the store enforces this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationPermission {
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub resource: String,
    /// Actions this record grants (e.g. `READ`, `UPDATE`).
    pub actions: HashSet<String>,
    /// Optional attribute predicate; the grant applies only when it holds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Predicate>,
    /// Whether an org-unit target extends to descendant units.
    #[serde(default = "default_true")]
    pub inheritance: bool,
    /// Expired records are treated as absent at evaluation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl OrganizationPermission {
    /// Grant `actions` on `resource` to a role.
    pub fn for_role(
        tenant_id: impl Into<String>,
        role: impl Into<String>,
        resource: impl Into<String>,
        actions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: None,
            org_unit_id: None,
            role: Some(role.into()),
            resource: resource.into(),
            actions: actions.into_iter().map(Into::into).collect(),
            conditions: None,
            inheritance: true,
            expires_at: None,
        }
    }

    /// Grant `actions` on `resource` to a single user.
    pub fn for_user(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        resource: impl Into<String>,
        actions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: Some(user_id.into()),
            org_unit_id: None,
            role: None,
            resource: resource.into(),
            actions: actions.into_iter().map(Into::into).collect(),
            conditions: None,
            inheritance: true,
            expires_at: None,
        }
    }

    /// Grant `actions` on `resource` to an org unit.
    pub fn for_org_unit(
        tenant_id: impl Into<String>,
        org_unit_id: impl Into<String>,
        resource: impl Into<String>,
        actions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: None,
            org_unit_id: Some(org_unit_id.into()),
            role: None,
            resource: resource.into(),
            actions: actions.into_iter().map(Into::into).collect(),
            conditions: None,
            inheritance: true,
            expires_at: None,
        }
    }

    /// Attach a condition predicate.
    pub fn with_conditions(mut self, conditions: Predicate) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Restrict an org-unit grant to direct members only.
    pub fn without_inheritance(mut self) -> Self {
        self.inheritance = false;
        self
    }

    /// Set an expiry timestamp.
    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// The validated target scope.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::Validation` when zero or multiple target
    /// columns are set. Called at write time; evaluation never sees
    /// malformed records.
    pub fn target(&self) -> Result<PermissionTarget> {
        validate_exactly_one_target(
            "organization permission",
            &self.user_id,
            &self.org_unit_id,
            &self.role,
        )
    }

    /// True when the record has expired relative to `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }

    /// The precedence tier at which this record applies to `subject`.
    pub fn applies_to(&self, subject: &Subject) -> Option<ScopeTier> {
        match_scope(
            subject,
            self.user_id.as_deref(),
            self.org_unit_id.as_deref(),
            self.role.as_deref(),
            self.inheritance,
        )
    }
}

// ============================================================================
// FunctionPermission
// ============================================================================

/// A feature-capability grant, independent of any resource instance.
///
/// Unique per `(tenant, target, function)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionPermission {
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Abstract function name (e.g. `EXPORT_REPORTS`).
    pub function: String,
    /// Whether the function is allowed for the target.
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Predicate>,
    #[serde(default = "default_true")]
    pub inheritance: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl FunctionPermission {
    /// Allow or deny a function for a role.
    pub fn for_role(
        tenant_id: impl Into<String>,
        role: impl Into<String>,
        function: impl Into<String>,
        allowed: bool,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: None,
            org_unit_id: None,
            role: Some(role.into()),
            function: function.into(),
            allowed,
            conditions: None,
            inheritance: true,
            expires_at: None,
        }
    }

    /// Allow or deny a function for a single user.
    pub fn for_user(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        function: impl Into<String>,
        allowed: bool,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: Some(user_id.into()),
            org_unit_id: None,
            role: None,
            function: function.into(),
            allowed,
            conditions: None,
            inheritance: true,
            expires_at: None,
        }
    }

    /// Allow or deny a function for an org unit.
    pub fn for_org_unit(
        tenant_id: impl Into<String>,
        org_unit_id: impl Into<String>,
        function: impl Into<String>,
        allowed: bool,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: None,
            org_unit_id: Some(org_unit_id.into()),
            role: None,
            function: function.into(),
            allowed,
            conditions: None,
            inheritance: true,
            expires_at: None,
        }
    }

    /// The validated target scope.
    pub fn target(&self) -> Result<PermissionTarget> {
        validate_exactly_one_target(
            "function permission",
            &self.user_id,
            &self.org_unit_id,
            &self.role,
        )
    }

    /// True when the record has expired relative to `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }

    /// The precedence tier at which this record applies to `subject`.
    pub fn applies_to(&self, subject: &Subject) -> Option<ScopeTier> {
        match_scope(
            subject,
            self.user_id.as_deref(),
            self.org_unit_id.as_deref(),
            self.role.as_deref(),
            self.inheritance,
        )
    }
}

// ============================================================================
// RowSecurityRule
// ============================================================================

/// A row-visibility rule for a set of resource types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSecurityRule {
    pub tenant_id: String,
    pub name: String,
    /// Visibility predicate: a record is visible to a matched subject iff
    /// this evaluates true.
    pub rule_expression: Predicate,
    /// Evaluation order; higher values are evaluated first.
    #[serde(default)]
    pub priority: i32,
    /// Resource-type tags this rule covers.
    pub applies_to: HashSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default = "default_true")]
    pub inheritance: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl RowSecurityRule {
    /// Create a tenant-wide rule for one resource type.
    pub fn new(
        tenant_id: impl Into<String>,
        name: impl Into<String>,
        resource_type: impl Into<String>,
        rule_expression: Predicate,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            name: name.into(),
            rule_expression,
            priority: 0,
            applies_to: [resource_type.into()].into_iter().collect(),
            user_id: None,
            org_unit_id: None,
            role: None,
            inheritance: true,
            is_active: true,
        }
    }

    /// Scope the rule to a role.
    pub fn for_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Scope the rule to a user.
    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Scope the rule to an org unit.
    pub fn for_org_unit(mut self, org_unit_id: impl Into<String>) -> Self {
        self.org_unit_id = Some(org_unit_id.into());
        self
    }

    /// Set the evaluation priority (higher evaluates first).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Validate target scope columns: at most one may be set.
    pub fn validate(&self) -> Result<()> {
        let set = [
            self.user_id.is_some(),
            self.org_unit_id.is_some(),
            self.role.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count();
        if set > 1 {
            return Err(PolicyError::validation(format!(
                "row security rule '{}' must set at most one of userId, orgUnitId, or role",
                self.name
            )));
        }
        if self.applies_to.is_empty() {
            return Err(PolicyError::validation(format!(
                "row security rule '{}' must name at least one resource type",
                self.name
            )));
        }
        Ok(())
    }

    /// The precedence tier at which this rule applies to `subject`.
    pub fn applies_to_subject(&self, subject: &Subject) -> Option<ScopeTier> {
        match_scope(
            subject,
            self.user_id.as_deref(),
            self.org_unit_id.as_deref(),
            self.role.as_deref(),
            self.inheritance,
        )
    }
}

// ============================================================================
// ColumnSecurityRule
// ============================================================================

/// Per-field effect of a column rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnAction {
    /// Surface the value untouched.
    Allow,
    /// Omit the field from the output entirely.
    Deny,
    /// Redact the value per the masking configuration.
    Mask,
}

/// How a masked value is transformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskingType {
    /// Replace the whole value with a fixed literal.
    Full,
    /// Preserve a prefix and suffix; mask the middle.
    Partial,
    /// Replace with the configured literal.
    Custom,
}

/// Configuration for masking transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaskingConfig {
    /// Character used to mask hidden portions.
    pub mask_char: char,
    /// Characters preserved at the start under partial masking.
    pub prefix_len: usize,
    /// Characters preserved at the end under partial masking.
    pub suffix_len: usize,
    /// Replacement literal for full/custom masking.
    pub replacement: Option<String>,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            mask_char: '*',
            prefix_len: 2,
            suffix_len: 2,
            replacement: None,
        }
    }
}

/// A per-field allow/deny/mask rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSecurityRule {
    pub tenant_id: String,
    pub resource: String,
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub action: ColumnAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masking_type: Option<MaskingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masking_config: Option<MaskingConfig>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub inheritance: bool,
}

impl ColumnSecurityRule {
    /// Create a tenant-wide rule for one column.
    pub fn new(
        tenant_id: impl Into<String>,
        resource: impl Into<String>,
        column: impl Into<String>,
        action: ColumnAction,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            resource: resource.into(),
            column: column.into(),
            user_id: None,
            org_unit_id: None,
            role: None,
            action,
            masking_type: None,
            masking_config: None,
            is_active: true,
            inheritance: true,
        }
    }

    /// Scope the rule to a role.
    pub fn for_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Scope the rule to a user.
    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Scope the rule to an org unit.
    pub fn for_org_unit(mut self, org_unit_id: impl Into<String>) -> Self {
        self.org_unit_id = Some(org_unit_id.into());
        self
    }

    /// Set the masking transform.
    pub fn with_masking(mut self, masking_type: MaskingType, config: MaskingConfig) -> Self {
        self.masking_type = Some(masking_type);
        self.masking_config = Some(config);
        self
    }

    /// Validate target scope columns: at most one may be set (none means
    /// the rule applies tenant-wide).
    pub fn validate(&self) -> Result<()> {
        let set = [
            self.user_id.is_some(),
            self.org_unit_id.is_some(),
            self.role.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count();
        if set > 1 {
            return Err(PolicyError::validation(format!(
                "column security rule on '{}.{}' must set at most one of userId, orgUnitId, or role",
                self.resource, self.column
            )));
        }
        Ok(())
    }

    /// The precedence tier at which this rule applies to `subject`.
    pub fn applies_to_subject(&self, subject: &Subject) -> Option<ScopeTier> {
        match_scope(
            subject,
            self.user_id.as_deref(),
            self.org_unit_id.as_deref(),
            self.role.as_deref(),
            self.inheritance,
        )
    }
}
