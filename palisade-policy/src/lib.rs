//! Policy evaluation for the Palisade engine
//!
//! This crate holds the tenant-scoped access-control core:
//!
//! - [`PermissionResolver`]: allow/deny for `(subject, resource, action)`
//!   and abstract function capabilities
//! - [`RowFilterEvaluator`]: row-level visibility filtering over candidate
//!   record sets
//! - [`ColumnMaskEvaluator`]: per-field allow/deny/mask redaction applied
//!   before serialization
//! - [`Predicate`]: the attribute predicate language shared by permission
//!   conditions and row rules
//! - [`PolicyStore`]: the read seam to persisted policy records, with
//!   [`MemoryPolicyStore`] for tests and embedded use
//!
//! # Evaluation Semantics
//!
//! All evaluators share one scope model: records/rules target exactly one
//! of a user, an org unit, or a role (column rules may also be untargeted,
//! i.e. tenant-wide). Matching precedence is user > org-unit > role, with
//! org-unit targets reaching descendant units only when the record sets
//! `inheritance`. Expired or inactive records are treated as absent.
//!
//! Permission resolution is default-deny with deny-overrides inside a
//! precedence tier. Row filtering is an opt-in restriction layer: records
//! with no applicable rule stay visible. Column masking picks the most
//! specific applicable rule per field and always operates on decrypted
//! plaintext.

mod column_mask;
mod error;
mod predicate;
mod resolver;
mod row_filter;
mod store;
mod types;

pub use column_mask::ColumnMaskEvaluator;
pub use error::{PolicyError, Result};
pub use predicate::Predicate;
pub use resolver::PermissionResolver;
pub use row_filter::RowFilterEvaluator;
pub use store::{MemoryPolicyStore, PolicyStore};
pub use types::{
    ColumnAction, ColumnSecurityRule, Decision, FunctionPermission, MaskingConfig, MaskingType,
    OrganizationPermission, PermissionTarget, RowSecurityRule, ScopeTier,
};
