//! Attribute predicate language for conditions and row rules.
//!
//! Permission conditions and row-security rule expressions share this
//! small predicate tree: leaf comparisons over record attributes plus
//! ownership checks against the subject, combined with and/or/not. Trees
//! are stored as tagged JSON alongside the policy records, e.g.:
//!
//! ```json
//! {"type": "and", "clauses": [
//!     {"type": "equals", "attr": "status", "value": "active"},
//!     {"type": "ownedBy", "attr": "ownerId"}
//! ]}
//! ```
//!
//! Evaluation is total: a missing attribute or a type mismatch makes the
//! leaf false, never an error.

use palisade_core::{Record, Subject};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// A predicate over a record's attributes and the requesting subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Predicate {
    /// Attribute equals a literal value.
    Equals { attr: String, value: Value },
    /// Attribute equals any of the listed values.
    In { attr: String, values: Vec<Value> },
    /// Attribute falls inside an inclusive range. Either bound may be
    /// omitted for a half-open range.
    Range {
        attr: String,
        #[serde(default)]
        min: Option<Value>,
        #[serde(default)]
        max: Option<Value>,
    },
    /// Attribute equals the subject's user id (ownership check).
    OwnedBy { attr: String },
    /// Attribute names an org unit the subject belongs to (directly or
    /// via an ancestor).
    MemberOfOrgUnit { attr: String },
    /// All clauses hold. An empty list is true.
    And { clauses: Vec<Predicate> },
    /// At least one clause holds. An empty list is false.
    Or { clauses: Vec<Predicate> },
    /// The clause does not hold.
    Not { clause: Box<Predicate> },
}

impl Predicate {
    /// Evaluate against a record on behalf of a subject.
    pub fn evaluate(&self, subject: &Subject, record: &Record) -> bool {
        match self {
            Predicate::Equals { attr, value } => {
                record.get(attr).is_some_and(|v| values_equal(v, value))
            }
            Predicate::In { attr, values } => record
                .get(attr)
                .is_some_and(|v| values.iter().any(|candidate| values_equal(v, candidate))),
            Predicate::Range { attr, min, max } => {
                let Some(v) = record.get(attr) else {
                    return false;
                };
                let above_min = match min {
                    Some(bound) => matches!(
                        compare_values(v, bound),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                    None => true,
                };
                let below_max = match max {
                    Some(bound) => matches!(
                        compare_values(v, bound),
                        Some(Ordering::Less | Ordering::Equal)
                    ),
                    None => true,
                };
                above_min && below_max
            }
            Predicate::OwnedBy { attr } => record
                .get(attr)
                .and_then(Value::as_str)
                .is_some_and(|owner| owner == subject.user_id),
            Predicate::MemberOfOrgUnit { attr } => record
                .get(attr)
                .and_then(Value::as_str)
                .is_some_and(|unit| subject.in_org_unit_or_ancestor(unit)),
            Predicate::And { clauses } => clauses.iter().all(|c| c.evaluate(subject, record)),
            Predicate::Or { clauses } => clauses.iter().any(|c| c.evaluate(subject, record)),
            Predicate::Not { clause } => !clause.evaluate(subject, record),
        }
    }

    /// Convenience constructor for an equality leaf.
    pub fn equals(attr: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Equals {
            attr: attr.into(),
            value: value.into(),
        }
    }

    /// Convenience constructor for an ownership leaf.
    pub fn owned_by(attr: impl Into<String>) -> Self {
        Predicate::OwnedBy { attr: attr.into() }
    }
}

/// Equality with numeric coercion: `1` and `1.0` compare equal.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Ordering for range bounds: numbers numerically, strings
/// lexicographically, anything else incomparable.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
        return Some(x.cmp(y));
    }
    None
}
