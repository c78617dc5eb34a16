//! Tenant security settings document.
//!
//! Mirrors the persisted JSON owned by the tenant-settings collaborator:
//!
//! ```json
//! {
//!   "security": {
//!     "ipWhitelistEnabled": true,
//!     "ipWhitelistRules": [
//!       {"id": "...", "name": "office", "ipRange": "10.0.0.0/8",
//!        "isActive": true, "createdAt": "2026-01-12T09:30:00Z"}
//!     ]
//!   }
//! }
//! ```
//!
//! The serde shapes here must stay field-for-field compatible with that
//! document.

use crate::cidr::{parse_cidr, parse_ipv4};
use crate::error::{AdmissionError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_true() -> bool {
    true
}

/// Root of the tenant settings document, reduced to the security section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSettings {
    #[serde(default)]
    pub security: SecuritySettings,
}

/// The `security` section of the tenant settings document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecuritySettings {
    /// Master switch; when false every request is admitted.
    pub ip_whitelist_enabled: bool,
    /// Allow-list entries consulted when the switch is on.
    pub ip_whitelist_rules: Vec<IpWhitelistRule>,
}

/// One allow-list entry: a single address or a CIDR range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpWhitelistRule {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_range: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl IpWhitelistRule {
    /// Create a single-address rule.
    pub fn address(name: impl Into<String>, ip_address: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            ip_address: Some(ip_address.into()),
            ip_range: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Create a CIDR-range rule.
    pub fn range(name: impl Into<String>, ip_range: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            ip_address: None,
            ip_range: Some(ip_range.into()),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Validate the rule at write time.
    ///
    /// # Errors
    ///
    /// - `AdmissionError::InvalidRule` when neither or both of
    ///   `ip_address`/`ip_range` are set
    /// - `AdmissionError::InvalidAddress` / `InvalidRange` for
    ///   unparsable values
    pub fn validate(&self) -> Result<()> {
        match (&self.ip_address, &self.ip_range) {
            (Some(addr), None) => {
                // 0.0.0.0 is the missing-client sentinel; a rule for it
                // would whitelist exactly the requests that failed to
                // identify themselves
                if parse_ipv4(addr)? == 0 {
                    return Err(AdmissionError::invalid_address(addr));
                }
                Ok(())
            }
            (None, Some(range)) => {
                parse_cidr(range)?;
                Ok(())
            }
            (None, None) => Err(AdmissionError::invalid_rule(format!(
                "rule '{}' must set ipAddress or ipRange",
                self.name
            ))),
            (Some(_), Some(_)) => Err(AdmissionError::invalid_rule(format!(
                "rule '{}' must set only one of ipAddress or ipRange",
                self.name
            ))),
        }
    }
}
