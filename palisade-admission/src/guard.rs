//! Network admission checks.
//!
//! Admission runs before identity resolution, so decisions depend only on
//! the client address and the tenant's settings document:
//!
//! - whitelisting disabled: every request admitted (fail-open by
//!   configuration)
//! - whitelisting enabled with no active rules: every request denied
//!   (fail-secure)
//! - otherwise: admitted iff the client IP equals a rule's address or
//!   falls inside a rule's CIDR range
//!
//! A stored rule that no longer parses is treated as non-matching; a
//! malformed rule can narrow admission but never widen it.

use crate::cidr::{ip_matches_cidr, parse_ipv4};
use crate::settings::SecuritySettings;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Sentinel used when no proxy header identifies the client.
///
/// Non-routable, and [`IpWhitelistRule::validate`] refuses rules for it,
/// so a request with no resolvable address can never match an allow-list
/// entry: missing proxy headers fail secure under an enabled whitelist.
///
/// [`IpWhitelistRule::validate`]: crate::settings::IpWhitelistRule::validate
pub const SENTINEL_CLIENT_IP: &str = "0.0.0.0";

/// Resolve the client address from proxy headers.
///
/// Precedence is fixed: the first `X-Forwarded-For` entry, then
/// `X-Real-IP`, then [`SENTINEL_CLIENT_IP`].
pub fn resolve_client_ip(x_forwarded_for: Option<&str>, x_real_ip: Option<&str>) -> String {
    if let Some(forwarded) = x_forwarded_for {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real) = x_real_ip {
        let real = real.trim();
        if !real.is_empty() {
            return real.to_string();
        }
    }
    SENTINEL_CLIENT_IP.to_string()
}

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The request may proceed to identity resolution.
    Allowed,
    /// The request is rejected before any handler runs.
    Denied {
        /// Reason, naming the offending address.
        reason: String,
    },
}

impl Admission {
    /// Create a denial with a reason.
    pub fn denied(reason: impl Into<String>) -> Self {
        Admission::Denied {
            reason: reason.into(),
        }
    }

    /// Returns true if the request was admitted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// Read access to per-tenant security settings.
///
/// The settings document is persisted by an external collaborator;
/// implementations may serve cached copies. `Ok(None)` means the tenant
/// has no settings document, which admits everything - the whitelist is
/// opt-in.
pub trait SettingsSource: Send + Sync {
    /// Security settings for a tenant.
    fn security_settings(
        &self,
        tenant_id: &str,
    ) -> Result<Option<SecuritySettings>, crate::AdmissionError>;
}

/// In-memory settings source for tests and embedded setups.
#[derive(Default)]
pub struct StaticSettingsSource {
    settings: RwLock<HashMap<String, SecuritySettings>>,
}

impl StaticSettingsSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a tenant's security settings.
    pub fn set(&self, tenant_id: impl Into<String>, settings: SecuritySettings) {
        self.settings
            .write()
            .expect("lock poisoned")
            .insert(tenant_id.into(), settings);
    }
}

impl SettingsSource for StaticSettingsSource {
    fn security_settings(
        &self,
        tenant_id: &str,
    ) -> Result<Option<SecuritySettings>, crate::AdmissionError> {
        Ok(self
            .settings
            .read()
            .expect("lock poisoned")
            .get(tenant_id)
            .cloned())
    }
}

/// IP allow-list admission guard.
pub struct NetworkAdmissionGuard {
    source: Arc<dyn SettingsSource>,
}

impl NetworkAdmissionGuard {
    /// Create a guard over a settings source.
    pub fn new(source: Arc<dyn SettingsSource>) -> Self {
        Self { source }
    }

    /// Check whether `client_ip` may reach tenant `tenant_id`.
    ///
    /// Never fails: an unreadable settings document denies (fail secure),
    /// since admitting on error would disable the allow-list exactly when
    /// its state is unknown.
    pub fn check_admission(&self, client_ip: &str, tenant_id: &str) -> Admission {
        let settings = match self.source.security_settings(tenant_id) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(
                    tenant_id,
                    client_ip,
                    error = %err,
                    "settings read failed; denying admission"
                );
                return Admission::denied("tenant security settings unavailable");
            }
        };

        let Some(security) = settings else {
            return Admission::Allowed;
        };
        if !security.ip_whitelist_enabled {
            return Admission::Allowed;
        }

        let active: Vec<_> = security
            .ip_whitelist_rules
            .iter()
            .filter(|r| r.is_active)
            .collect();
        if active.is_empty() {
            tracing::warn!(
                tenant_id,
                client_ip,
                "ip whitelist enabled with no active rules; denying"
            );
            return Admission::denied(format!(
                "client address {client_ip} denied: whitelist has no active rules"
            ));
        }

        // An unparsable client address can never match a rule
        let client = parse_ipv4(client_ip).ok();

        for rule in active {
            if let Some(addr) = &rule.ip_address {
                if let (Ok(rule_ip), Some(client_ip)) = (parse_ipv4(addr), client) {
                    if rule_ip == client_ip {
                        return Admission::Allowed;
                    }
                }
            }
            if let Some(range) = &rule.ip_range {
                if ip_matches_cidr(client_ip, range).unwrap_or(false) {
                    return Admission::Allowed;
                }
            }
        }

        tracing::warn!(tenant_id, client_ip, "client address not on allow list");
        Admission::denied(format!(
            "client address {client_ip} is not on the tenant allow list"
        ))
    }
}
