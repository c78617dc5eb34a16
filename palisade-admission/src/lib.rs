//! IP-based admission control for the Palisade engine
//!
//! Checks the client address against a tenant's allow-list before any
//! identity resolution or handler work:
//!
//! - [`NetworkAdmissionGuard`]: the admission check itself
//! - [`SettingsSource`]: the read seam to the persisted tenant settings
//!   document, with [`StaticSettingsSource`] for tests and embedded use
//! - [`TenantSettings`] / [`SecuritySettings`] / [`IpWhitelistRule`]: the
//!   settings document shape (`security.ipWhitelistEnabled`,
//!   `security.ipWhitelistRules`)
//! - [`cidr`]: IPv4/CIDR matching via integer bit-masking
//!
//! # Defaults
//!
//! Whitelisting disabled (or no settings document) admits every request:
//! fail-open by configuration. Whitelisting enabled with zero active rules
//! denies every request: fail-secure. A request whose client address
//! cannot be resolved from proxy headers gets the non-routable sentinel
//! [`SENTINEL_CLIENT_IP`] and is denied under an enabled whitelist.

pub mod cidr;
mod error;
mod guard;
mod settings;

pub use cidr::{ip_matches_cidr, parse_cidr, parse_ipv4};
pub use error::{AdmissionError, Result};
pub use guard::{
    resolve_client_ip, Admission, NetworkAdmissionGuard, SettingsSource, StaticSettingsSource,
    SENTINEL_CLIENT_IP,
};
pub use settings::{IpWhitelistRule, SecuritySettings, TenantSettings};
