//! Admission error types

use thiserror::Error;

/// Result type alias for admission operations
pub type Result<T> = std::result::Result<T, AdmissionError>;

/// Errors raised while validating or reading admission configuration
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// A value is not a dotted-quad IPv4 address
    #[error("Invalid IPv4 address: {value}")]
    InvalidAddress { value: String },

    /// A value is not valid CIDR notation
    #[error("Invalid CIDR range: {value}")]
    InvalidRange { value: String },

    /// A whitelist rule is malformed
    #[error("Invalid whitelist rule: {message}")]
    InvalidRule { message: String },

    /// Tenant settings could not be read
    #[error("Settings error: {message}")]
    Settings { message: String },
}

impl AdmissionError {
    /// Create an invalid address error
    pub fn invalid_address(value: impl Into<String>) -> Self {
        Self::InvalidAddress {
            value: value.into(),
        }
    }

    /// Create an invalid range error
    pub fn invalid_range(value: impl Into<String>) -> Self {
        Self::InvalidRange {
            value: value.into(),
        }
    }

    /// Create an invalid rule error
    pub fn invalid_rule(message: impl Into<String>) -> Self {
        Self::InvalidRule {
            message: message.into(),
        }
    }

    /// Create a settings error
    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }
}
