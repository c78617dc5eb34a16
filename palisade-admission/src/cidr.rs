//! IPv4 and CIDR matching.
//!
//! Range membership is computed by bit-masking the integer form of the
//! dotted-quad address against the prefix length. IPv4 only; IPv6
//! addresses fail to parse and therefore never match a rule.

use crate::error::{AdmissionError, Result};
use std::net::Ipv4Addr;

/// Parse a dotted-quad IPv4 address into its integer form.
///
/// # Errors
///
/// Returns `AdmissionError::InvalidAddress` for anything that is not a
/// plain IPv4 address (including IPv6 and host:port forms).
pub fn parse_ipv4(value: &str) -> Result<u32> {
    value
        .trim()
        .parse::<Ipv4Addr>()
        .map(u32::from)
        .map_err(|_| AdmissionError::invalid_address(value.trim()))
}

/// Parse CIDR notation into `(network, prefix_len)`.
///
/// # Errors
///
/// Returns `AdmissionError::InvalidRange` when the value is not
/// `a.b.c.d/prefix` with a prefix between 0 and 32.
pub fn parse_cidr(value: &str) -> Result<(u32, u8)> {
    let trimmed = value.trim();
    let (network, prefix) = trimmed
        .split_once('/')
        .ok_or_else(|| AdmissionError::invalid_range(trimmed))?;

    let network = parse_ipv4(network).map_err(|_| AdmissionError::invalid_range(trimmed))?;
    let prefix: u8 = prefix
        .parse()
        .map_err(|_| AdmissionError::invalid_range(trimmed))?;
    if prefix > 32 {
        return Err(AdmissionError::invalid_range(trimmed));
    }

    Ok((network, prefix))
}

/// True when `ip` falls inside the CIDR range.
///
/// # Errors
///
/// Propagates parse failures for either argument.
pub fn ip_matches_cidr(ip: &str, cidr: &str) -> Result<bool> {
    let ip = parse_ipv4(ip)?;
    let (network, prefix) = parse_cidr(cidr)?;

    // /0 matches everything; the shift below would overflow for it
    if prefix == 0 {
        return Ok(true);
    }
    let mask: u32 = u32::MAX << (32 - prefix);
    Ok(ip & mask == network & mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(parse_ipv4("192.168.1.1").unwrap(), 0xC0A80101);
        assert_eq!(parse_ipv4(" 10.0.0.1 ").unwrap(), 0x0A000001);

        assert!(parse_ipv4("256.0.0.1").is_err());
        assert!(parse_ipv4("10.0.0").is_err());
        assert!(parse_ipv4("::1").is_err());
        assert!(parse_ipv4("10.0.0.1:8080").is_err());
    }

    #[test]
    fn test_cidr_membership() {
        assert!(ip_matches_cidr("192.168.1.50", "192.168.1.0/24").unwrap());
        assert!(!ip_matches_cidr("192.168.2.50", "192.168.1.0/24").unwrap());

        assert!(ip_matches_cidr("10.2.3.4", "10.0.0.0/8").unwrap());
        assert!(!ip_matches_cidr("8.8.8.8", "10.0.0.0/8").unwrap());
    }

    #[test]
    fn test_cidr_edge_prefixes() {
        // /32 is an exact-host range
        assert!(ip_matches_cidr("10.1.2.3", "10.1.2.3/32").unwrap());
        assert!(!ip_matches_cidr("10.1.2.4", "10.1.2.3/32").unwrap());

        // /0 matches everything
        assert!(ip_matches_cidr("8.8.8.8", "0.0.0.0/0").unwrap());
    }

    #[test]
    fn test_invalid_cidr() {
        assert!(matches!(
            parse_cidr("10.0.0.0/33").unwrap_err(),
            AdmissionError::InvalidRange { .. }
        ));
        assert!(parse_cidr("10.0.0.0").is_err());
        assert!(parse_cidr("banana/8").is_err());
        assert!(parse_cidr("10.0.0.0/abc").is_err());
    }
}
