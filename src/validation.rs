//! Validation utilities for hetzner-ddns
//!
//! Checks applied to configuration values at startup and to the address
//! returned by the IP echo service on every cycle.

use std::net::Ipv4Addr;

use anyhow::{anyhow, bail, Result};
use reqwest::Url;

use crate::constants::{MAX_LABEL_LENGTH, MAX_RECORD_NAME_LENGTH};

/// Validates a DNS name used as a zone (`DOMAIN`) or record (`SUBDOMAIN`) name
///
/// # Validation Rules
///
/// - `@` is accepted as the zone apex
/// - total length at most 253 characters, labels at most 63
/// - labels are non-empty and separated by single dots
/// - labels may not start or end with a hyphen
/// - allowed characters are letters, digits, `-` and `_`; `*` only as a whole label
/// - a single trailing dot (FQDN notation) is ignored
///
/// # Examples
///
/// ```
/// use hetzner_ddns::validation::validate_dns_name;
///
/// assert!(validate_dns_name("@").is_ok());
/// assert!(validate_dns_name("home").is_ok());
/// assert!(validate_dns_name("example.com").is_ok());
/// assert!(validate_dns_name("*.lab").is_ok());
///
/// assert!(validate_dns_name("").is_err());
/// assert!(validate_dns_name("example..com").is_err());
/// assert!(validate_dns_name("-home").is_err());
/// ```
pub fn validate_dns_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("DNS name cannot be empty");
    }
    if trimmed == "@" {
        return Ok(());
    }
    if trimmed.contains(' ') {
        bail!("DNS name cannot contain spaces");
    }

    let name = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if name.is_empty() {
        bail!("DNS name cannot be empty");
    }
    if name.len() > MAX_RECORD_NAME_LENGTH {
        bail!(
            "DNS name too long (max {} characters, got {})",
            MAX_RECORD_NAME_LENGTH,
            name.len()
        );
    }
    if name.starts_with('.') {
        bail!("DNS name cannot start with a dot");
    }
    if name.contains("..") {
        bail!("DNS name cannot contain consecutive dots");
    }

    for label in name.split('.') {
        if label == "*" {
            continue;
        }
        if label.len() > MAX_LABEL_LENGTH {
            bail!(
                "DNS label too long (max {} characters, got {})",
                MAX_LABEL_LENGTH,
                label.len()
            );
        }
        if label.starts_with('-') || label.ends_with('-') {
            bail!("DNS label cannot start or end with hyphen");
        }
        if let Some(ch) = label
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
        {
            bail!(
                "DNS name contains invalid character: '{}' (allowed: letters, digits, '-', '_', or wildcard labels)",
                ch
            );
        }
    }

    Ok(())
}

/// Canonical form of a name accepted by [`validate_dns_name`]
///
/// Zone and record lookups compare names exactly, so the stored value drops
/// surrounding whitespace and a single trailing dot.
///
/// ```
/// use hetzner_ddns::validation::normalize_dns_name;
///
/// assert_eq!(normalize_dns_name(" example.com. "), "example.com");
/// assert_eq!(normalize_dns_name("@"), "@");
/// ```
pub fn normalize_dns_name(name: &str) -> String {
    let trimmed = name.trim();
    trimmed.strip_suffix('.').unwrap_or(trimmed).to_string()
}

/// Validates the IP echo service URL
///
/// Only absolute `http` and `https` URLs with a host are accepted.
pub fn validate_http_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url.trim()).map_err(|e| anyhow!("Invalid URL '{}': {}", url, e))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => bail!("Unsupported URL scheme '{}' (expected http or https)", other),
    }
    if parsed.host_str().is_none() {
        bail!("URL '{}' has no host", url);
    }
    Ok(())
}

/// Parses the body returned by the IP echo service into an IPv4 address
///
/// Surrounding whitespace (including the trailing newline most echo
/// services append) is ignored. The unspecified address `0.0.0.0` and the
/// broadcast address are rejected since they can never be a public address.
///
/// # Examples
///
/// ```
/// use hetzner_ddns::validation::parse_ipv4;
///
/// assert_eq!(parse_ipv4("203.0.113.7\n").unwrap().to_string(), "203.0.113.7");
/// assert!(parse_ipv4("2001:db8::1").is_none());
/// assert!(parse_ipv4("0.0.0.0").is_none());
/// ```
pub fn parse_ipv4(raw: &str) -> Option<Ipv4Addr> {
    let addr = raw.trim().parse::<Ipv4Addr>().ok()?;
    if addr.is_unspecified() || addr.is_broadcast() {
        return None;
    }
    Some(addr)
}
