//! Configuration module for hetzner-ddns
//!
//! This module handles loading and validating configuration from a TOML file
//! and environment variables (which includes anything loaded from `.env`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use zeroize::ZeroizeOnDrop;

use crate::constants::{
    DEFAULT_HEALTH_PORT, DEFAULT_INTERVAL_MINUTES, DEFAULT_TIMEOUT_SECS, DEFAULT_TTL_SECS,
    ENV_DOMAIN, ENV_HEALTH_PORT, ENV_INTERVAL, ENV_IPV4_URL, ENV_SUBDOMAIN, ENV_TIMEOUT,
    ENV_TOKEN, ENV_TTL, MAX_INTERVAL_MINUTES, MAX_TIMEOUT_SECS, MAX_TTL_SECS,
    MIN_INTERVAL_MINUTES, MIN_TIMEOUT_SECS, MIN_TTL_SECS,
};
use crate::validation::{normalize_dns_name, validate_dns_name, validate_http_url};

//==============================================================================
// Config
//==============================================================================

/// Configuration for the hetzner-ddns daemon
///
/// # Configuration Loading Priority
///
/// 1. Environment variables (highest priority, `.env` values included)
/// 2. Config file (TOML, only when a path is given)
/// 3. Defaults (lowest priority)
///
/// The API token is wrapped in `Zeroizing` so it is wiped from memory on drop.
#[derive(Debug, Clone, ZeroizeOnDrop)]
pub struct Config {
    /// URL of the service echoing the caller's public IPv4 address
    #[zeroize(skip)]
    pub ipv4_url: String,
    /// Hetzner DNS API token
    #[zeroize(skip)]
    pub api_token: zeroize::Zeroizing<String>,
    /// Zone name, e.g. "example.com"
    #[zeroize(skip)]
    pub domain: String,
    /// Record name inside the zone, e.g. "home"
    #[zeroize(skip)]
    pub subdomain: String,
    /// TTL written with every update, in seconds
    ///
    /// Default: 7200
    #[zeroize(skip)]
    pub ttl: u32,
    /// Delay between the end of one cycle and the start of the next
    ///
    /// Default: 10 minutes
    #[zeroize(skip)]
    pub interval: Duration,
    /// Port for the health check endpoint (0 = disabled)
    ///
    /// Default: 8080
    #[zeroize(skip)]
    pub health_port: u16,
    /// HTTP request timeout
    ///
    /// Default: 30 seconds
    #[zeroize(skip)]
    pub timeout: Duration,
    /// Enable verbose logging
    #[zeroize(skip)]
    pub verbose: bool,
}

impl Config {
    /// Loads configuration from file and environment variables
    ///
    /// # Errors
    ///
    /// Fails when the config file cannot be read or parsed, when a numeric
    /// value does not parse, or when validation rejects the result (missing
    /// `IPV4_URL`, `TOKEN`, `DOMAIN` or `SUBDOMAIN` included).
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::load_from_file(config_path)?;
        Self::override_with_env(&mut config)?;
        Self::validate(&config)?;
        config.domain = normalize_dns_name(&config.domain);
        config.subdomain = normalize_dns_name(&config.subdomain);
        Ok(config)
    }

    /// Loads configuration from a TOML file, falling back to defaults
    fn load_from_file(config_path: Option<PathBuf>) -> Result<Self> {
        let mut file = TomlConfig::default();

        if let Some(path) = config_path {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            file = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
        }

        Ok(Self {
            ipv4_url: file.ipv4_url.unwrap_or_default(),
            api_token: zeroize::Zeroizing::new(file.token.unwrap_or_default()),
            domain: file.domain.unwrap_or_default(),
            subdomain: file.subdomain.unwrap_or_default(),
            ttl: file.ttl.unwrap_or(DEFAULT_TTL_SECS),
            interval: Duration::from_secs(
                file.interval
                    .unwrap_or(DEFAULT_INTERVAL_MINUTES)
                    .saturating_mul(60),
            ),
            health_port: file.health_port.unwrap_or(DEFAULT_HEALTH_PORT),
            timeout: Duration::from_secs(file.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            verbose: file.verbose.unwrap_or(false),
        })
    }

    /// Overrides configuration values with non-empty environment variables
    fn override_with_env(config: &mut Self) -> Result<()> {
        if let Some(v) = env_value(ENV_IPV4_URL) {
            config.ipv4_url = v;
        }
        if let Some(v) = env_value(ENV_TOKEN) {
            config.api_token = zeroize::Zeroizing::new(v);
        }
        if let Some(v) = env_value(ENV_DOMAIN) {
            config.domain = v;
        }
        if let Some(v) = env_value(ENV_SUBDOMAIN) {
            config.subdomain = v;
        }
        if let Some(v) = env_value(ENV_TTL) {
            config.ttl = v
                .trim()
                .parse()
                .with_context(|| format!("{} is not a valid integer: {}", ENV_TTL, v))?;
        }
        if let Some(v) = env_value(ENV_INTERVAL) {
            let minutes: u64 = v
                .trim()
                .parse()
                .with_context(|| format!("{} is not a valid integer: {}", ENV_INTERVAL, v))?;
            config.interval = Duration::from_secs(minutes.saturating_mul(60));
        }
        if let Some(v) = env_value(ENV_HEALTH_PORT) {
            config.health_port = v
                .trim()
                .parse()
                .with_context(|| format!("{} is not a valid port: {}", ENV_HEALTH_PORT, v))?;
        }
        if let Some(v) = env_value(ENV_TIMEOUT) {
            let secs: u64 = v
                .trim()
                .parse()
                .with_context(|| format!("{} is not a valid integer: {}", ENV_TIMEOUT, v))?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(())
    }

    /// Ensures that all required fields are present and valid
    fn validate(&self) -> Result<()> {
        if self.ipv4_url.trim().is_empty() {
            return Err(anyhow!("Missing {}", ENV_IPV4_URL));
        }
        validate_http_url(&self.ipv4_url).with_context(|| format!("Invalid {}", ENV_IPV4_URL))?;

        if self.api_token.trim().is_empty() {
            return Err(anyhow!("Missing {}", ENV_TOKEN));
        }

        if self.domain.trim().is_empty() {
            return Err(anyhow!("Missing {}", ENV_DOMAIN));
        }
        validate_dns_name(&self.domain).with_context(|| format!("Invalid {}", ENV_DOMAIN))?;

        if self.subdomain.trim().is_empty() {
            return Err(anyhow!("Missing {}", ENV_SUBDOMAIN));
        }
        validate_dns_name(&self.subdomain)
            .with_context(|| format!("Invalid {}", ENV_SUBDOMAIN))?;

        if !(MIN_TTL_SECS..=MAX_TTL_SECS).contains(&self.ttl) {
            return Err(anyhow!(
                "ttl must be between {} and {} seconds, got {}",
                MIN_TTL_SECS,
                MAX_TTL_SECS,
                self.ttl
            ));
        }

        let interval_minutes = self.interval.as_secs() / 60;
        if !(MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&interval_minutes) {
            return Err(anyhow!(
                "interval must be between {} and {} minutes, got {}",
                MIN_INTERVAL_MINUTES,
                MAX_INTERVAL_MINUTES,
                interval_minutes
            ));
        }

        let timeout_secs = self.timeout.as_secs();
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&timeout_secs) {
            return Err(anyhow!(
                "timeout must be between {} and {} seconds, got {}",
                MIN_TIMEOUT_SECS,
                MAX_TIMEOUT_SECS,
                timeout_secs
            ));
        }

        Ok(())
    }

    /// Interval expressed in whole minutes, for log messages
    pub fn interval_minutes(&self) -> u64 {
        self.interval.as_secs() / 60
    }
}

/// Reads an environment variable, treating empty values as unset
fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

/// TOML configuration file structure
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    ipv4_url: Option<String>,
    token: Option<String>,
    domain: Option<String>,
    subdomain: Option<String>,
    ttl: Option<u32>,
    /// Minutes
    interval: Option<u64>,
    health_port: Option<u16>,
    /// Seconds
    timeout: Option<u64>,
    verbose: Option<bool>,
}

//==============================================================================
// Tests
//==============================================================================
