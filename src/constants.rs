//! Common constants used throughout the hetzner-ddns application

//==============================================================================
// Hetzner DNS API Constants
//==============================================================================

/// Hetzner DNS API base URL
pub const HETZNER_API_BASE: &str = "https://dns.hetzner.com/api/v1";

/// Header carrying the Hetzner DNS API token
pub const HETZNER_AUTH_HEADER: &str = "Auth-API-Token";

/// User agent string for outbound requests
pub const USER_AGENT: &str = "hetzner-ddns/1.0";

/// IP echo service written into the sample `.env` file
pub const SAMPLE_IPV4_URL: &str = "https://ipv4.icanhazip.com";

//==============================================================================
// Defaults and Limits
//==============================================================================

/// Default TTL for the updated record in seconds
pub const DEFAULT_TTL_SECS: u32 = 7200;

/// Minimum TTL accepted by the provider
pub const MIN_TTL_SECS: u32 = 60;

/// Maximum TTL accepted by the provider
pub const MAX_TTL_SECS: u32 = 86_400;

/// Default interval between update cycles in minutes
pub const DEFAULT_INTERVAL_MINUTES: u64 = 10;

/// Minimum interval between update cycles in minutes
pub const MIN_INTERVAL_MINUTES: u64 = 1;

/// Maximum interval between update cycles in minutes (one day)
pub const MAX_INTERVAL_MINUTES: u64 = 1440;

/// Default port for the health check endpoint
pub const DEFAULT_HEALTH_PORT: u16 = 8080;

/// Default HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Minimum HTTP request timeout in seconds
pub const MIN_TIMEOUT_SECS: u64 = 1;

/// Maximum HTTP request timeout in seconds
pub const MAX_TIMEOUT_SECS: u64 = 300;

//==============================================================================
// Validation Constants
//==============================================================================

/// Maximum DNS record name length in characters
pub const MAX_RECORD_NAME_LENGTH: usize = 253;

/// Maximum DNS label length in characters
pub const MAX_LABEL_LENGTH: usize = 63;

//==============================================================================
// Environment Variable Names
//==============================================================================

/// URL of the service that echoes the caller's public IPv4 address
pub const ENV_IPV4_URL: &str = "IPV4_URL";

/// Hetzner DNS API token
pub const ENV_TOKEN: &str = "TOKEN";

/// Zone name, e.g. `example.com`
pub const ENV_DOMAIN: &str = "DOMAIN";

/// Record name inside the zone, e.g. `home`
pub const ENV_SUBDOMAIN: &str = "SUBDOMAIN";

/// TTL for the record in seconds
pub const ENV_TTL: &str = "TTL";

/// Minutes between update cycles
pub const ENV_INTERVAL: &str = "INTERVAL";

/// Health endpoint port (0 disables it)
pub const ENV_HEALTH_PORT: &str = "HEALTH_PORT";

/// HTTP request timeout in seconds
pub const ENV_TIMEOUT: &str = "TIMEOUT";

/// Default name of the dotenv file
pub const ENV_FILE_NAME: &str = ".env";
