//! Error types for a single update cycle
//!
//! Startup errors (configuration, CLI) are plain `anyhow` errors and end the
//! process. Everything here is recoverable: the daemon records it in the
//! health state and tries again on the next tick.

use thiserror::Error;

/// Failure of an outbound HTTP exchange (IP echo service or DNS provider)
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, TLS, timeout or body read failure
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote answered with a non-2xx status
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// The body could not be decoded into the expected structure
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The IP echo service returned something that is not an IPv4 address
    #[error("invalid IPv4 address in response: {0:?}")]
    InvalidAddress(String),
}

/// Reason a cycle stopped before the record was updated
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("failed to fetch public IPv4 address: {0}")]
    FetchIp(#[source] ClientError),

    #[error("failed to fetch zones: {0}")]
    ZoneFetch(#[source] ClientError),

    #[error("zone with name '{0}' not found")]
    ZoneNotFound(String),

    #[error("failed to fetch records for zone {zone_id}: {source}")]
    RecordFetch {
        zone_id: String,
        #[source]
        source: ClientError,
    },

    #[error("record with name '{name}' not found in zone '{zone}'")]
    RecordNotFound { zone: String, name: String },

    #[error("failed to update record {record_id}: {source}")]
    Update {
        record_id: String,
        #[source]
        source: ClientError,
    },
}

impl CycleError {
    /// Stable, machine-friendly identifier of the failing step
    pub fn reason(&self) -> &'static str {
        match self {
            Self::FetchIp(_) => "fetch-ip-error",
            Self::ZoneFetch(_) => "zone-fetch-error",
            Self::ZoneNotFound(_) => "zone-not-found",
            Self::RecordFetch { .. } => "record-fetch-error",
            Self::RecordNotFound { .. } => "record-not-found",
            Self::Update { .. } => "update-error",
        }
    }

    /// Whether the provider's data, rather than the network, caused the failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ZoneNotFound(_) | Self::RecordNotFound { .. })
    }
}
