//! DNS provider abstraction layer
//!
//! The update pipeline only talks to a provider through the [`DnsProvider`]
//! trait, so the Hetzner client can be swapped for an in-memory fake in tests.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

//==============================================================================
// Types
//==============================================================================

/// DNS record types known to the provider
///
/// Unknown types decode to [`RecordType::Other`] so a zone containing a
/// record type added after this list was written still lists cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum RecordType {
    A,
    AAAA,
    NS,
    MX,
    CNAME,
    RP,
    TXT,
    SOA,
    HINFO,
    SRV,
    DANE,
    TLSA,
    DS,
    CAA,
    #[serde(other)]
    Other,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::AAAA => "AAAA",
            Self::NS => "NS",
            Self::MX => "MX",
            Self::CNAME => "CNAME",
            Self::RP => "RP",
            Self::TXT => "TXT",
            Self::SOA => "SOA",
            Self::HINFO => "HINFO",
            Self::SRV => "SRV",
            Self::DANE => "DANE",
            Self::TLSA => "TLSA",
            Self::DS => "DS",
            Self::CAA => "CAA",
            Self::Other => "OTHER",
        };
        f.write_str(s)
    }
}

/// A DNS zone (a domain managed by the provider)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "crate::hetzner::timestamp::deserialize")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::hetzner::timestamp::deserialize")]
    pub modified: Option<DateTime<Utc>>,
}

/// A single DNS record inside a zone
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub ttl: Option<u32>,
    pub zone_id: String,
    #[serde(default, deserialize_with = "crate::hetzner::timestamp::deserialize")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::hetzner::timestamp::deserialize")]
    pub modified: Option<DateTime<Utc>>,
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DNS {} {} -> {}", self.record_type, self.name, self.value)?;
        if let Some(ttl) = self.ttl {
            write!(f, " (TTL: {})", ttl)?;
        }
        Ok(())
    }
}

/// Full record payload sent on update
///
/// The provider replaces the whole record, so every field is sent even if
/// only `value` changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRequest {
    pub zone_id: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

impl UpdateRequest {
    /// Builds an A record update pointing `record` at `ip`
    pub fn a_record(record: &DnsRecord, zone_id: &str, ip: &str, ttl: Option<u32>) -> Self {
        Self {
            zone_id: zone_id.to_string(),
            record_type: RecordType::A,
            name: record.name.clone(),
            value: ip.to_string(),
            ttl,
        }
    }
}

//==============================================================================
// Trait
//==============================================================================

/// Remote operations the update pipeline needs from a DNS provider
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Lists all zones visible to the configured token
    async fn list_zones(&self) -> Result<Vec<Zone>, ClientError>;

    /// Lists all records of one zone
    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>, ClientError>;

    /// Overwrites an existing record
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] for any non-2xx answer and
    /// [`ClientError::Transport`] when the provider cannot be reached.
    async fn update_record(
        &self,
        record_id: &str,
        request: &UpdateRequest,
    ) -> Result<(), ClientError>;
}

//==============================================================================
// Tests
//==============================================================================
